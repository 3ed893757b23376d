//! Polygon standard functions.
//!
//! For a polygon with `n` vertices on a circumferential/radial pair
//! `(xi1, xi2)` the standard functions come in four blocks of `n`:
//!
//! * `s00_i = 1` on sector `i` (`i <= n*xi1 < i+1`), 0 elsewhere
//! * `s10_i = n*xi1 - i` on sector `i`
//! * `s01_i = xi2 * s00_i`
//! * `s11_i = xi2 * s10_i`
//!
//! Coordinates that are not part of the polygon contribute monomials as in
//! [`monomial`](super::monomial). Only values are defined; derivatives are
//! not.
//!
//! In the packed argument vector the circumferential coordinate stores
//! `-(2 * (offset + dimension) + 1)` (odd), where `offset` is the distance
//! to the radial coordinate, and the radial coordinate stores
//! `-2 * vertices` (even). Non-negative entries are monomial orders.

use super::monomial;
use crate::basis_error::BasisError;
use crate::config::MAXIMUM_POLYGON_VERTICES;

/// Decoded per-coordinate entry of a standard basis argument vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackedArgument {
    /// Monomial order.
    Order(usize),
    /// Circumferential polygon coordinate; the radial one is `offset` later.
    Circumferential { offset: usize },
    /// Radial polygon coordinate.
    Radial { vertices: usize },
}

impl PackedArgument {
    pub fn decode(argument: i32, dimension: usize) -> Self {
        if argument >= 0 {
            return PackedArgument::Order(argument as usize);
        }
        let magnitude = argument.unsigned_abs() as usize;
        if magnitude % 2 == 1 {
            PackedArgument::Circumferential {
                offset: (magnitude / 2) % dimension.max(1),
            }
        } else {
            PackedArgument::Radial {
                vertices: magnitude / 2,
            }
        }
    }

    /// Packed form; fails if the entry does not fit an `i32`.
    pub fn encode(self, dimension: usize) -> Result<i32, BasisError> {
        let packed = match self {
            PackedArgument::Order(order) => i32::try_from(order).ok(),
            PackedArgument::Circumferential { offset } => offset
                .checked_add(dimension)
                .and_then(|m| m.checked_mul(2))
                .and_then(|m| m.checked_add(1))
                .and_then(|m| i32::try_from(m).ok())
                .map(|m| -m),
            PackedArgument::Radial { vertices } => vertices
                .checked_mul(2)
                .and_then(|m| i32::try_from(m).ok())
                .map(|m| -m),
        };
        packed.ok_or_else(|| {
            BasisError::invalid_type(format!("{self:?} does not fit a packed argument"))
        })
    }
}

/// Check that every circumferential entry points at a radial entry with
/// 3 to [`MAXIMUM_POLYGON_VERTICES`] vertices.
pub(crate) fn validate(arguments: &[i32]) -> Result<(), BasisError> {
    let dimension = arguments.len();
    for (xi, &argument) in arguments.iter().enumerate() {
        if let PackedArgument::Circumferential { offset } = PackedArgument::decode(argument, dimension) {
            let radial = xi + offset;
            match arguments.get(radial).map(|&a| PackedArgument::decode(a, dimension)) {
                Some(PackedArgument::Radial { vertices })
                    if offset > 0 && (3..=MAXIMUM_POLYGON_VERTICES).contains(&vertices) => {}
                _ => {
                    return Err(BasisError::invalid_type(format!(
                        "polygon argument on xi{} has no radial partner",
                        xi + 1
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Number of standard functions for validated per-coordinate arguments,
/// `None` on overflow.
pub(crate) fn count(arguments: &[i32]) -> Option<usize> {
    let dimension = arguments.len();
    arguments.iter().enumerate().try_fold(1usize, |n, (xi, &a)| {
        let factor = match PackedArgument::decode(a, dimension) {
            PackedArgument::Order(order) => order.checked_add(1)?,
            PackedArgument::Circumferential { offset } => 4 * vertices_at(arguments, xi + offset),
            PackedArgument::Radial { .. } => 1,
        };
        n.checked_mul(factor)
    })
}

fn vertices_at(arguments: &[i32], radial: usize) -> usize {
    match PackedArgument::decode(arguments[radial], arguments.len()) {
        PackedArgument::Radial { vertices } => vertices,
        _ => 0,
    }
}

/// Sector containing the circumferential coordinate and the local
/// coordinate within it. `xi` is wrapped into `[0, 1)` first.
pub(crate) fn locate(xi_circumferential: f64, vertices: usize) -> (usize, f64) {
    let wrapped = xi_circumferential - xi_circumferential.floor();
    let scaled = wrapped * vertices as f64;
    let mut vertex = scaled as usize;
    let local = scaled - vertex as f64;
    if vertex == vertices {
        vertex = 0;
    }
    (vertex, local)
}

/// Write the polygon standard function values at `xi` into `values`.
pub(crate) fn evaluate(arguments: &[i32], xi: &[f64], values: &mut [f64]) {
    let dimension = arguments.len();
    values[0] = 1.0;
    let mut n = 1;
    for (i, &argument) in arguments.iter().enumerate() {
        match PackedArgument::decode(argument, dimension) {
            PackedArgument::Order(order) => {
                n = monomial::extend_with_powers(values, n, xi[i], order);
            }
            PackedArgument::Circumferential { offset } => {
                let vertices = vertices_at(arguments, i + offset);
                let radial = xi[i + offset];
                let (vertex, bf10) = locate(xi[i], vertices);
                let bf11 = radial * bf10;
                let block = vertices * n;
                let base = vertex * n;
                // writes land at or beyond index j, never on unread entries
                for j in 0..n {
                    let v = values[j];
                    values[base + j] = v;
                    values[base + block + j] = bf10 * v;
                    values[base + 2 * block + j] = radial * v;
                    values[base + 3 * block + j] = bf11 * v;
                }
                for kind in 0..4 {
                    for other in (0..vertices).filter(|&o| o != vertex) {
                        let start = kind * block + other * n;
                        values[start..start + n].fill(0.0);
                    }
                }
                n *= 4 * vertices;
            }
            PackedArgument::Radial { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_radius() -> Vec<i32> {
        vec![
            PackedArgument::Circumferential { offset: 1 }.encode(2).unwrap(),
            PackedArgument::Radial { vertices: 4 }.encode(2).unwrap(),
        ]
    }

    #[test]
    fn packing_round_trips() {
        let args = square_with_radius();
        assert_eq!(args, vec![-7, -8]);
        assert_eq!(
            PackedArgument::decode(args[0], 2),
            PackedArgument::Circumferential { offset: 1 }
        );
        assert_eq!(
            PackedArgument::decode(args[1], 2),
            PackedArgument::Radial { vertices: 4 }
        );
        assert_eq!(count(&args), Some(16));
        assert!(validate(&args).is_ok());
        assert!(validate(&[-7, 2]).is_err());
    }

    #[test]
    fn oversized_polygons_are_rejected() {
        assert!(PackedArgument::Radial { vertices: usize::MAX }.encode(2).is_err());
        assert!(PackedArgument::Radial { vertices: 1 << 30 }.encode(2).is_err());
        assert!(PackedArgument::Order(1 << 31).encode(2).is_err());
        let too_many = PackedArgument::Radial { vertices: MAXIMUM_POLYGON_VERTICES + 1 };
        assert!(validate(&[-7, too_many.encode(2).unwrap()]).is_err());
        let most = PackedArgument::Radial { vertices: MAXIMUM_POLYGON_VERTICES };
        assert!(validate(&[-7, most.encode(2).unwrap()]).is_ok());
    }

    #[test]
    fn second_sector_values() {
        let args = square_with_radius();
        let mut values = vec![f64::NAN; 16];
        evaluate(&args, &[0.375, 0.5], &mut values);
        let mut expected = vec![0.0; 16];
        expected[1] = 1.0;
        expected[4 + 1] = 0.5;
        expected[8 + 1] = 0.5;
        expected[12 + 1] = 0.25;
        assert_eq!(values, expected);
    }

    #[test]
    fn circumferential_coordinate_wraps() {
        assert_eq!(locate(1.0, 5), (0, 0.0));
        let (v, local) = locate(-0.1, 5);
        assert_eq!(v, 4);
        assert!((local - 0.5).abs() < 1e-12);
    }
}
