//! Restriction of polygon standard functions.
//!
//! The transformation is built as a matrix `W` whose columns are the native
//! standard functions and whose rows start as the same functions. Native
//! coordinates are visited in order; a coordinate kept by the map keeps its
//! digit of the row index (re-expanded in the target coordinate when the map
//! scales or shifts it), a dropped one has its digit folded into fewer
//! digits. At the end the rows are the target standard functions and `W`
//! transposed is the transformation.
//!
//! Polygon coordinates are either kept together and unscaled (the target is
//! a polygon too), kept circumferentially only (the target runs along one
//! side, from the vertex at the circumferential translation to the next, at
//! the radius given by the radial translation) or dropped together (the
//! target sits at a fixed point of the polygon).

use super::AffineMap;
use crate::basis::Basis;
use crate::basis_error::{BasisError, try_zeroed};
use crate::blending::tensor;
use crate::standard::polygon::{PackedArgument, locate};
use crate::standard::{StandardBasis, StandardBasisFunction};

/// Slack allowed when a map coefficient must land on a polygon vertex.
const VERTEX_TOLERANCE: f64 = 1e-9;

/// Vertex at circumferential position `b`; fails unless `b` is one.
fn vertex_at(b: f64, vertices: usize) -> Result<usize, BasisError> {
    let scaled = b * vertices as f64;
    let nearest = scaled.round();
    if (scaled - nearest).abs() > VERTEX_TOLERANCE {
        return Err(BasisError::unsupported_transformation(format!(
            "circumferential translation {b} is not a vertex of a {vertices}-gon"
        )));
    }
    Ok((nearest as i64).rem_euclid(vertices as i64) as usize)
}

/// Replace the row digit of `radix` (above `inner` faster digits) by
/// `weights.len()` digits, new digit `d` being the weighted sum of the old
/// digits listed in `weights[d]`. Rows hold `columns` entries.
fn fold_digit(
    w: &[f64],
    columns: usize,
    inner: usize,
    radix: usize,
    weights: &[Vec<(usize, f64)>],
) -> Result<Vec<f64>, BasisError> {
    let rows = w.len() / columns;
    let outer = rows / (radix * inner);
    let new_radix = weights.len();
    let mut out = try_zeroed(outer * new_radix * inner * columns, "polygon transformation")?;
    for o in 0..outer {
        for (d, terms) in weights.iter().enumerate() {
            for k in 0..inner {
                let dst_row = (o * new_radix + d) * inner + k;
                let dst = &mut out[dst_row * columns..(dst_row + 1) * columns];
                for &(old, weight) in terms {
                    let src_row = (o * radix + old) * inner + k;
                    let src = &w[src_row * columns..(src_row + 1) * columns];
                    for (x, y) in dst.iter_mut().zip(src) {
                        *x += weight * y;
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Fold weights for `xi = b + a t` on a monomial coordinate of `order`:
/// `xi^p` contributes `C(p, m) b^(p-m) a^m` to `t^m`.
fn substitution_weights(order: usize, b: f64, a: f64) -> Vec<Vec<(usize, f64)>> {
    (0..=order)
        .map(|m| {
            let mut binomial = 1.0;
            (m..=order)
                .map(|p| {
                    if p > m {
                        binomial = binomial * p as f64 / (p - m) as f64;
                    }
                    (p, binomial * b.powi((p - m) as i32) * a.powi(m as i32))
                })
                .filter(|&(_, weight)| weight != 0.0)
                .collect()
        })
        .collect()
}

/// Polygon standard functions `s00, s10, s01, s11` of `vertex` at local
/// coordinate `local` and radius `radius`, as fold weights.
fn sector_point(vertex: usize, vertices: usize, local: f64, radius: f64) -> Vec<(usize, f64)> {
    [
        (vertex, 1.0),
        (vertex + vertices, local),
        (vertex + 2 * vertices, radius),
        (vertex + 3 * vertices, radius * local),
    ]
    .into_iter()
    .filter(|&(_, weight)| weight != 0.0)
    .collect()
}

pub(super) fn transform(
    basis: &Basis,
    map: &AffineMap,
) -> Result<(StandardBasis, Vec<f64>), BasisError> {
    let native = basis.standard_basis();
    let packed = native.packed_arguments();
    let target = map.target_dimension();
    let native_to_target = map.one_to_one()?;
    let columns = native.number_of_functions();

    let mut w = try_zeroed(columns * columns, "polygon transformation")?;
    for s in 0..columns {
        w[s * columns + s] = 1.0;
    }
    let mut inner = 1;
    let mut inherited = vec![PackedArgument::Order(0); target];
    // (target xi, radix) of kept digits in native order
    let mut kept: Vec<(usize, usize)> = Vec::with_capacity(target);
    let mut polygon_kept = false;

    for (i, argument) in packed.iter().enumerate() {
        match *argument {
            PackedArgument::Order(order) => match native_to_target[i] {
                Some(t) => {
                    let (b, a) = (map.translation(i), map.coefficient(i, t));
                    if b != 0.0 || a != 1.0 {
                        let weights = substitution_weights(order, b, a);
                        w = fold_digit(&w, columns, inner, order + 1, &weights)?;
                    }
                    inherited[t] = PackedArgument::Order(order);
                    kept.push((t, order + 1));
                    inner *= order + 1;
                }
                None => {
                    let b = map.translation(i);
                    let weights = vec![(0..=order).map(|m| (m, b.powi(m as i32))).collect()];
                    w = fold_digit(&w, columns, inner, order + 1, &weights)?;
                }
            },
            PackedArgument::Circumferential { offset } => {
                let radial = i + offset;
                let Some(&PackedArgument::Radial { vertices }) = packed.get(radial) else {
                    return Err(BasisError::invalid_type(format!(
                        "polygon on xi{} has no radial coordinate",
                        i + 1
                    )));
                };
                let radix = 4 * vertices;
                match (native_to_target[i], native_to_target[radial]) {
                    (Some(tc), Some(tr)) => {
                        if tr <= tc {
                            return Err(BasisError::unsupported_transformation(
                                "reordering of polygon coordinates is not supported",
                            ));
                        }
                        let unscaled = |native: usize, target: usize| {
                            map.translation(native) == 0.0 && map.coefficient(native, target) == 1.0
                        };
                        if !unscaled(i, tc) || !unscaled(radial, tr) {
                            return Err(BasisError::unsupported_transformation(format!(
                                "polygon on xi{} must be inherited without scale or offset",
                                i + 1
                            )));
                        }
                        inherited[tc] = PackedArgument::Circumferential { offset: tr - tc };
                        inherited[tr] = PackedArgument::Radial { vertices };
                        kept.push((tc, radix));
                        kept.push((tr, 1));
                        inner *= radix;
                        polygon_kept = true;
                    }
                    (Some(tc), None) => {
                        let side = map.coefficient(i, tc) * vertices as f64;
                        if (side - 1.0).abs() > VERTEX_TOLERANCE {
                            return Err(BasisError::unsupported_transformation(format!(
                                "circumferential scale {} does not span one side of a {vertices}-gon",
                                map.coefficient(i, tc)
                            )));
                        }
                        let vertex = vertex_at(map.translation(i), vertices)?;
                        let radius = map.translation(radial);
                        // sector `vertex` with its local coordinate equal to t
                        let start = sector_point(vertex, vertices, 0.0, radius);
                        let slope: Vec<(usize, f64)> = [
                            (vertex + vertices, 1.0),
                            (vertex + 3 * vertices, radius),
                        ]
                        .into_iter()
                        .filter(|&(_, weight)| weight != 0.0)
                        .collect();
                        w = fold_digit(&w, columns, inner, radix, &[start, slope])?;
                        inherited[tc] = PackedArgument::Order(1);
                        kept.push((tc, 2));
                        inner *= 2;
                    }
                    (None, Some(_)) => {
                        return Err(BasisError::unsupported_transformation(
                            "cannot inherit a polygon radial coordinate by itself",
                        ));
                    }
                    (None, None) => {
                        let (vertex, local) = locate(map.translation(i), vertices);
                        let point = sector_point(vertex, vertices, local, map.translation(radial));
                        w = fold_digit(&w, columns, inner, radix, &[point])?;
                    }
                }
            }
            PackedArgument::Radial { .. } => {}
        }
    }

    let function = if polygon_kept {
        StandardBasisFunction::Polygon
    } else {
        StandardBasisFunction::Monomial
    };
    let mut arguments = Vec::with_capacity(target + 1);
    arguments.push(target as i32);
    for argument in &inherited {
        arguments.push(argument.encode(target)?);
    }
    let standard_basis = StandardBasis::new(function, arguments)?;
    let inherited_count = standard_basis.number_of_functions();
    if w.len() != inherited_count * columns {
        return Err(BasisError::DimensionMismatch {
            expected: inherited_count * columns,
            found: w.len(),
        });
    }

    let mut transformation = try_zeroed(columns * inherited_count, "polygon transformation")?;
    for (j, row) in w.chunks_exact(columns).enumerate() {
        for (s, &value) in row.iter().enumerate() {
            transformation[s * inherited_count + j] = value;
        }
    }

    let mut scan: Vec<usize> = kept.iter().map(|&(t, _)| t).collect();
    let mut radices: Vec<usize> = kept.iter().map(|&(_, r)| r).collect();
    for t in 0..target {
        if !scan.contains(&t) {
            scan.push(t);
            radices.push(1);
        }
    }
    if !scan.iter().copied().eq(0..target) {
        log::trace!("reordering inherited standard functions from {scan:?}");
        let permutation = tensor::column_permutation(&scan, &radices);
        transformation =
            tensor::permute_columns(&transformation, columns, inherited_count, &permutation)?;
    }
    Ok((standard_basis, transformation))
}
