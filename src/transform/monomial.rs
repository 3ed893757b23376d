//! Affine substitution into monomial standard functions.

use super::AffineMap;
use crate::basis::Basis;
use crate::basis_error::{BasisError, try_zeroed};
use crate::standard::{StandardBasis, monomial};

/// Expand every native monomial used by the blending matrix as a
/// polynomial in the target coordinates.
///
/// The target order of coordinate `k` is the largest total power that any
/// used native monomial places on the native coordinates driven by `k`.
/// Monomials with an empty blending column are left as zero rows.
pub(super) fn transform(
    basis: &Basis,
    map: &AffineMap,
) -> Result<(StandardBasis, Vec<f64>), BasisError> {
    let native = basis.standard_basis();
    let orders = native.monomial_orders().ok_or_else(|| {
        BasisError::unsupported_transformation("monomial transformation of a polygon basis")
    })?;
    let target = map.target_dimension();
    let used: Vec<usize> = basis
        .blending_column_sizes()
        .iter()
        .enumerate()
        .filter(|(_, size)| **size > 0)
        .map(|(s, _)| s)
        .collect();

    let mut target_orders = vec![0; target];
    for &s in &used {
        for (k, order) in target_orders.iter_mut().enumerate() {
            let degree: usize = (0..orders.len())
                .filter(|&i| map.coefficient(i, k) != 0.0)
                .map(|i| monomial::power_of(&orders, i, s))
                .sum();
            *order = (*order).max(degree);
        }
    }
    let inherited = StandardBasis::monomial(&target_orders)?;
    let inherited_count = inherited.number_of_functions();
    let target_strides: Vec<usize> = (0..target)
        .map(|k| monomial::stride(&target_orders, k))
        .collect();

    let native_count = native.number_of_functions();
    let mut transformation =
        try_zeroed(native_count * inherited_count, "standard basis transformation")?;
    let mut polynomial = vec![0.0; inherited_count];
    let mut product = vec![0.0; inherited_count];
    for &s in &used {
        polynomial.fill(0.0);
        polynomial[0] = 1.0;
        for i in 0..orders.len() {
            let b = map.translation(i);
            for _ in 0..monomial::power_of(&orders, i, s) {
                // polynomial *= (b_i + sum_k A_ik t_k)
                product.fill(0.0);
                for (index, &c) in polynomial.iter().enumerate() {
                    if c == 0.0 {
                        continue;
                    }
                    product[index] += b * c;
                    for k in 0..target {
                        let a = map.coefficient(i, k);
                        if a == 0.0 {
                            continue;
                        }
                        if monomial::power_of(&target_orders, k, index) == target_orders[k] {
                            return Err(BasisError::unsupported_transformation(format!(
                                "monomial {s} exceeds target order {} in xi{}",
                                target_orders[k],
                                k + 1
                            )));
                        }
                        product[index + target_strides[k]] += a * c;
                    }
                }
                std::mem::swap(&mut polynomial, &mut product);
            }
        }
        transformation[s * inherited_count..(s + 1) * inherited_count].copy_from_slice(&polynomial);
    }
    Ok((inherited, transformation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_on_reversed_line() {
        // xi = 1 - t, so 1, xi, xi^2 become 1, 1 - t, 1 - 2t + t^2
        let basis = Basis::new("q.Lagrange".parse().unwrap()).unwrap();
        let map = AffineMap::new(1, 1, vec![1.0, -1.0]).unwrap();
        let (inherited, t) = transform(&basis, &map).unwrap();
        assert_eq!(inherited.arguments(), &[1, 2]);
        #[rustfmt::skip]
        let expected = [
            1.0, 0.0, 0.0,
            1.0, -1.0, 0.0,
            1.0, -2.0, 1.0,
        ];
        assert_eq!(t, expected);
    }

    #[test]
    fn diagonal_of_bilinear_square() {
        // xi1 = xi2 = t: xy becomes t^2
        let basis = Basis::new("l.Lagrange*l.Lagrange".parse().unwrap()).unwrap();
        let map = AffineMap::new(2, 1, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        let (inherited, t) = transform(&basis, &map).unwrap();
        assert_eq!(inherited.arguments(), &[1, 2]);
        assert_eq!(&t[9..12], &[0.0, 0.0, 1.0]);
    }
}
