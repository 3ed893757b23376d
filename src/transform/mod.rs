//! Re-expressing a basis over another coordinate system.
//!
//! A [`BasisTransformation`] describes the native standard functions of a
//! basis, restricted through an [`AffineMap`], in terms of the standard
//! functions of the target space. Combined with the blending matrix it maps
//! nodal parameters directly onto the target's standard functions, which is
//! how a face or line inherits a field from its parent element.

mod monomial;
mod polygon;

use crate::basis::Basis;
use crate::basis_error::BasisError;
use crate::config::MAXIMUM_ELEMENT_XI_DIMENSIONS;
use crate::standard::{StandardBasis, StandardBasisFunction};
use serde::{Deserialize, Serialize};

/// Affine map `xi_i = b_i + sum_k A_ik t_k` from target coordinates `t` to
/// the native coordinates `xi` of a basis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineMap {
    native_dimension: usize,
    target_dimension: usize,
    /// One row per native coordinate: `[b_i, A_i1, ..., A_iT]`.
    coefficients: Vec<f64>,
}

impl AffineMap {
    /// Build from row-major `[b_i, A_i1, ..., A_iT]` rows, one per native
    /// coordinate.
    pub fn new(
        native_dimension: usize,
        target_dimension: usize,
        coefficients: Vec<f64>,
    ) -> Result<Self, BasisError> {
        for (what, dimension) in [("native", native_dimension), ("target", target_dimension)] {
            if dimension == 0 || dimension > MAXIMUM_ELEMENT_XI_DIMENSIONS {
                return Err(BasisError::unsupported_transformation(format!(
                    "{what} dimension {dimension} is outside 1..={MAXIMUM_ELEMENT_XI_DIMENSIONS}"
                )));
            }
        }
        let expected = native_dimension * (target_dimension + 1);
        if coefficients.len() != expected {
            return Err(BasisError::DimensionMismatch {
                expected,
                found: coefficients.len(),
            });
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(BasisError::unsupported_transformation(
                "affine map has non-finite coefficients",
            ));
        }
        Ok(Self {
            native_dimension,
            target_dimension,
            coefficients,
        })
    }

    pub fn identity(dimension: usize) -> Result<Self, BasisError> {
        let mut coefficients = vec![0.0; dimension * (dimension + 1)];
        for i in 0..dimension {
            coefficients[i * (dimension + 1) + i + 1] = 1.0;
        }
        Self::new(dimension, dimension, coefficients)
    }

    /// Restriction to the boundary `xi_fixed = value`; the remaining native
    /// coordinates map in order onto the target coordinates.
    pub fn restriction(
        native_dimension: usize,
        fixed: usize,
        value: f64,
    ) -> Result<Self, BasisError> {
        if fixed >= native_dimension || native_dimension < 2 {
            return Err(BasisError::IndexOutOfRange {
                what: "fixed xi",
                index: fixed,
                len: native_dimension,
            });
        }
        let target_dimension = native_dimension - 1;
        let width = target_dimension + 1;
        let mut coefficients = vec![0.0; native_dimension * width];
        for i in 0..native_dimension {
            match i.cmp(&fixed) {
                std::cmp::Ordering::Less => coefficients[i * width + i + 1] = 1.0,
                std::cmp::Ordering::Equal => coefficients[i * width] = value,
                std::cmp::Ordering::Greater => coefficients[i * width + i] = 1.0,
            }
        }
        Self::new(native_dimension, target_dimension, coefficients)
    }

    #[inline]
    pub fn native_dimension(&self) -> usize {
        self.native_dimension
    }

    #[inline]
    pub fn target_dimension(&self) -> usize {
        self.target_dimension
    }

    /// `b_i`.
    #[inline]
    pub fn translation(&self, native: usize) -> f64 {
        self.coefficients[native * (self.target_dimension + 1)]
    }

    /// `A_ik`.
    #[inline]
    pub fn coefficient(&self, native: usize, target: usize) -> f64 {
        self.coefficients[native * (self.target_dimension + 1) + target + 1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.coefficients
    }

    /// Native coordinate values at target location `t`.
    pub fn apply(&self, target_xi: &[f64]) -> Result<Vec<f64>, BasisError> {
        if target_xi.len() != self.target_dimension {
            return Err(BasisError::DimensionMismatch {
                expected: self.target_dimension,
                found: target_xi.len(),
            });
        }
        Ok((0..self.native_dimension)
            .map(|i| {
                self.translation(i)
                    + target_xi
                        .iter()
                        .enumerate()
                        .map(|(k, t)| self.coefficient(i, k) * t)
                        .sum::<f64>()
            })
            .collect())
    }

    /// Target coordinate driving each native coordinate, if any. Fails
    /// unless every native coordinate depends on at most one target
    /// coordinate and vice versa.
    pub(crate) fn one_to_one(&self) -> Result<Vec<Option<usize>>, BasisError> {
        let mut native_to_target = vec![None; self.native_dimension];
        let mut used = vec![false; self.target_dimension];
        for (i, slot) in native_to_target.iter_mut().enumerate() {
            for k in 0..self.target_dimension {
                if self.coefficient(i, k) == 0.0 {
                    continue;
                }
                if slot.is_some() || used[k] {
                    return Err(BasisError::unsupported_transformation(format!(
                        "coordinate map is not one to one at xi{} / target xi{}",
                        i + 1,
                        k + 1
                    )));
                }
                *slot = Some(k);
                used[k] = true;
            }
        }
        Ok(native_to_target)
    }
}

/// Native standard functions of a basis re-expressed over a target space.
#[derive(Clone, Debug, Serialize)]
pub struct BasisTransformation {
    standard_basis: StandardBasis,
    number_of_functions: usize,
    /// `native standard functions x inherited standard functions`.
    standard_transformation: Vec<f64>,
    /// `nodal functions x inherited standard functions`.
    combined_blending_matrix: Vec<f64>,
}

impl BasisTransformation {
    /// Standard basis of the target space.
    pub fn standard_basis(&self) -> &StandardBasis {
        &self.standard_basis
    }

    pub fn inherited_count(&self) -> usize {
        self.standard_basis.number_of_functions()
    }

    /// Nodal functions of the original basis (rows of the combined matrix).
    pub fn number_of_functions(&self) -> usize {
        self.number_of_functions
    }

    pub fn standard_transformation(&self) -> &[f64] {
        &self.standard_transformation
    }

    pub fn combined_blending_matrix(&self) -> &[f64] {
        &self.combined_blending_matrix
    }

    /// Values of the original nodal functions at target location `t`.
    pub fn evaluate(&self, target_xi: &[f64]) -> Result<Vec<f64>, BasisError> {
        let standard = self.standard_basis.evaluate(target_xi)?;
        let m = standard.len();
        Ok(self
            .combined_blending_matrix
            .chunks_exact(m)
            .map(|row| row.iter().zip(&standard).map(|(c, s)| c * s).sum())
            .collect())
    }
}

/// Re-express `basis` over the target space of `map`.
///
/// Monomial bases accept any affine map. Polygon bases need a one to one
/// map; a polygon whose radial coordinate is dropped collapses onto the
/// edge (or vertex) selected by the circumferential translation.
pub fn transform_basis(basis: &Basis, map: &AffineMap) -> Result<BasisTransformation, BasisError> {
    if map.native_dimension() != basis.dimension() {
        return Err(BasisError::DimensionMismatch {
            expected: basis.dimension(),
            found: map.native_dimension(),
        });
    }
    let (standard_basis, standard_transformation) = match basis.standard_basis().function() {
        StandardBasisFunction::Monomial => monomial::transform(basis, map)?,
        StandardBasisFunction::Polygon => polygon::transform(basis, map)?,
    };
    let inherited = standard_basis.number_of_functions();
    let combined_blending_matrix =
        basis.combined_blending_matrix(&standard_transformation, inherited)?;
    log::debug!(
        "transformed {} onto {} target coordinates: {} inherited standard functions",
        basis.basis_type(),
        map.target_dimension(),
        inherited
    );
    Ok(BasisTransformation {
        standard_basis,
        number_of_functions: basis.number_of_functions(),
        standard_transformation,
        combined_blending_matrix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restriction_rows() {
        let map = AffineMap::restriction(3, 1, 1.0).unwrap();
        assert_eq!(map.target_dimension(), 2);
        #[rustfmt::skip]
        let expected = [
            0.0, 1.0, 0.0,
            1.0, 0.0, 0.0,
            0.0, 0.0, 1.0,
        ];
        assert_eq!(map.as_slice(), &expected);
        assert_eq!(map.apply(&[0.25, 0.75]).unwrap(), vec![0.25, 1.0, 0.75]);
    }

    #[test]
    fn one_to_one_detection() {
        let map = AffineMap::new(2, 1, vec![0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!(matches!(
            map.one_to_one(),
            Err(BasisError::UnsupportedTransformation(_))
        ));
        let map = AffineMap::identity(3).unwrap();
        assert_eq!(map.one_to_one().unwrap(), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn bad_shapes_are_rejected() {
        assert!(AffineMap::new(2, 1, vec![0.0; 3]).is_err());
        assert!(AffineMap::new(4, 1, vec![0.0; 8]).is_err());
        assert!(AffineMap::new(1, 1, vec![f64::NAN, 1.0]).is_err());
        let basis = Basis::new("l.Lagrange*l.Lagrange".parse().unwrap()).unwrap();
        let map = AffineMap::identity(3).unwrap();
        assert!(matches!(
            transform_basis(&basis, &map),
            Err(BasisError::DimensionMismatch { .. })
        ));
    }
}
