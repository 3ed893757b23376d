//! Basis type descriptors.
//!
//! A [`BasisType`] is the flat integer array `[dimension, upper triangle]`
//! describing the interpolation family on each xi coordinate (diagonal) and
//! the linkage between coordinates (off-diagonal). Linked coordinates form a
//! single non-tensor-product patch: a simplex, a cubic Hermite serendipity
//! patch, or a polygon (whose relation value is its vertex count).
//!
//! Descriptors are validated on construction, immutable afterwards and
//! totally ordered (lexicographically over the flat array) so they can key
//! the [`BasisRegistry`](crate::registry::BasisRegistry).

pub mod description;

use crate::basis_error::BasisError;
use crate::config::{MAXIMUM_ELEMENT_XI_DIMENSIONS, MAXIMUM_POLYGON_VERTICES};
use serde::{Deserialize, Serialize};

/// Off-diagonal code for two unrelated coordinates.
pub const NO_RELATION: i32 = 0;

/// Interpolation family of a single xi coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BasisFunctionType {
    /// One function, no variation.
    Constant,
    LinearLagrange,
    QuadraticLagrange,
    CubicLagrange,
    /// Value and first derivative at both ends.
    CubicHermite,
    /// Value and derivative at xi=0, value at xi=1.
    HermiteLagrange,
    /// Value at xi=0, value and derivative at xi=1.
    LagrangeHermite,
    LinearSimplex,
    QuadraticSimplex,
    CubicHermiteSerendipity,
    /// Circumferential/radial coordinate of a polygon.
    Polygon,
}

impl BasisFunctionType {
    pub const ALL: [BasisFunctionType; 11] = [
        BasisFunctionType::Constant,
        BasisFunctionType::LinearLagrange,
        BasisFunctionType::QuadraticLagrange,
        BasisFunctionType::CubicLagrange,
        BasisFunctionType::CubicHermite,
        BasisFunctionType::HermiteLagrange,
        BasisFunctionType::LagrangeHermite,
        BasisFunctionType::LinearSimplex,
        BasisFunctionType::QuadraticSimplex,
        BasisFunctionType::CubicHermiteSerendipity,
        BasisFunctionType::Polygon,
    ];

    /// Integer code stored on the diagonal of the flat descriptor.
    pub fn code(self) -> i32 {
        match self {
            BasisFunctionType::Constant => 1,
            BasisFunctionType::LinearLagrange => 2,
            BasisFunctionType::QuadraticLagrange => 3,
            BasisFunctionType::CubicLagrange => 4,
            BasisFunctionType::CubicHermite => 5,
            BasisFunctionType::HermiteLagrange => 6,
            BasisFunctionType::LagrangeHermite => 7,
            BasisFunctionType::LinearSimplex => 8,
            BasisFunctionType::QuadraticSimplex => 9,
            BasisFunctionType::CubicHermiteSerendipity => 10,
            BasisFunctionType::Polygon => 11,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Simplex and serendipity families: coordinates must be tied in groups of 2 or 3.
    pub fn is_simplex_like(self) -> bool {
        matches!(
            self,
            BasisFunctionType::LinearSimplex
                | BasisFunctionType::QuadraticSimplex
                | BasisFunctionType::CubicHermiteSerendipity
        )
    }

    /// Families carrying nodal derivative parameters.
    pub fn is_hermite(self) -> bool {
        matches!(
            self,
            BasisFunctionType::CubicHermite
                | BasisFunctionType::CubicHermiteSerendipity
                | BasisFunctionType::HermiteLagrange
                | BasisFunctionType::LagrangeHermite
        )
    }

    /// Whether interpolation along this coordinate is of degree > 1.
    pub fn is_non_linear(self) -> bool {
        !matches!(
            self,
            BasisFunctionType::Constant
                | BasisFunctionType::LinearLagrange
                | BasisFunctionType::LinearSimplex
                | BasisFunctionType::Polygon
        )
    }

    /// Number of nodes along the coordinate for 1-D families.
    pub fn nodes_in_xi(self) -> Option<usize> {
        match self {
            BasisFunctionType::Constant => Some(1),
            BasisFunctionType::LinearLagrange
            | BasisFunctionType::CubicHermite
            | BasisFunctionType::CubicHermiteSerendipity
            | BasisFunctionType::LagrangeHermite
            | BasisFunctionType::HermiteLagrange => Some(2),
            BasisFunctionType::QuadraticLagrange => Some(3),
            BasisFunctionType::CubicLagrange => Some(4),
            _ => None,
        }
    }
}

/// A validated grouping of xi coordinates, in order of first coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkedGroup {
    /// A 1-D family on one coordinate (0-based).
    Single { xi: usize, family: BasisFunctionType },
    /// A simplex or serendipity patch; `xis` ascending, at least two.
    Tied {
        family: BasisFunctionType,
        xis: Vec<usize>,
    },
    /// A polygon; circumferential coordinate precedes the radial one.
    Polygon {
        circumferential: usize,
        radial: usize,
        vertices: usize,
    },
}

impl LinkedGroup {
    /// Xi coordinates covered by the unit, ascending.
    pub fn xis(&self) -> Vec<usize> {
        match self {
            LinkedGroup::Single { xi, .. } => vec![*xi],
            LinkedGroup::Tied { xis, .. } => xis.clone(),
            LinkedGroup::Polygon {
                circumferential,
                radial,
                ..
            } => vec![*circumferential, *radial],
        }
    }
}

/// Validated, immutable basis type descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct BasisType {
    array: Vec<i32>,
    // derived from `array` on validation
    groups: Vec<LinkedGroup>,
}

/// Length of the flat array for a given dimension.
#[inline]
pub fn type_array_len(dimension: usize) -> usize {
    1 + dimension * (dimension + 1) / 2
}

/// Position of entry `(i, j)`, `i <= j`, in the flat array. Row `i` of the
/// upper triangle follows rows `0..i` of lengths `n, n-1, ...`.
#[inline]
fn entry_offset(dimension: usize, i: usize, j: usize) -> usize {
    debug_assert!(i <= j && j < dimension);
    1 + i * dimension - i * i.saturating_sub(1) / 2 + (j - i)
}

impl BasisType {
    /// Validate a flat descriptor array (`parseType`).
    pub fn from_array(array: &[i32]) -> Result<Self, BasisError> {
        let groups = validate_array(array)?;
        Ok(Self {
            array: array.to_vec(),
            groups,
        })
    }

    /// Tensor product of independent 1-D families, one per coordinate.
    pub fn tensor_product(families: &[BasisFunctionType]) -> Result<Self, BasisError> {
        let n = families.len();
        let mut array = vec![NO_RELATION; type_array_len(n)];
        array[0] = n as i32;
        for (xi, family) in families.iter().enumerate() {
            array[entry_offset(n, xi, xi)] = family.code();
        }
        Self::from_array(&array)
    }

    /// Start building a descriptor of the given dimension with all entries unset.
    pub fn builder(dimension: usize) -> BasisTypeBuilder {
        BasisTypeBuilder::new(dimension)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.array[0] as usize
    }

    /// The flat `[dimension, upper triangle]` array.
    #[inline]
    pub fn as_array(&self) -> &[i32] {
        &self.array
    }

    /// Family of coordinate `xi` (0-based).
    pub fn function_type(&self, xi: usize) -> Result<BasisFunctionType, BasisError> {
        let n = self.dimension();
        if xi >= n {
            return Err(BasisError::IndexOutOfRange {
                what: "xi",
                index: xi,
                len: n,
            });
        }
        BasisFunctionType::from_code(self.array[entry_offset(n, xi, xi)])
            .ok_or_else(|| BasisError::invalid_type("corrupt diagonal entry"))
    }

    /// Relation value between two distinct coordinates (symmetric).
    pub fn relation(&self, xi_a: usize, xi_b: usize) -> i32 {
        let n = self.dimension();
        let (i, j) = if xi_a <= xi_b { (xi_a, xi_b) } else { (xi_b, xi_a) };
        if i == j || j >= n {
            return NO_RELATION;
        }
        self.array[entry_offset(n, i, j)]
    }

    /// Next higher coordinate linked to `xi` and its relation value, or
    /// `None` if there is no linked coordinate after `xi`.
    pub fn next_linked_xi(&self, xi: usize) -> Result<Option<(usize, i32)>, BasisError> {
        let family = self.function_type(xi)?;
        for j in (xi + 1)..self.dimension() {
            let link = self.relation(xi, j);
            if link != NO_RELATION {
                if self.function_type(j)? != family {
                    return Err(BasisError::invalid_type(format!(
                        "linked xi{} and xi{} have different basis types",
                        xi + 1,
                        j + 1
                    )));
                }
                return Ok(Some((j, link)));
            }
        }
        Ok(None)
    }

    /// True if any coordinate interpolates at higher than linear order.
    pub fn is_non_linear(&self) -> bool {
        (0..self.dimension())
            .filter_map(|xi| self.function_type(xi).ok())
            .any(BasisFunctionType::is_non_linear)
    }

    /// True if every coordinate is an independent 1-D family.
    pub fn is_tensor_product(&self) -> bool {
        self.linked_groups()
            .iter()
            .all(|u| matches!(u, LinkedGroup::Single { .. }))
    }

    /// Linkage groups in order of their first coordinate.
    pub fn linked_groups(&self) -> &[LinkedGroup] {
        &self.groups
    }

    /// Copy of this descriptor with every Hermite-family coordinate
    /// replaced by linear Lagrange. Ties of replaced coordinates are
    /// dropped since linear Lagrange coordinates are never tied.
    pub fn to_connectivity_type(&self) -> Result<Option<BasisType>, BasisError> {
        let n = self.dimension();
        let mut array = self.array.clone();
        let mut changed = false;
        for xi in 0..n {
            if self.function_type(xi)?.is_hermite() {
                array[entry_offset(n, xi, xi)] = BasisFunctionType::LinearLagrange.code();
                for other in 0..n {
                    if other != xi {
                        let (i, j) = if xi < other { (xi, other) } else { (other, xi) };
                        array[entry_offset(n, i, j)] = NO_RELATION;
                    }
                }
                changed = true;
            }
        }
        if !changed {
            return Ok(None);
        }
        Self::from_array(&array).map(Some)
    }
}

impl TryFrom<Vec<i32>> for BasisType {
    type Error = BasisError;

    fn try_from(array: Vec<i32>) -> Result<Self, Self::Error> {
        let groups = validate_array(&array)?;
        Ok(Self { array, groups })
    }
}

impl From<BasisType> for Vec<i32> {
    fn from(t: BasisType) -> Self {
        t.array
    }
}

/// Incremental construction of a [`BasisType`]; validated by [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct BasisTypeBuilder {
    array: Vec<i32>,
}

impl BasisTypeBuilder {
    fn new(dimension: usize) -> Self {
        let mut array = vec![NO_RELATION; type_array_len(dimension)];
        array[0] = dimension as i32;
        Self { array }
    }

    fn dimension(&self) -> usize {
        self.array[0] as usize
    }

    /// Set the family of coordinate `xi` (0-based). Out-of-range indices
    /// are reported by [`build`](Self::build).
    pub fn function_type(mut self, xi: usize, family: BasisFunctionType) -> Self {
        let n = self.dimension();
        if xi < n {
            self.array[entry_offset(n, xi, xi)] = family.code();
        } else {
            self.array[0] = -1;
        }
        self
    }

    /// Set the relation value between two distinct coordinates.
    pub fn link(mut self, xi_a: usize, xi_b: usize, value: i32) -> Self {
        let n = self.dimension();
        let (i, j) = if xi_a <= xi_b { (xi_a, xi_b) } else { (xi_b, xi_a) };
        if i != j && j < n {
            self.array[entry_offset(n, i, j)] = value;
        } else {
            self.array[0] = -1;
        }
        self
    }

    pub fn build(self) -> Result<BasisType, BasisError> {
        if self.array[0] < 0 {
            return Err(BasisError::invalid_type("builder index out of range"));
        }
        BasisType::from_array(&self.array)
    }
}

/// Check array shape, codes and linkage; returns the units in scan order.
fn validate_array(array: &[i32]) -> Result<Vec<LinkedGroup>, BasisError> {
    let Some(&dim) = array.first() else {
        return Err(BasisError::invalid_type("empty type array"));
    };
    if dim < 1 || dim as usize > MAXIMUM_ELEMENT_XI_DIMENSIONS {
        return Err(BasisError::invalid_type(format!(
            "dimension {dim} outside 1..={MAXIMUM_ELEMENT_XI_DIMENSIONS}"
        )));
    }
    let n = dim as usize;
    if array.len() != type_array_len(n) {
        return Err(BasisError::invalid_type(format!(
            "type array length {} does not match dimension {n} (expected {})",
            array.len(),
            type_array_len(n)
        )));
    }
    let rel = |i: usize, j: usize| array[entry_offset(n, i, j)];
    let mut families = Vec::with_capacity(n);
    for xi in 0..n {
        let code = rel(xi, xi);
        let family = BasisFunctionType::from_code(code).ok_or_else(|| {
            BasisError::invalid_type(format!("unknown basis code {code} on xi{}", xi + 1))
        })?;
        families.push(family);
        for j in (xi + 1)..n {
            if rel(xi, j) < 0 {
                return Err(BasisError::invalid_type(format!(
                    "negative relation between xi{} and xi{}",
                    xi + 1,
                    j + 1
                )));
            }
        }
    }

    let mut group_of: Vec<Option<usize>> = vec![None; n];
    let mut units = Vec::new();
    for xi in 0..n {
        if group_of[xi].is_some() {
            continue;
        }
        let family = families[xi];
        let linked: Vec<usize> = ((xi + 1)..n).filter(|&j| rel(xi, j) != NO_RELATION).collect();
        let unit_index = units.len();
        match family {
            BasisFunctionType::Polygon => {
                let [radial] = linked[..] else {
                    return Err(BasisError::invalid_type(format!(
                        "polygon xi{} must be linked to exactly one later coordinate",
                        xi + 1
                    )));
                };
                let vertices = rel(xi, radial);
                if vertices < 3 || vertices as usize > MAXIMUM_POLYGON_VERTICES {
                    return Err(BasisError::invalid_type(format!(
                        "polygon needs 3 to {MAXIMUM_POLYGON_VERTICES} vertices, got {vertices}"
                    )));
                }
                if families[radial] != BasisFunctionType::Polygon {
                    return Err(BasisError::invalid_type(format!(
                        "polygon xi{} linked to non-polygon xi{}",
                        xi + 1,
                        radial + 1
                    )));
                }
                if group_of[radial].is_some() {
                    return Err(BasisError::invalid_type(format!(
                        "xi{} participates in two linkage groups",
                        radial + 1
                    )));
                }
                group_of[xi] = Some(unit_index);
                group_of[radial] = Some(unit_index);
                units.push(LinkedGroup::Polygon {
                    circumferential: xi,
                    radial,
                    vertices: vertices as usize,
                });
            }
            f if f.is_simplex_like() => {
                if linked.is_empty() {
                    return Err(BasisError::invalid_type(format!(
                        "{f:?} xi{} is not linked to a later coordinate",
                        xi + 1
                    )));
                }
                let mut xis = Vec::with_capacity(linked.len() + 1);
                xis.push(xi);
                for &j in &linked {
                    if families[j] != f {
                        return Err(BasisError::invalid_type(format!(
                            "xi{} ({f:?}) tied to xi{} of different family {:?}",
                            xi + 1,
                            j + 1,
                            families[j]
                        )));
                    }
                    if group_of[j].is_some() {
                        return Err(BasisError::invalid_type(format!(
                            "xi{} participates in two linkage groups",
                            j + 1
                        )));
                    }
                    xis.push(j);
                }
                if !(2..=3).contains(&xis.len()) {
                    return Err(BasisError::invalid_type(format!(
                        "{f:?} patch of {} coordinates is not supported",
                        xis.len()
                    )));
                }
                for &m in &xis {
                    group_of[m] = Some(unit_index);
                }
                units.push(LinkedGroup::Tied { family: f, xis });
            }
            f => {
                if let Some(&j) = linked.first() {
                    return Err(BasisError::invalid_type(format!(
                        "{f:?} xi{} cannot be linked to xi{}",
                        xi + 1,
                        j + 1
                    )));
                }
                group_of[xi] = Some(unit_index);
                units.push(LinkedGroup::Single { xi, family: f });
            }
        }
    }
    // later members may only relate to coordinates of their own group
    for xi in 0..n {
        for j in (xi + 1)..n {
            if rel(xi, j) != NO_RELATION && group_of[xi] != group_of[j] {
                return Err(BasisError::invalid_type(format!(
                    "xi{} participates in two linkage groups",
                    xi + 1
                )));
            }
        }
    }
    Ok(units)
}
