//! Fixed blending matrices of the supported 1-D and tied families.
//!
//! Each table maps the family's nodal functions (rows) onto its monomials
//! (columns, xi_1 varying fastest) and labels every row with a
//! `(node, derivative)` pair for each coordinate of the unit.

use once_cell::sync::Lazy;
use static_assertions::const_assert_eq;

use crate::basis_error::{BasisError, try_zeroed};
use crate::basis_type::BasisFunctionType;

/// Blending data of one linkage group in isolation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct UnitTable {
    pub functions: usize,
    pub standard: usize,
    /// `functions x standard`, row-major.
    pub matrix: Vec<f64>,
    /// Per function, `(node, derivative)` for each coordinate of the unit.
    pub labels: Vec<Vec<(usize, bool)>>,
}

impl UnitTable {
    fn one_dimensional(size: usize, matrix: &[f64], labels: &[(usize, bool)]) -> Self {
        Self {
            functions: size,
            standard: size,
            matrix: matrix.to_vec(),
            labels: labels.iter().map(|&l| vec![l]).collect(),
        }
    }

    fn from_rows(standard: usize, rows: &[(Vec<(usize, f64)>, Vec<(usize, bool)>)]) -> Self {
        let mut matrix = vec![0.0; rows.len() * standard];
        for (r, (entries, _)) in rows.iter().enumerate() {
            for &(c, v) in entries.iter() {
                matrix[r * standard + c] = v;
            }
        }
        Self {
            functions: rows.len(),
            standard,
            matrix,
            labels: rows.iter().map(|(_, l)| l.clone()).collect(),
        }
    }

    #[cfg(test)]
    pub fn entry(&self, row: usize, column: usize) -> f64 {
        self.matrix[row * self.standard + column]
    }
}

const LINEAR_LAGRANGE: [f64; 4] = [1.0, -1.0, 0.0, 1.0];
const QUADRATIC_LAGRANGE: [f64; 9] = [1.0, -3.0, 2.0, 0.0, 4.0, -4.0, 0.0, -1.0, 2.0];
const CUBIC_LAGRANGE: [f64; 16] = [
    1.0, -5.5, 9.0, -4.5, 0.0, 9.0, -22.5, 13.5, 0.0, -4.5, 18.0, -13.5, 0.0, 1.0, -4.5, 4.5,
];
const CUBIC_HERMITE: [f64; 16] = [
    1.0, 0.0, -3.0, 2.0, 0.0, 1.0, -2.0, 1.0, 0.0, 0.0, 3.0, -2.0, 0.0, 0.0, -1.0, 1.0,
];
const LAGRANGE_HERMITE: [f64; 9] = [1.0, -2.0, 1.0, 0.0, 2.0, -1.0, 0.0, -1.0, 1.0];
const HERMITE_LAGRANGE: [f64; 9] = [1.0, 0.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0];
const LINEAR_SIMPLEX_2D: [f64; 12] = [
    1.0, -1.0, -1.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0,
];
const LINEAR_SIMPLEX_3D: [f64; 32] = [
    1.0, -1.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
];
const QUADRATIC_SIMPLEX_2D: [f64; 54] = [
    1.0, -3.0, 2.0, -3.0, 4.0, 0.0, 2.0, 0.0, 0.0, //
    0.0, 4.0, -4.0, 0.0, -4.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 4.0, -4.0, 0.0, -4.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 2.0, 0.0, 0.0,
];

const_assert_eq!(LINEAR_SIMPLEX_2D.len(), 3 * 4);
const_assert_eq!(LINEAR_SIMPLEX_3D.len(), 4 * 8);
const_assert_eq!(QUADRATIC_SIMPLEX_2D.len(), 6 * 9);

const LAGRANGE_LABELS: [(usize, bool); 4] = [(0, false), (1, false), (2, false), (3, false)];
const CUBIC_HERMITE_LABELS: [(usize, bool); 4] = [(0, false), (0, true), (1, false), (1, true)];
const LAGRANGE_HERMITE_LABELS: [(usize, bool); 3] = [(0, false), (1, false), (1, true)];
const HERMITE_LAGRANGE_LABELS: [(usize, bool); 3] = [(0, false), (0, true), (1, false)];

fn nodes(positions: &[usize]) -> Vec<(usize, bool)> {
    positions.iter().map(|&p| (p, false)).collect()
}

static CONSTANT_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(1, &[1.0], &[(0, false)]));
static LINEAR_LAGRANGE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(2, &LINEAR_LAGRANGE, &LAGRANGE_LABELS[..2]));
static QUADRATIC_LAGRANGE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(3, &QUADRATIC_LAGRANGE, &LAGRANGE_LABELS[..3]));
static CUBIC_LAGRANGE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(4, &CUBIC_LAGRANGE, &LAGRANGE_LABELS));
static CUBIC_HERMITE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(4, &CUBIC_HERMITE, &CUBIC_HERMITE_LABELS));
static LAGRANGE_HERMITE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(3, &LAGRANGE_HERMITE, &LAGRANGE_HERMITE_LABELS));
static HERMITE_LAGRANGE_TABLE: Lazy<UnitTable> =
    Lazy::new(|| UnitTable::one_dimensional(3, &HERMITE_LAGRANGE, &HERMITE_LAGRANGE_LABELS));

static LINEAR_SIMPLEX_2D_TABLE: Lazy<UnitTable> = Lazy::new(|| UnitTable {
    functions: 3,
    standard: 4,
    matrix: LINEAR_SIMPLEX_2D.to_vec(),
    labels: vec![nodes(&[0, 0]), nodes(&[1, 0]), nodes(&[0, 1])],
});

static LINEAR_SIMPLEX_3D_TABLE: Lazy<UnitTable> = Lazy::new(|| UnitTable {
    functions: 4,
    standard: 8,
    matrix: LINEAR_SIMPLEX_3D.to_vec(),
    labels: vec![
        nodes(&[0, 0, 0]),
        nodes(&[1, 0, 0]),
        nodes(&[0, 1, 0]),
        nodes(&[0, 0, 1]),
    ],
});

static QUADRATIC_SIMPLEX_2D_TABLE: Lazy<UnitTable> = Lazy::new(|| UnitTable {
    functions: 6,
    standard: 9,
    matrix: QUADRATIC_SIMPLEX_2D.to_vec(),
    labels: vec![
        nodes(&[0, 0]),
        nodes(&[1, 0]),
        nodes(&[2, 0]),
        nodes(&[0, 1]),
        nodes(&[1, 1]),
        nodes(&[0, 2]),
    ],
});

// monomial x^i y^j z^k sits in column i + 3j + 9k
static QUADRATIC_SIMPLEX_3D_TABLE: Lazy<UnitTable> = Lazy::new(|| {
    UnitTable::from_rows(
        27,
        &[
            (
                vec![
                    (0, 1.0),
                    (1, -3.0),
                    (2, 2.0),
                    (3, -3.0),
                    (4, 4.0),
                    (6, 2.0),
                    (9, -3.0),
                    (10, 4.0),
                    (12, 4.0),
                    (18, 2.0),
                ],
                nodes(&[0, 0, 0]),
            ),
            (
                vec![(1, 4.0), (2, -4.0), (4, -4.0), (10, -4.0)],
                nodes(&[1, 0, 0]),
            ),
            (vec![(1, -1.0), (2, 2.0)], nodes(&[2, 0, 0])),
            (
                vec![(3, 4.0), (4, -4.0), (6, -4.0), (12, -4.0)],
                nodes(&[0, 1, 0]),
            ),
            (vec![(4, 4.0)], nodes(&[1, 1, 0])),
            (vec![(3, -1.0), (6, 2.0)], nodes(&[0, 2, 0])),
            (
                vec![(9, 4.0), (10, -4.0), (12, -4.0), (18, -4.0)],
                nodes(&[0, 0, 1]),
            ),
            (vec![(10, 4.0)], nodes(&[1, 0, 1])),
            (vec![(12, 4.0)], nodes(&[0, 1, 1])),
            (vec![(9, -1.0), (18, 2.0)], nodes(&[0, 0, 2])),
        ],
    )
});

/// Cubic Hermite value/derivative polynomials at each end and linear
/// Lagrange polynomials, padded to four coefficients.
fn hermite_factors() -> ([[f64; 4]; 2], [[f64; 4]; 2], [[f64; 4]; 2]) {
    let row = |r: usize| -> [f64; 4] {
        let mut out = [0.0; 4];
        out.copy_from_slice(&CUBIC_HERMITE[4 * r..4 * r + 4]);
        out
    };
    let value = [row(0), row(2)];
    let slope = [row(1), row(3)];
    let linear = [[1.0, -1.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
    (value, slope, linear)
}

/// Coefficients of `f(xi1) * g(xi2) * h(xi3)` over `4^n` cubic monomials.
fn outer(factors: &[&[f64; 4]]) -> Vec<f64> {
    let mut out = vec![1.0];
    for factor in factors {
        let mut next = vec![0.0; out.len() * 4];
        for (p, &c) in factor.iter().enumerate() {
            for (q, &v) in out.iter().enumerate() {
                next[p * out.len() + q] = c * v;
            }
        }
        out = next;
    }
    out
}

fn accumulate(dest: &mut [f64], src: &[f64], scale: f64) {
    for (d, s) in dest.iter_mut().zip(src) {
        *d += scale * s;
    }
}

// Serendipity value functions add the Hermite-in-one-direction products and
// subtract the overcounted multilinear part.
static CUBIC_HERMITE_SERENDIPITY_2D_TABLE: Lazy<UnitTable> = Lazy::new(|| {
    let (value, slope, linear) = hermite_factors();
    let mut matrix = Vec::with_capacity(12 * 16);
    let mut labels = Vec::with_capacity(12);
    for n in 0..4 {
        let (n1, n2) = (n % 2, n / 2);
        let mut row = outer(&[&value[n1], &linear[n2]]);
        accumulate(&mut row, &outer(&[&linear[n1], &value[n2]]), 1.0);
        accumulate(&mut row, &outer(&[&linear[n1], &linear[n2]]), -1.0);
        matrix.extend(row);
        labels.push(vec![(n1, false), (n2, false)]);
        matrix.extend(outer(&[&slope[n1], &linear[n2]]));
        labels.push(vec![(n1, true), (n2, false)]);
        matrix.extend(outer(&[&linear[n1], &slope[n2]]));
        labels.push(vec![(n1, false), (n2, true)]);
    }
    UnitTable {
        functions: 12,
        standard: 16,
        matrix,
        labels,
    }
});

static CUBIC_HERMITE_SERENDIPITY_3D_TABLE: Lazy<UnitTable> = Lazy::new(|| {
    let (value, slope, linear) = hermite_factors();
    let mut matrix = Vec::with_capacity(32 * 64);
    let mut labels = Vec::with_capacity(32);
    for n in 0..8 {
        let node = [n % 2, (n / 2) % 2, n / 4];
        let lin = |d: usize| &linear[node[d]];
        let mut row = outer(&[&value[node[0]], lin(1), lin(2)]);
        accumulate(&mut row, &outer(&[lin(0), &value[node[1]], lin(2)]), 1.0);
        accumulate(&mut row, &outer(&[lin(0), lin(1), &value[node[2]]]), 1.0);
        accumulate(&mut row, &outer(&[lin(0), lin(1), lin(2)]), -2.0);
        matrix.extend(row);
        labels.push(node.iter().map(|&p| (p, false)).collect());
        for d in 0..3 {
            let factors: Vec<&[f64; 4]> = (0..3)
                .map(|e| if e == d { &slope[node[e]] } else { lin(e) })
                .collect();
            matrix.extend(outer(&factors));
            labels.push((0..3).map(|e| (node[e], e == d)).collect());
        }
    }
    UnitTable {
        functions: 32,
        standard: 64,
        matrix,
        labels,
    }
});

/// Table for a single-coordinate family.
pub(crate) fn single(family: BasisFunctionType) -> Option<&'static UnitTable> {
    Some(match family {
        BasisFunctionType::Constant => &CONSTANT_TABLE,
        BasisFunctionType::LinearLagrange => &LINEAR_LAGRANGE_TABLE,
        BasisFunctionType::QuadraticLagrange => &QUADRATIC_LAGRANGE_TABLE,
        BasisFunctionType::CubicLagrange => &CUBIC_LAGRANGE_TABLE,
        BasisFunctionType::CubicHermite => &CUBIC_HERMITE_TABLE,
        BasisFunctionType::LagrangeHermite => &LAGRANGE_HERMITE_TABLE,
        BasisFunctionType::HermiteLagrange => &HERMITE_LAGRANGE_TABLE,
        _ => return None,
    })
}

/// Monomial order a single-coordinate family needs.
pub(crate) fn single_order(family: BasisFunctionType) -> usize {
    match family {
        BasisFunctionType::Constant => 0,
        BasisFunctionType::LinearLagrange | BasisFunctionType::LinearSimplex => 1,
        BasisFunctionType::QuadraticLagrange
        | BasisFunctionType::QuadraticSimplex
        | BasisFunctionType::LagrangeHermite
        | BasisFunctionType::HermiteLagrange => 2,
        BasisFunctionType::CubicLagrange
        | BasisFunctionType::CubicHermite
        | BasisFunctionType::CubicHermiteSerendipity => 3,
        BasisFunctionType::Polygon => 1,
    }
}

/// Table for a tied simplex/serendipity group of `size` coordinates.
pub(crate) fn tied(family: BasisFunctionType, size: usize) -> Option<&'static UnitTable> {
    Some(match (family, size) {
        (BasisFunctionType::LinearSimplex, 2) => &LINEAR_SIMPLEX_2D_TABLE,
        (BasisFunctionType::LinearSimplex, 3) => &LINEAR_SIMPLEX_3D_TABLE,
        (BasisFunctionType::QuadraticSimplex, 2) => &QUADRATIC_SIMPLEX_2D_TABLE,
        (BasisFunctionType::QuadraticSimplex, 3) => &QUADRATIC_SIMPLEX_3D_TABLE,
        (BasisFunctionType::CubicHermiteSerendipity, 2) => &CUBIC_HERMITE_SERENDIPITY_2D_TABLE,
        (BasisFunctionType::CubicHermiteSerendipity, 3) => &CUBIC_HERMITE_SERENDIPITY_3D_TABLE,
        _ => return None,
    })
}

/// Polygon blending over `[s00 | s10 | s01 | s11]` blocks of `vertices`
/// functions each. Row 0 is the centre node; row `r` is vertex `r`.
pub(crate) fn polygon(vertices: usize) -> Result<UnitTable, BasisError> {
    let nv = vertices;
    let too_large = || BasisError::invalid_type(format!("polygon with {nv} vertices is too large"));
    let standard = nv.checked_mul(4).ok_or_else(too_large)?;
    let len = (nv + 1).checked_mul(standard).ok_or_else(too_large)?;
    let mut matrix = try_zeroed(len, "polygon blending table")?;
    for v in 0..nv {
        matrix[v] = 1.0;
        matrix[2 * nv + v] = -1.0;
    }
    for r in 1..=nv {
        let row = &mut matrix[r * standard..(r + 1) * standard];
        let own = r - 1;
        let previous = (own + nv - 1) % nv;
        row[2 * nv + own] = 1.0;
        row[3 * nv + own] = -1.0;
        row[3 * nv + previous] = 1.0;
    }
    Ok(UnitTable {
        functions: nv + 1,
        standard,
        matrix,
        labels: (0..=nv).map(|r| vec![(r, false), (0, false)]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_1d(coefficients: &[f64], x: f64) -> (f64, f64) {
        let mut value = 0.0;
        let mut slope = 0.0;
        for (p, &c) in coefficients.iter().enumerate() {
            value += c * x.powi(p as i32);
            if p > 0 {
                slope += c * p as f64 * x.powi(p as i32 - 1);
            }
        }
        (value, slope)
    }

    #[test]
    fn serendipity_2d_interpolates_nodal_parameters() {
        let table = &*CUBIC_HERMITE_SERENDIPITY_2D_TABLE;
        for (f, label) in table.labels.iter().enumerate() {
            let row = &table.matrix[f * 16..(f + 1) * 16];
            for node in 0..4 {
                let (x, y) = ((node % 2) as f64, (node / 2) as f64);
                let eval = |dx: usize, dy: usize| -> f64 {
                    let mut s = 0.0;
                    for j in 0..4 {
                        for i in 0..4 {
                            let c = row[j * 4 + i];
                            if c == 0.0 || i < dx || j < dy {
                                continue;
                            }
                            let fi = if dx == 1 { i as f64 * x.powi(i as i32 - 1) } else { x.powi(i as i32) };
                            let fj = if dy == 1 { j as f64 * y.powi(j as i32 - 1) } else { y.powi(j as i32) };
                            s += c * fi * fj;
                        }
                    }
                    s
                };
                let own = label[0].0 == node % 2 && label[1].0 == node / 2;
                let expect = |deriv: (bool, bool)| {
                    if own && (label[0].1, label[1].1) == deriv { 1.0 } else { 0.0 }
                };
                assert!((eval(0, 0) - expect((false, false))).abs() < 1e-12);
                assert!((eval(1, 0) - expect((true, false))).abs() < 1e-12);
                assert!((eval(0, 1) - expect((false, true))).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn serendipity_3d_value_rows_sum_to_one() {
        let table = &*CUBIC_HERMITE_SERENDIPITY_3D_TABLE;
        assert_eq!(table.matrix.len(), 32 * 64);
        let mut constant = 0.0;
        for (f, label) in table.labels.iter().enumerate() {
            if label.iter().all(|l| !l.1) {
                constant += table.entry(f, 0);
            }
        }
        // only node (0,0,0) contributes to the constant monomial
        assert_eq!(constant, 1.0);
    }

    #[test]
    fn lagrange_hermite_mixes() {
        let lh = &*LAGRANGE_HERMITE_TABLE;
        let row = |r: usize| &lh.matrix[3 * r..3 * r + 3];
        assert_eq!(eval_1d(row(0), 0.0), (1.0, -2.0));
        assert_eq!(eval_1d(row(2), 1.0), (0.0, 1.0));
        let hl = &*HERMITE_LAGRANGE_TABLE;
        assert_eq!(eval_1d(&hl.matrix[3..6], 0.0), (0.0, 1.0));
    }

    #[test]
    fn polygon_rows_wrap() {
        let table = polygon(3).unwrap();
        assert_eq!(table.functions, 4);
        assert_eq!(&table.matrix[..12], &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0, -1.0, -1.0, -1.0, 0.0, 0.0, 0.0]);
        let row1 = &table.matrix[12..24];
        assert_eq!(row1[6], 1.0);
        assert_eq!(row1[9], -1.0);
        assert_eq!(row1[11], 1.0);
        let row3 = &table.matrix[36..48];
        assert_eq!(row3[8], 1.0);
        assert_eq!(row3[11], -1.0);
        assert_eq!(row3[10], 1.0);
        assert!(polygon(usize::MAX / 2).is_err());
    }
}
