//! Index algebra for blending matrices: Kronecker products, label splicing
//! and mixed-radix column permutation.
//!
//! All matrices are row-major with `rows x columns` entries. Within a
//! tensor product the newly added factor always varies slowest, in rows and
//! in columns.

use crate::basis_error::{BasisError, try_zeroed};
use crate::config::MAXIMUM_ELEMENT_XI_DIMENSIONS;

/// Node index and derivative flag of one nodal function along each xi.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct FunctionLabel {
    pub node: [usize; MAXIMUM_ELEMENT_XI_DIMENSIONS],
    pub derivative: [bool; MAXIMUM_ELEMENT_XI_DIMENSIONS],
}

impl FunctionLabel {
    /// Bit `j` set when the function carries a derivative in xi `j + 1`.
    pub fn derivative_mask(&self) -> u32 {
        self.derivative
            .iter()
            .enumerate()
            .filter(|(_, d)| **d)
            .map(|(j, _)| 1u32 << j)
            .sum()
    }

    /// Sort key: xi_N node most significant, derivative mask least.
    pub fn sort_key(&self, dimension: usize) -> (Vec<usize>, u32) {
        let nodes = self.node[..dimension].iter().rev().copied().collect();
        (nodes, self.derivative_mask())
    }
}

/// `add (ra x ca) ⊗ prev (rp x cp)`: entry
/// `[(i * rp + j), (k * cp + l)] = add[i][k] * prev[j][l]`.
pub(crate) fn kronecker(
    add: &[f64],
    (add_rows, add_cols): (usize, usize),
    prev: &[f64],
    (prev_rows, prev_cols): (usize, usize),
) -> Result<Vec<f64>, BasisError> {
    let (cols, len) = add_cols
        .checked_mul(prev_cols)
        .and_then(|cols| Some((cols, add_rows.checked_mul(prev_rows)?.checked_mul(cols)?)))
        .ok_or_else(|| BasisError::invalid_type("blending matrix tensor product is too large"))?;
    let mut out = try_zeroed(len, "blending matrix tensor product")?;
    for i in 0..add_rows {
        for j in 0..prev_rows {
            let row = &mut out[(i * prev_rows + j) * cols..(i * prev_rows + j + 1) * cols];
            for k in 0..add_cols {
                let a = add[i * add_cols + k];
                if a == 0.0 {
                    continue;
                }
                let prev_row = &prev[j * prev_cols..(j + 1) * prev_cols];
                for (dst, &p) in row[k * prev_cols..(k + 1) * prev_cols].iter_mut().zip(prev_row) {
                    *dst = a * p;
                }
            }
        }
    }
    Ok(out)
}

/// Labels of `add ⊗ prev`: every previous label repeated per added row,
/// with the added unit's `(node, derivative)` written to its xi slots.
pub(crate) fn splice_labels(
    add: &[Vec<(usize, bool)>],
    xis: &[usize],
    prev: &[FunctionLabel],
) -> Vec<FunctionLabel> {
    let mut out = Vec::with_capacity(add.len() * prev.len());
    for unit_label in add {
        for p in prev {
            let mut label = *p;
            for (&xi, &(node, derivative)) in xis.iter().zip(unit_label) {
                label.node[xi] = node;
                label.derivative[xi] = derivative;
            }
            out.push(label);
        }
    }
    out
}

/// Strides of a mixed-radix index whose first digit varies fastest.
pub(crate) fn strides(radices: &[usize]) -> Vec<usize> {
    let mut acc = 1;
    radices
        .iter()
        .map(|&r| {
            let s = acc;
            acc *= r;
            s
        })
        .collect()
}

/// Map from each column of a mixed-radix layout in `scan` order (digit `p`
/// belongs to xi `scan[p]`, radix `radices[p]`) to its column once the
/// digits are reordered by increasing xi.
pub(crate) fn column_permutation(scan: &[usize], radices: &[usize]) -> Vec<usize> {
    let total: usize = radices.iter().product();
    let old_strides = strides(radices);
    let mut by_xi = vec![1; scan.len()];
    for (p, &xi) in scan.iter().enumerate() {
        by_xi[xi] = radices[p];
    }
    let new_strides = strides(&by_xi);
    (0..total)
        .map(|column| {
            scan.iter()
                .enumerate()
                .map(|(p, &xi)| (column / old_strides[p]) % radices[p] * new_strides[xi])
                .sum()
        })
        .collect()
}

/// Move column `c` of a `rows x cols` matrix to column `permutation[c]`.
pub(crate) fn permute_columns(
    matrix: &[f64],
    rows: usize,
    cols: usize,
    permutation: &[usize],
) -> Result<Vec<f64>, BasisError> {
    let mut out = try_zeroed(rows * cols, "reordered blending matrix")?;
    for r in 0..rows {
        for (c, &to) in permutation.iter().enumerate() {
            out[r * cols + to] = matrix[r * cols + c];
        }
    }
    Ok(out)
}

/// Dense matrix product `a (n x m) * b (m x p)`.
pub(crate) fn multiply(
    a: &[f64],
    (n, m): (usize, usize),
    b: &[f64],
    p: usize,
) -> Result<Vec<f64>, BasisError> {
    let mut out = try_zeroed(n * p, "matrix product")?;
    for i in 0..n {
        for k in 0..m {
            let aik = a[i * m + k];
            if aik == 0.0 {
                continue;
            }
            for (dst, &bkj) in out[i * p..(i + 1) * p].iter_mut().zip(&b[k * p..(k + 1) * p]) {
                *dst += aik * bkj;
            }
        }
    }
    Ok(out)
}
