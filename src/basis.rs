//! The constructed basis: blending matrix, standard basis and per-function
//! node/derivative metadata for one [`BasisType`].
//!
//! Nodal functions are sorted so that all functions of a local node are
//! contiguous, with the node index varying slowest and the derivative
//! label fastest. Row `f` of the blending matrix expresses nodal function
//! `f` in terms of the standard functions.

use crate::basis_error::{BasisError, try_zeroed};
use crate::basis_type::BasisType;
use crate::blending;
use crate::blending::tensor;
use crate::debug_invariants::DebugInvariants;
use crate::standard::StandardBasis;
use crate::standard::evaluation::StandardBasisEvaluation;
use serde::Serialize;

/// An immutable finite element basis.
#[derive(Clone, Debug, Serialize)]
pub struct Basis {
    basis_type: BasisType,
    number_of_functions: usize,
    number_of_standard_functions: usize,
    blending_matrix: Vec<f64>,
    column_sizes: Vec<usize>,
    function_nodes: Vec<usize>,
    function_derivatives: Vec<u32>,
    /// First function of each node, plus a trailing `number_of_functions`.
    node_starts: Vec<usize>,
    standard_basis: StandardBasis,
}

impl Basis {
    /// Build the basis for `basis_type`.
    pub fn new(basis_type: BasisType) -> Result<Self, BasisError> {
        let blending = blending::construct(&basis_type)?;
        let mut node_starts = Vec::new();
        for (f, &node) in blending.function_nodes.iter().enumerate() {
            if node_starts.len() == node {
                node_starts.push(f);
            }
        }
        node_starts.push(blending.number_of_functions);
        let basis = Self {
            basis_type,
            number_of_functions: blending.number_of_functions,
            number_of_standard_functions: blending.number_of_standard_functions,
            blending_matrix: blending.matrix,
            column_sizes: blending.column_sizes,
            function_nodes: blending.function_nodes,
            function_derivatives: blending.function_derivatives,
            node_starts,
            standard_basis: blending.standard_basis,
        };
        crate::debug_invariants!(basis.validate_invariants(), "Basis::new");
        Ok(basis)
    }

    #[inline]
    pub fn basis_type(&self) -> &BasisType {
        &self.basis_type
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.basis_type.dimension()
    }

    /// Number of nodal (parameter) functions, the rows of the blending matrix.
    #[inline]
    pub fn number_of_functions(&self) -> usize {
        self.number_of_functions
    }

    /// Number of standard functions, the columns of the blending matrix.
    #[inline]
    pub fn number_of_standard_functions(&self) -> usize {
        self.number_of_standard_functions
    }

    #[inline]
    pub fn standard_basis(&self) -> &StandardBasis {
        &self.standard_basis
    }

    /// Row-major `functions x standard functions` blending matrix.
    #[inline]
    pub fn blending_matrix(&self) -> &[f64] {
        &self.blending_matrix
    }

    /// For each standard function, one past the last row with a non-zero
    /// blending coefficient.
    #[inline]
    pub fn blending_column_sizes(&self) -> &[usize] {
        &self.column_sizes
    }

    /// Local node of every nodal function, non-decreasing.
    #[inline]
    pub fn function_nodes(&self) -> &[usize] {
        &self.function_nodes
    }

    /// Derivative bitmask of every nodal function; 0 for plain values.
    #[inline]
    pub fn function_derivatives(&self) -> &[u32] {
        &self.function_derivatives
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_starts.len() - 1
    }

    fn check_function(&self, function: usize) -> Result<(), BasisError> {
        if function >= self.number_of_functions {
            return Err(BasisError::IndexOutOfRange {
                what: "function",
                index: function,
                len: self.number_of_functions,
            });
        }
        Ok(())
    }

    fn node_range(&self, node: usize) -> Result<std::ops::Range<usize>, BasisError> {
        if node >= self.node_count() {
            return Err(BasisError::IndexOutOfRange {
                what: "node",
                index: node,
                len: self.node_count(),
            });
        }
        Ok(self.node_starts[node]..self.node_starts[node + 1])
    }

    pub fn functions_per_node(&self, node: usize) -> Result<usize, BasisError> {
        Ok(self.node_range(node)?.len())
    }

    /// Local node of nodal function `function`.
    pub fn function_node(&self, function: usize) -> Result<usize, BasisError> {
        self.check_function(function)?;
        Ok(self.function_nodes[function])
    }

    /// Derivative bitmask of `function`: bit `j` set for a derivative in xi `j + 1`.
    pub fn function_derivative(&self, function: usize) -> Result<u32, BasisError> {
        self.check_function(function)?;
        Ok(self.function_derivatives[function])
    }

    /// Function carrying derivative `derivative` at `node`, if the node has one.
    pub fn function_number_from_node_and_derivative(
        &self,
        node: usize,
        derivative: u32,
    ) -> Result<Option<usize>, BasisError> {
        Ok(self
            .node_range(node)?
            .find(|&f| self.function_derivatives[f] == derivative))
    }

    /// Function number of the `index`-th function of `node`.
    pub fn function_number_from_node_function(
        &self,
        node: usize,
        index: usize,
    ) -> Result<usize, BasisError> {
        let range = self.node_range(node)?;
        if index >= range.len() {
            return Err(BasisError::IndexOutOfRange {
                what: "node function",
                index,
                len: range.len(),
            });
        }
        Ok(range.start + index)
    }

    /// One past the last function of the node that owns `function`.
    pub fn node_function_number_limit(&self, function: usize) -> Result<usize, BasisError> {
        let node = self.function_node(function)?;
        Ok(self.node_starts[node + 1])
    }

    /// Apply the blending matrix to per-function element values:
    /// `blended[s] = sum_f raw[f] * B[f][s]`.
    pub fn blend_raw_element_values(&self, raw: &[f64]) -> Result<Vec<f64>, BasisError> {
        if raw.len() != self.number_of_functions {
            return Err(BasisError::DimensionMismatch {
                expected: self.number_of_functions,
                found: raw.len(),
            });
        }
        let s_count = self.number_of_standard_functions;
        let mut blended = try_zeroed(s_count, "blended element values")?;
        for (s, out) in blended.iter_mut().enumerate() {
            *out = raw[..self.column_sizes[s]]
                .iter()
                .enumerate()
                .map(|(f, r)| r * self.blending_matrix[f * s_count + s])
                .sum();
        }
        Ok(blended)
    }

    /// Blending matrix times a standard-function transformation
    /// (`standard functions x inherited_count`), giving the map from nodal
    /// functions directly to the inherited standard functions.
    pub fn combined_blending_matrix(
        &self,
        transformation: &[f64],
        inherited_count: usize,
    ) -> Result<Vec<f64>, BasisError> {
        let expected = self.number_of_standard_functions * inherited_count;
        if inherited_count == 0 || transformation.len() != expected {
            return Err(BasisError::DimensionMismatch {
                expected,
                found: transformation.len(),
            });
        }
        tensor::multiply(
            &self.blending_matrix,
            (self.number_of_functions, self.number_of_standard_functions),
            transformation,
            inherited_count,
        )
    }

    /// Nodal function values (or derivatives of order `derivative_order`)
    /// at `xi`, using a throwaway evaluation cache.
    pub fn evaluate(&self, xi: &[f64], derivative_order: usize) -> Result<Vec<f64>, BasisError> {
        self.evaluate_with(&mut StandardBasisEvaluation::new(), xi, derivative_order)
    }

    /// As [`evaluate`](Self::evaluate), reusing `cache` for the standard
    /// functions. The result holds `dimension^order` blocks of
    /// [`number_of_functions`](Self::number_of_functions) values laid out
    /// like the cache's derivative blocks.
    pub fn evaluate_with(
        &self,
        cache: &mut StandardBasisEvaluation,
        xi: &[f64],
        derivative_order: usize,
    ) -> Result<Vec<f64>, BasisError> {
        let standard = cache.evaluate(&self.standard_basis, xi, derivative_order)?;
        let s_count = self.number_of_standard_functions;
        let blocks = standard.len() / s_count;
        let n = self.number_of_functions;
        let mut values = try_zeroed(blocks * n, "nodal function values")?;
        for (block, std_block) in standard.chunks_exact(s_count).enumerate() {
            for f in 0..n {
                let row = &self.blending_matrix[f * s_count..(f + 1) * s_count];
                values[block * n + f] = row.iter().zip(std_block).map(|(b, s)| b * s).sum();
            }
        }
        Ok(values)
    }
}

impl DebugInvariants for Basis {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Basis");
    }

    fn validate_invariants(&self) -> Result<(), BasisError> {
        let (n, s) = (self.number_of_functions, self.number_of_standard_functions);
        if n == 0 || n > s {
            return Err(BasisError::invalid_type(format!(
                "{n} functions over {s} standard functions"
            )));
        }
        if self.blending_matrix.len() != n * s {
            return Err(BasisError::DimensionMismatch {
                expected: n * s,
                found: self.blending_matrix.len(),
            });
        }
        if self.column_sizes.len() != s || self.standard_basis.number_of_functions() != s {
            return Err(BasisError::invalid_type("standard function count mismatch"));
        }
        for (c, &size) in self.column_sizes.iter().enumerate() {
            let last = (0..n).rev().find(|&f| self.blending_matrix[f * s + c] != 0.0);
            if size != last.map_or(0, |f| f + 1) {
                return Err(BasisError::invalid_type(format!(
                    "column {c} extent {size} does not match the matrix"
                )));
            }
        }
        if self.function_nodes.first() != Some(&0)
            || self
                .function_nodes
                .windows(2)
                .any(|w| w[1] != w[0] && w[1] != w[0] + 1)
        {
            return Err(BasisError::invalid_type("node numbers are not contiguous"));
        }
        for node in 0..self.node_count() {
            let derivatives = &self.function_derivatives[self.node_range(node)?];
            if derivatives.windows(2).any(|w| w[0] >= w[1]) {
                return Err(BasisError::invalid_type(format!(
                    "derivative labels of node {node} are not increasing"
                )));
            }
        }
        Ok(())
    }
}
