//! Memoized standard-basis values and derivatives at one xi location.
//!
//! The buffer holds one block per derivative order. Block `k` has
//! `dimension^k` sub-blocks of `S` values (one per standard function), one
//! for each sequence of derivative directions `(d_1, ..., d_k)`, with the
//! most recently applied direction varying slowest:
//! `index = ((d_k * dimension + d_(k-1)) * ... + d_1) * S + s`.
//! Higher orders are built from the preceding one on demand, so repeated
//! requests at the same point only pay for orders not yet computed.

use super::{StandardBasis, StandardBasisFunction, monomial};
use crate::basis_error::BasisError;
use crate::cache::InvalidateCache;
use crate::config::EvaluationConfig;

/// Per-call-site cache of standard function values; not shared across threads.
#[derive(Clone, Debug, Default)]
pub struct StandardBasisEvaluation {
    config: EvaluationConfig,
    basis: Option<StandardBasis>,
    xi: Vec<f64>,
    values: Vec<f64>,
    /// `order_offsets[k]..order_offsets[k + 1]` is the block for order `k`.
    order_offsets: Vec<usize>,
}

impl StandardBasisEvaluation {
    pub fn new() -> Self {
        Self::with_config(EvaluationConfig::default())
    }

    pub fn with_config(config: EvaluationConfig) -> Self {
        Self {
            config,
            basis: None,
            xi: Vec::new(),
            values: Vec::with_capacity(config.initial_capacity),
            order_offsets: Vec::new(),
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Highest derivative order currently held, if any.
    pub fn derivative_order_evaluated(&self) -> Option<usize> {
        self.order_offsets.len().checked_sub(2)
    }

    /// Values for derivative order `derivative_order` of `basis` at `xi`.
    ///
    /// Reuses cached data when the basis and point are unchanged; otherwise
    /// starts over from the function values.
    pub fn evaluate(
        &mut self,
        basis: &StandardBasis,
        xi: &[f64],
        derivative_order: usize,
    ) -> Result<&[f64], BasisError> {
        let limit = self.config.derivative_order_limit();
        if derivative_order > limit {
            log::warn!("derivative order {derivative_order} requested, limit is {limit}");
            return Err(BasisError::LimitExceeded {
                what: "derivative order",
                requested: derivative_order,
                limit,
            });
        }
        if xi.len() != basis.dimension() {
            return Err(BasisError::DimensionMismatch {
                expected: basis.dimension(),
                found: xi.len(),
            });
        }
        if derivative_order > 0 && basis.function() == StandardBasisFunction::Polygon {
            return Err(BasisError::unsupported_operation(
                "derivatives of polygon bases are not implemented; convert to simplex",
            ));
        }
        let cached = self.derivative_order_evaluated().is_some()
            && self.basis.as_ref() == Some(basis)
            && self.xi == xi;
        if !cached {
            self.evaluate_values(basis, xi)?;
        }
        while self.derivative_order_evaluated().unwrap_or(0) < derivative_order {
            self.evaluate_next_order()?;
        }
        Ok(self.block(derivative_order))
    }

    /// Previously computed block for `derivative_order`, if still cached.
    pub fn cached(&self, derivative_order: usize) -> Option<&[f64]> {
        (self.derivative_order_evaluated()? >= derivative_order).then(|| self.block(derivative_order))
    }

    fn block(&self, order: usize) -> &[f64] {
        &self.values[self.order_offsets[order]..self.order_offsets[order + 1]]
    }

    fn grow(&mut self, len: usize) -> Result<(), BasisError> {
        if len > self.values.capacity() {
            log::debug!(
                "standard basis evaluation buffer grows from {} to {len}",
                self.values.capacity()
            );
            self.values
                .try_reserve_exact(len - self.values.len())
                .map_err(|e| BasisError::OutOfMemory(format!("derivative buffer ({len}): {e}")))?;
        }
        self.values.resize(len, 0.0);
        Ok(())
    }

    fn evaluate_values(&mut self, basis: &StandardBasis, xi: &[f64]) -> Result<(), BasisError> {
        self.invalidate_cache();
        let count = basis.number_of_functions();
        self.grow(count)?;
        basis.evaluate_into(xi, &mut self.values)?;
        self.order_offsets = vec![0, count];
        self.basis = Some(basis.clone());
        self.xi.clear();
        self.xi.extend_from_slice(xi);
        Ok(())
    }

    fn evaluate_next_order(&mut self) -> Result<(), BasisError> {
        let Some(orders) = self.basis.as_ref().and_then(StandardBasis::monomial_orders) else {
            return Err(BasisError::unsupported_operation(
                "derivatives of polygon bases are not implemented",
            ));
        };
        let dimension = orders.len();
        let count = self.order_offsets[1];
        let order = self.order_offsets.len() - 2;
        let src_start = self.order_offsets[order];
        let src_len = self.order_offsets[order + 1] - src_start;
        let dest_start = self.order_offsets[order + 1];
        let dest_len = src_len * dimension;
        self.grow(dest_start + dest_len)?;
        log::trace!("computing derivative order {} from order {order}", order + 1);
        let (head, tail) = self.values.split_at_mut(dest_start);
        let src = &head[src_start..];
        for d in 0..dimension {
            for (sub, src_block) in src.chunks_exact(count).enumerate() {
                let start = d * src_len + sub * count;
                monomial::differentiate(&orders, d, src_block, &mut tail[start..start + count]);
            }
        }
        self.order_offsets.push(dest_start + dest_len);
        Ok(())
    }
}

impl InvalidateCache for StandardBasisEvaluation {
    fn invalidate_cache(&mut self) {
        self.order_offsets.clear();
        self.values.clear();
        self.basis = None;
        self.xi.clear();
    }
}
