//! Configuration for evaluation caches and the basis registry.

use serde::{Deserialize, Serialize};

/// Hard ceiling on derivative order; bounds the geometric growth of the
/// value buffer (`dimension^order` derivative blocks per order).
pub const MAXIMUM_DERIVATIVE_ORDER: usize = 3;

/// Highest supported element dimension.
pub const MAXIMUM_ELEMENT_XI_DIMENSIONS: usize = 3;

/// Largest polygon vertex count; bounds the `4 * vertices` standard
/// functions per polygon and the packed argument encoding.
pub const MAXIMUM_POLYGON_VERTICES: usize = 256;

/// Settings for a [`StandardBasisEvaluation`](crate::standard::evaluation::StandardBasisEvaluation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Highest derivative order callers may request. Values above
    /// [`MAXIMUM_DERIVATIVE_ORDER`] are clamped to it.
    pub maximum_derivative_order: usize,
    /// Number of values to reserve up front.
    pub initial_capacity: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            maximum_derivative_order: MAXIMUM_DERIVATIVE_ORDER,
            initial_capacity: 64,
        }
    }
}

impl EvaluationConfig {
    /// Effective ceiling after clamping to the hard limit.
    pub fn derivative_order_limit(&self) -> usize {
        self.maximum_derivative_order.min(MAXIMUM_DERIVATIVE_ORDER)
    }
}

/// Settings for a [`BasisRegistry`](crate::registry::BasisRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Drop registry entries whose basis has no live handles whenever
    /// the registry is searched.
    pub purge_on_lookup: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            purge_on_lookup: true,
        }
    }
}
