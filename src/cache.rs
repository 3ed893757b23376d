//! Cache invalidation utilities shared across evaluation structures.

/// Anything that memoizes values derived from an evaluation point
/// (standard-basis values, nodal values, ...) should implement this.
pub trait InvalidateCache {
    /// Invalidate *all* internal caches so future queries recompute correctly.
    fn invalidate_cache(&mut self);
}

