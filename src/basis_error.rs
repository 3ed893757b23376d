//! BasisError: Unified error type for fe-basis public APIs
//!
//! This error type is used throughout the crate to provide non-panicking
//! error handling for basis construction, evaluation and transformation.
//! All failures are deterministic functions of the input; none are retried.

use thiserror::Error;

/// Unified error type for basis operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BasisError {
    /// The type descriptor is malformed or has inconsistent linkage.
    #[error("Invalid basis type: {0}")]
    InvalidBasisType(String),
    /// A buffer for the blending matrix or its metadata could not be allocated.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),
    /// A known gap, e.g. derivatives of a polygon basis.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// The coordinate map cannot be used to inherit the basis.
    #[error("Unsupported transformation: {0}")]
    UnsupportedTransformation(String),
    /// A request above a fixed safety ceiling.
    #[error("Limit exceeded: {what} {requested} > {limit}")]
    LimitExceeded {
        what: &'static str,
        requested: usize,
        limit: usize,
    },
    /// Caller supplied a slice of the wrong length.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// Caller supplied an index outside the valid range.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl BasisError {
    pub(crate) fn invalid_type(msg: impl Into<String>) -> Self {
        BasisError::InvalidBasisType(msg.into())
    }

    pub(crate) fn unsupported_transformation(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::warn!("basis transformation rejected: {msg}");
        BasisError::UnsupportedTransformation(msg)
    }

    pub(crate) fn unsupported_operation(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::warn!("basis operation rejected: {msg}");
        BasisError::UnsupportedOperation(msg)
    }
}

/// Allocate a zeroed buffer, mapping allocation failure to [`BasisError::OutOfMemory`].
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize, what: &str) -> Result<Vec<T>, BasisError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| BasisError::OutOfMemory(format!("{what} ({len} entries): {e}")))?;
    v.resize(len, T::default());
    Ok(v)
}
