#![cfg_attr(docsrs, feature(doc_cfg))]
//! # fe-basis
//!
//! fe-basis constructs and evaluates finite element basis functions over
//! reference elements: lines, squares, cubes, triangles, tetrahedra, wedges
//! and polygons, with mixed interpolation per xi coordinate.
//!
//! ## Overview
//! - [`BasisType`](basis_type::BasisType): validated type descriptor, the flat
//!   `[dimension, upper triangle]` array, with an EX-style text form
//!   (`"c.Hermite*l.simplex(3)*l.simplex"`).
//! - [`Basis`](basis::Basis): blending matrix from nodal functions onto a
//!   monomial or polygon [`StandardBasis`](standard::StandardBasis), with
//!   node and derivative labels for every nodal function.
//! - [`BasisRegistry`](registry::BasisRegistry): one shared basis per
//!   descriptor, handed out as reference-counted [`BasisHandle`](registry::BasisHandle)s.
//! - [`StandardBasisEvaluation`](standard::evaluation::StandardBasisEvaluation):
//!   per-point cache of standard function values and derivatives.
//! - [`transform_basis`](transform::transform_basis): restriction of a basis
//!   through an affine map, e.g. onto an element face.
//!
//! ## Usage
//! ```
//! use fe_basis::prelude::*;
//!
//! let registry = BasisRegistry::new();
//! let basis_type: BasisType = "l.Lagrange*l.Lagrange".parse()?;
//! let basis = registry.get_or_create(&basis_type)?;
//! let values = basis.evaluate(&[0.5, 0.5], 0)?;
//! assert_eq!(values, vec![0.25; 4]);
//! # Ok::<(), BasisError>(())
//! ```
//!
//! ## Invariant checking
//! Constructed bases validate their invariants in debug builds; enable the
//! `check-invariants` feature to keep the checks in release builds.
//!
//! ## Logging
//! The crate logs through the [`log`] facade and never installs a logger.

pub mod basis;
pub mod basis_error;
pub mod basis_type;
pub(crate) mod blending;
pub mod cache;
pub mod config;
pub mod debug_invariants;
pub mod registry;
pub mod standard;
pub mod theta;
pub mod transform;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::basis::Basis;
    pub use crate::basis_error::BasisError;
    pub use crate::basis_type::{BasisFunctionType, BasisType, LinkedGroup, NO_RELATION};
    pub use crate::cache::InvalidateCache;
    pub use crate::config::{EvaluationConfig, RegistryConfig};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::registry::{BasisHandle, BasisRegistry};
    pub use crate::standard::evaluation::StandardBasisEvaluation;
    pub use crate::standard::polygon::PackedArgument;
    pub use crate::standard::{StandardBasis, StandardBasisFunction};
    pub use crate::theta::ModifyThetaMode;
    pub use crate::transform::{AffineMap, BasisTransformation, transform_basis};
}
