//! Scope-owned registry handing out one shared [`Basis`] per [`BasisType`].
//!
//! Entries hold weak references, so a basis lives exactly as long as some
//! [`BasisHandle`] to it does. Lookup-or-insert runs under a single mutex;
//! construction is rare and cached afterwards.

use crate::basis::Basis;
use crate::basis_error::BasisError;
use crate::basis_type::BasisType;
use crate::config::RegistryConfig;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Shared, immutable reference to a registered basis.
#[derive(Clone)]
pub struct BasisHandle(Arc<Basis>);

impl BasisHandle {
    /// Number of live handles to this basis.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// True when both handles refer to the same basis object.
    pub fn ptr_eq(&self, other: &BasisHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for BasisHandle {
    type Target = Basis;

    fn deref(&self) -> &Basis {
        &self.0
    }
}

impl fmt::Debug for BasisHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasisHandle")
            .field("basis_type", &self.0.basis_type().to_string())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

/// Deduplicating store of bases keyed by type descriptor.
#[derive(Default)]
pub struct BasisRegistry {
    config: RegistryConfig,
    entries: Mutex<BTreeMap<BasisType, Weak<Basis>>>,
}

impl BasisRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The registered basis for `basis_type`, constructing and registering
    /// it first if no live one exists. A failed construction leaves the
    /// registry unchanged.
    pub fn get_or_create(&self, basis_type: &BasisType) -> Result<BasisHandle, BasisError> {
        let mut entries = self.entries.lock();
        if self.config.purge_on_lookup {
            entries.retain(|_, weak| weak.strong_count() > 0);
        }
        if let Some(basis) = entries.get(basis_type).and_then(Weak::upgrade) {
            log::debug!("reusing registered basis {basis_type}");
            return Ok(BasisHandle(basis));
        }
        let basis = Arc::new(Basis::new(basis_type.clone())?);
        entries.insert(basis_type.clone(), Arc::downgrade(&basis));
        log::debug!(
            "registered basis {basis_type} ({} live entries)",
            entries.len()
        );
        Ok(BasisHandle(basis))
    }

    /// The registered basis for `basis_type`, if one is alive.
    pub fn find(&self, basis_type: &BasisType) -> Option<BasisHandle> {
        let mut entries = self.entries.lock();
        if self.config.purge_on_lookup {
            entries.retain(|_, weak| weak.strong_count() > 0);
        }
        entries.get(basis_type).and_then(Weak::upgrade).map(BasisHandle)
    }

    /// Number of entries whose basis is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose basis has been released; returns how many.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Basis with every Hermite-family coordinate replaced by linear
    /// Lagrange, registered alongside `basis`. Returns `basis` itself when
    /// it has no Hermite coordinates.
    pub fn connectivity_basis(&self, basis: &BasisHandle) -> Result<BasisHandle, BasisError> {
        match basis.basis_type().to_connectivity_type()? {
            Some(connectivity) => self.get_or_create(&connectivity),
            None => Ok(basis.clone()),
        }
    }
}

impl fmt::Debug for BasisRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("BasisRegistry")
            .field("config", &self.config)
            .field("entries", &entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_construction_is_not_registered() {
        let registry = BasisRegistry::new();
        // polygon without its radial partner: construction fails
        let bad = BasisType::from_array(&[1, 11]);
        if let Ok(bad) = bad {
            assert!(registry.get_or_create(&bad).is_err());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn entries_expire_with_their_handles() {
        let registry = BasisRegistry::with_config(RegistryConfig {
            purge_on_lookup: false,
        });
        let t: BasisType = "q.Lagrange".parse().unwrap();
        let handle = registry.get_or_create(&t).unwrap();
        assert_eq!(registry.len(), 1);
        drop(handle);
        assert_eq!(registry.len(), 0);
        assert!(registry.find(&t).is_none());
        assert_eq!(registry.purge(), 1);
        assert_eq!(registry.purge(), 0);
    }
}
