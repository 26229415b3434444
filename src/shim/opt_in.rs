//! Opt-in state owned by the host.
//!
//! The engine never mutates opt-ins. The host records a choice here and
//! hands out immutable snapshots, so a request that is already being
//! evaluated keeps seeing the set it started with.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::shim::errors::UnknownShimError;
use crate::shim::registry::ShimRegistry;

/// Set of shim ids the user has opted into.
#[derive(Debug, Default)]
pub struct OptInSet {
    current: RwLock<Arc<BTreeSet<String>>>,
}

impl OptInSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the set from saved ids, keeping only those the registry knows.
    pub fn restore<I, S>(registry: &ShimRegistry, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = OptInSet::new();
        for id in ids {
            if let Err(err) = set.opt_in(registry, id.as_ref()) {
                tracing::warn!("dropping saved opt-in: {}", err);
            }
        }
        set
    }

    /// Current ids. The snapshot is unaffected by later changes.
    pub fn snapshot(&self) -> Arc<BTreeSet<String>> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Record an opt-in. Only registered shims can be opted into.
    pub fn opt_in(&self, registry: &ShimRegistry, id: &str) -> Result<(), UnknownShimError> {
        registry.require(id)?;
        let changed = self.update(|ids| ids.insert(id.to_string()));
        if changed {
            tracing::info!("opted into shim `{}`", id);
        }
        Ok(())
    }

    /// Remove an opt-in. Returns whether the id was present.
    pub fn opt_out(&self, id: &str) -> bool {
        let removed = self.update(|ids| ids.remove(id));
        if removed {
            tracing::info!("opted out of shim `{}`", id);
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains(id)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Copy-on-write update; readers holding a snapshot are not disturbed.
    fn update(&self, f: impl FnOnce(&mut BTreeSet<String>) -> bool) -> bool {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next: BTreeSet<String> = (**guard).clone();
        let changed = f(&mut next);
        if changed {
            *guard = Arc::new(next);
        }
        changed
    }
}
