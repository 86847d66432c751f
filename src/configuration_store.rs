//! Holder for the config specs a client evaluates against.
use std::sync::{Arc, RwLock};

use crate::specs::ConfigSpecs;

/// Config specs currently in effect for a [`Client`](crate::Client).
///
/// Documents are swapped whole. Evaluation works on an `Arc` snapshot, so a refresh never changes
/// specs under a running evaluation.
#[derive(Default)]
pub struct ConfigurationStore {
    current: RwLock<Option<Arc<ConfigSpecs>>>,
}

impl ConfigurationStore {
    pub fn new() -> Self {
        ConfigurationStore::default()
    }

    pub fn current(&self) -> Option<Arc<ConfigSpecs>> {
        // A poisoned lock reads as "no specs", and evaluation serves defaults.
        self.current.read().ok()?.clone()
    }

    /// Install `specs` regardless of what is currently held.
    pub fn install(&self, specs: ConfigSpecs) {
        let specs = Arc::new(specs);
        if let Ok(mut current) = self.current.write() {
            *current = Some(specs);
        }
    }

    /// Install `specs` if they report updates and are strictly newer than the current ones.
    ///
    /// Comparison and swap happen under one write lock, so an older document never replaces a
    /// newer one.
    pub fn install_if_newer(&self, specs: ConfigSpecs) -> bool {
        if !specs.has_updates {
            return false;
        }
        let Ok(mut current) = self.current.write() else {
            return false;
        };
        if current
            .as_ref()
            .is_some_and(|current| current.time >= specs.time)
        {
            return false;
        }
        *current = Some(Arc::new(specs));
        true
    }
}
