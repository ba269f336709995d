//! # Feature registry.
//!
//! Named capability probes ("is this optional facility usable in this
//! process?"). A probe runs at most once, on first query, and its answer is
//! cached for the life of the process.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

type Probe = Box<dyn Fn() -> bool + Send + Sync>;

struct Feature {
    probe: Probe,
    cached: OnceLock<bool>,
}

/// Registry of lazily evaluated feature probes.
#[derive(Default)]
pub struct Features {
    entries: RwLock<BTreeMap<String, Arc<Feature>>>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a probe under `name`.
    pub fn add<F>(&self, name: impl Into<String>, probe: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        let feature = Arc::new(Feature {
            probe: Box::new(probe),
            cached: OnceLock::new(),
        });
        self.entries.write().insert(name.into(), feature);
    }

    /// Whether `name` is registered and its probe answered `true`.
    ///
    /// The probe runs outside the registry lock.
    pub fn is_available(&self, name: &str) -> bool {
        let Some(feature) = self.entries.read().get(name).cloned() else {
            return false;
        };
        *feature.cached.get_or_init(|| (feature.probe)())
    }

    /// Registered feature names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for Features {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Features")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn probe_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let features = Features::new();
        let c = calls.clone();
        features.add("syslog", move || {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert!(features.is_available("syslog"));
        assert!(features.is_available("syslog"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_features_are_unavailable() {
        let features = Features::new();
        features.add("rails", || false);
        assert!(!features.is_available("rails"));
        assert!(!features.is_available("ldap"));
        assert_eq!(features.names(), vec!["rails".to_string()]);
    }
}
