//! Loader registry
//!
//! The resolver's only interaction with batching: a fire-and-forget
//! registration of association query targets. A batching layer drains the
//! registry and coalesces entries sharing a fingerprint into one fetch; that
//! algorithm lives outside this crate.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::query::ModelQuery;
use crate::resolver::LoaderFn;

/// One recorded registration: the target table and the canonical grouping
/// key (table + origin + ordered predicates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderEntry {
    pub table: String,
    pub fingerprint: String,
}

/// A request-scoped registry of association fetches.
#[derive(Debug, Default)]
pub struct Loaders {
    entries: Mutex<Vec<LoaderEntry>>,
}

impl Loaders {
    /// Record a query target. Never fails and never fetches.
    pub fn register(&self, query: &ModelQuery) {
        let entry = LoaderEntry {
            table: query.table().to_string(),
            fingerprint: query.fingerprint(),
        };
        tracing::debug!(
            table = %entry.table,
            fingerprint = %entry.fingerprint,
            "registered association fetch"
        );
        self.entries.lock().push(entry);
    }

    /// Drain everything recorded so far, in registration order.
    pub fn take(&self) -> Vec<LoaderEntry> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Adapt the registry into the hook shape the resolver builder accepts.
    pub fn hook(self: &Arc<Self>) -> LoaderFn {
        let registry = Arc::clone(self);
        Arc::new(move |query| registry.register(query))
    }
}

/// A fresh registry, typically created once per request.
pub fn loaders() -> Arc<Loaders> {
    Arc::new(Loaders::default())
}
