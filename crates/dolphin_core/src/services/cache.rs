//! Metadata cache for schema tree children.
//!
//! Provides:
//! - Child lists keyed by node identity, with point and prefix invalidation
//! - Expansion state, kept apart from the child lists
//! - Single-flight loading so concurrent first expansions share one query

use crate::error::DolphinError;
use crate::models::NodeIdentity;
use crate::nodes::SchemaNode;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Result shared by every waiter of one load.
pub type LoadResult = Result<Vec<SchemaNode>, Arc<DolphinError>>;

struct InFlight {
    /// Distinguishes this load from a newer one for the same identity
    id: Uuid,
    load: Shared<BoxFuture<'static, LoadResult>>,
}

/// Child lists and expansion state for the schema tree.
#[derive(Default)]
pub struct MetadataCache {
    /// Child lists by identity
    entries: RwLock<HashMap<NodeIdentity, Vec<SchemaNode>>>,
    /// Expanded flags by identity
    expansion: RwLock<HashMap<NodeIdentity, bool>>,
    /// Loads currently running, by identity
    in_flight: Mutex<HashMap<NodeIdentity, InFlight>>,
}

impl MetadataCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached children for `identity`.
    pub fn get(&self, identity: &NodeIdentity) -> Option<Vec<SchemaNode>> {
        self.entries.read().get(identity).cloned()
    }

    /// Store children for `identity`, replacing any previous list.
    pub fn put(&self, identity: NodeIdentity, children: Vec<SchemaNode>) {
        tracing::trace!(identity = %identity, count = children.len(), "Caching children");
        self.entries.write().insert(identity, children);
    }

    /// Drop the entry for exactly `identity`.
    ///
    /// Returns whether an entry was removed. A load still running for the
    /// identity will not store its result.
    pub fn invalidate(&self, identity: &NodeIdentity) -> bool {
        let mut in_flight = self.in_flight.lock();
        in_flight.remove(identity);
        let removed = self.entries.write().remove(identity).is_some();
        if removed {
            tracing::debug!(identity = %identity, "Invalidated cache entry");
        } else {
            tracing::trace!(identity = %identity, "Nothing cached to invalidate");
        }
        removed
    }

    /// Drop every entry strictly below `scope`.
    ///
    /// The entry for `scope` itself is kept. Returns the number of entries
    /// removed.
    pub fn invalidate_prefix(&self, scope: &NodeIdentity) -> usize {
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|identity, _| !identity.is_within(scope));
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|identity, _| !identity.is_within(scope));
        let removed = before - entries.len();
        tracing::debug!(scope = %scope, removed, "Invalidated cache prefix");
        removed
    }

    /// Whether the node was last left expanded. Defaults to collapsed.
    pub fn expansion_state(&self, identity: &NodeIdentity) -> bool {
        self.expansion.read().get(identity).copied().unwrap_or(false)
    }

    /// Record whether the node is expanded.
    pub fn set_expansion_state(&self, identity: NodeIdentity, expanded: bool) {
        self.expansion.write().insert(identity, expanded);
    }

    /// Drop all child lists. Expansion state survives.
    pub fn clear(&self) {
        let mut in_flight = self.in_flight.lock();
        in_flight.clear();
        self.entries.write().clear();
    }

    /// Drop everything, including expansion state.
    pub fn reset(&self) {
        self.clear();
        self.expansion.write().clear();
    }

    /// Number of cached child lists.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no child lists are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Children for `identity`, loading them with `loader` on a miss.
    ///
    /// With `force_refresh` the cached list is ignored and reloaded. Callers
    /// that arrive while a load for the same identity is running wait for
    /// that load instead of starting their own. Failed loads are not cached.
    pub async fn load_children<F>(
        self: &Arc<Self>,
        identity: &NodeIdentity,
        force_refresh: bool,
        loader: F,
    ) -> LoadResult
    where
        F: Future<Output = Result<Vec<SchemaNode>, DolphinError>> + Send + 'static,
    {
        if !force_refresh {
            if let Some(children) = self.get(identity) {
                return Ok(children);
            }
        }

        let load = {
            let mut in_flight = self.in_flight.lock();
            if !force_refresh {
                if let Some(children) = self.get(identity) {
                    return Ok(children);
                }
            }
            match in_flight.get(identity) {
                Some(pending) => {
                    tracing::trace!(identity = %identity, "Joining running load");
                    pending.load.clone()
                }
                None => {
                    let id = Uuid::new_v4();
                    let load = self.spawn_load(id, identity.clone(), loader);
                    in_flight.insert(identity.clone(), InFlight { id, load: load.clone() });
                    load
                }
            }
        };

        load.await
    }

    fn spawn_load<F>(
        self: &Arc<Self>,
        id: Uuid,
        identity: NodeIdentity,
        loader: F,
    ) -> Shared<BoxFuture<'static, LoadResult>>
    where
        F: Future<Output = Result<Vec<SchemaNode>, DolphinError>> + Send + 'static,
    {
        let cache: Weak<Self> = Arc::downgrade(self);
        async move {
            tracing::debug!(identity = %identity, "Loading children");
            let result = loader.await.map_err(Arc::new);
            if let Some(cache) = cache.upgrade() {
                cache.finish(id, identity, &result);
            }
            result
        }
        .boxed()
        .shared()
    }

    /// Settle a load. The result is stored only while the load is still the
    /// current one for its identity.
    fn finish(&self, id: Uuid, identity: NodeIdentity, result: &LoadResult) {
        let mut in_flight = self.in_flight.lock();
        let current = in_flight.get(&identity).is_some_and(|pending| pending.id == id);
        if !current {
            tracing::debug!(identity = %identity, "Discarding superseded load");
            return;
        }
        in_flight.remove(&identity);
        if let Ok(children) = result {
            self.entries.write().insert(identity, children.clone());
        }
    }
}
