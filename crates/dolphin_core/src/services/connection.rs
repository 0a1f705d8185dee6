//! Connection registry keyed by descriptor identity.
//!
//! Provides:
//! - Create-on-demand and reuse of one live handle per descriptor identity
//! - Forced replacement that retires, but does not interrupt, the prior handle
//! - Per-identity serialisation of connection attempts

use crate::error::DolphinError;
use crate::models::{ConnectionDescriptor, NodeIdentity, Row};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A live driver session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run one statement and return its rows.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DolphinError>;

    /// Release the session's resources.
    async fn close(&self);
}

/// Opens sessions for descriptors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open and validate a new session.
    async fn connect(&self, descriptor: &ConnectionDescriptor)
        -> Result<Arc<dyn Session>, DolphinError>;
}

/// A live connection handed out by the registry.
pub struct ConnectionHandle {
    /// Unique identifier of this handle
    id: Uuid,
    /// Descriptor identity the handle was opened for
    identity: NodeIdentity,
    /// Driver session
    session: Arc<dyn Session>,
    /// Set once the registry has replaced this handle
    retired: AtomicBool,
    /// When this handle was opened
    opened_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Wrap an open session.
    pub fn new(identity: NodeIdentity, session: Arc<dyn Session>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            session,
            retired: AtomicBool::new(false),
            opened_at: Utc::now(),
        }
    }

    /// Get the handle's unique identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the descriptor identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Get when this handle was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Whether a newer handle has replaced this one.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    /// Run a statement on this handle.
    ///
    /// Statements already running when the handle is retired finish normally;
    /// new statements on a retired handle fail.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>, DolphinError> {
        if self.is_retired() {
            return Err(DolphinError::connection(
                self.identity.as_str(),
                "Connection handle was replaced by a newer connection",
            ));
        }
        self.session.query(sql).await.map_err(|e| e.with_identity(self.identity.as_str()))
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<Arc<ConnectionHandle>>>>;
type SlotGuard = tokio::sync::OwnedMutexGuard<Option<Arc<ConnectionHandle>>>;

/// Owns live connection handles keyed by descriptor identity.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    slots: Mutex<HashMap<NodeIdentity, Slot>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector, slots: Mutex::new(HashMap::new()) }
    }

    fn slot(&self, identity: &NodeIdentity) -> Slot {
        self.slots.lock().entry(identity.clone()).or_default().clone()
    }

    fn is_registered(&self, identity: &NodeIdentity, slot: &Slot) -> bool {
        self.slots.lock().get(identity).is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Remove `slot` from the map. The caller must hold the slot's lock.
    fn unregister(&self, identity: &NodeIdentity, slot: &Slot) {
        let mut slots = self.slots.lock();
        if slots.get(identity).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(identity);
        }
    }

    /// Lock the registered slot for `identity`.
    ///
    /// A slot is only removed from the map by a holder of its lock, so a slot
    /// that is still registered once locked stays registered until released.
    async fn lock_slot(&self, identity: &NodeIdentity) -> (Slot, SlotGuard) {
        loop {
            let slot = self.slot(identity);
            let guard = Arc::clone(&slot).lock_owned().await;
            if self.is_registered(identity, &slot) {
                return (slot, guard);
            }
            tracing::trace!(identity = %identity, "Slot removed while waiting, retrying");
        }
    }

    /// Get the live handle for a descriptor, opening one if needed.
    ///
    /// With `force_new`, a new handle is always opened and replaces the
    /// current one. On failure the registry is left unchanged.
    pub async fn get_connection(
        &self,
        descriptor: &ConnectionDescriptor,
        force_new: bool,
    ) -> Result<Arc<ConnectionHandle>, DolphinError> {
        let identity = descriptor.identity();
        let (slot, mut current) = self.lock_slot(&identity).await;

        if !force_new {
            if let Some(handle) = current.as_ref() {
                tracing::trace!(identity = %identity, handle_id = %handle.id(), "Reusing connection");
                return Ok(handle.clone());
            }
        }

        tracing::debug!(identity = %identity, force_new, "Opening connection");
        let session = match self.connector.connect(descriptor).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "Connection failed");
                if current.is_none() {
                    self.unregister(&identity, &slot);
                }
                return Err(e.with_identity(identity.as_str()));
            }
        };

        let handle = Arc::new(ConnectionHandle::new(identity.clone(), session));
        if let Some(previous) = current.replace(handle.clone()) {
            previous.retire();
            tracing::debug!(
                identity = %identity,
                previous_id = %previous.id(),
                handle_id = %handle.id(),
                "Replaced connection"
            );
        }
        Ok(handle)
    }

    /// Whether a live handle exists for the identity.
    pub fn contains(&self, identity: &NodeIdentity) -> bool {
        self.slots
            .lock()
            .get(identity)
            .and_then(|slot| slot.try_lock().ok().map(|h| h.is_some()))
            .unwrap_or(false)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.try_lock().map(|h| h.is_some()).unwrap_or(false))
            .count()
    }

    /// Whether the registry holds no live handles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handle.
    ///
    /// Holders of a handle keep it until they finish; it is retired so it
    /// accepts no further statements. Connection attempts racing the reset
    /// either finish first and have their handle retired, or start over on a
    /// fresh slot.
    pub async fn reset(&self) {
        let registered: Vec<(NodeIdentity, Slot)> = self
            .slots
            .lock()
            .iter()
            .map(|(identity, slot)| (identity.clone(), Arc::clone(slot)))
            .collect();

        for (identity, slot) in registered {
            let mut current = slot.lock().await;
            self.unregister(&identity, &slot);
            let Some(handle) = current.take() else { continue };
            drop(current);

            handle.retire();
            if Arc::strong_count(&handle) == 1 {
                handle.session.close().await;
            }
        }
        tracing::info!("Connection registry reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{descriptor, FakeConnector};
    use std::time::Duration;

    #[tokio::test]
    async fn test_reuses_handle_for_same_identity() {
        let connector = Arc::new(FakeConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let a = registry.get_connection(&descriptor(), false).await.unwrap();
        let b = registry.get_connection(&descriptor(), false).await.unwrap();

        assert_eq!(a.id(), b.id());
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_distinct_databases_get_distinct_handles() {
        let connector = Arc::new(FakeConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let a = registry.get_connection(&descriptor(), false).await.unwrap();
        let b = registry.get_connection(&descriptor().with_database("shop"), false).await.unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_force_new_replaces_and_retires() {
        let connector = Arc::new(FakeConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());

        let old = registry.get_connection(&descriptor(), false).await.unwrap();
        let new = registry.get_connection(&descriptor(), true).await.unwrap();

        assert_ne!(old.id(), new.id());
        assert!(old.is_retired());
        assert!(!new.is_retired());
        assert!(old.query("SELECT 1").await.unwrap_err().is_connection_lost());
        assert!(new.query("SELECT 1").await.is_ok());

        let again = registry.get_connection(&descriptor(), false).await.unwrap();
        assert_eq!(again.id(), new.id());
    }

    #[tokio::test]
    async fn test_failed_connect_creates_no_entry() {
        let connector = Arc::new(FakeConnector::failing("Can't connect to MySQL server"));
        let registry = ConnectionRegistry::new(connector);
        let d = descriptor();

        let err = registry.get_connection(&d, false).await.err().unwrap();

        let message = err.to_string();
        assert!(message.contains(d.identity().as_str()), "{message}");
        assert!(message.contains("Can't connect"), "{message}");
        assert!(!registry.contains(&d.identity()));
        assert!(registry.slots.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_force_new_keeps_live_handle() {
        let registry = ConnectionRegistry::new(Arc::new(FakeConnector::default()));
        let handle = registry.get_connection(&descriptor(), false).await.unwrap();
        let failing = ConnectionRegistry {
            connector: Arc::new(FakeConnector::failing("Too many connections")),
            slots: Mutex::new(registry.slots.lock().clone()),
        };

        assert!(failing.get_connection(&descriptor(), true).await.is_err());

        assert!(failing.contains(&descriptor().identity()));
        assert!(!handle.is_retired());
    }

    #[tokio::test]
    async fn test_running_statement_survives_force_new() {
        let connector = Arc::new(FakeConnector::with_query_delay(Duration::from_millis(50)));
        let registry = ConnectionRegistry::new(connector.clone());
        let old = registry.get_connection(&descriptor(), false).await.unwrap();

        let (running, replaced) = tokio::join!(old.query("SELECT SLEEP(1)"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            registry.get_connection(&descriptor(), true).await
        });

        assert!(running.is_ok());
        assert!(old.is_retired());
        assert_ne!(replaced.unwrap().id(), old.id());
        assert!(old.query("SELECT 1").await.unwrap_err().is_connection_lost());
    }

    #[tokio::test]
    async fn test_reset_retires_everything() {
        let connector = Arc::new(FakeConnector::default());
        let registry = ConnectionRegistry::new(connector.clone());
        let handle = registry.get_connection(&descriptor(), false).await.unwrap();

        registry.reset().await;

        assert!(registry.is_empty());
        assert!(handle.is_retired());
        registry.get_connection(&descriptor(), false).await.unwrap();
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_connect_queued_behind_reset_is_not_orphaned() {
        let connector = Arc::new(FakeConnector::default());
        let registry = Arc::new(ConnectionRegistry::new(connector.clone()));
        let d = descriptor();
        let first = registry.get_connection(&d, false).await.unwrap();

        let slot = registry.slot(&d.identity());
        let held = slot.lock().await;
        let reset = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.reset().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let connect = tokio::spawn({
            let registry = Arc::clone(&registry);
            let d = d.clone();
            async move { registry.get_connection(&d, false).await.map(|h| h.id()) }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        reset.await.unwrap();
        let reopened = connect.await.unwrap().unwrap();

        assert!(first.is_retired());
        assert_ne!(reopened, first.id());
        assert_eq!(registry.len(), 1);
        let again = registry.get_connection(&d, false).await.unwrap();
        assert_eq!(again.id(), reopened);
        assert_eq!(connector.connects(), 2);
    }
}
