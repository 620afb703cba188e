//! # Persistence Seam
//!
//! The engine does not own storage. Callers hand it a [`DealStore`] and the
//! transition engines call `save` at their commit point; a save failure
//! triggers the snapshot rollback. [`NullStore`] accepts everything (pure
//! in-memory use), [`MemoryStore`] keeps serialized copies for tests and
//! small deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use paddock_core::DealId;
use paddock_deal::Deal;

/// A failure to persist a deal.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The backend refused or lost the write.
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// The aggregate could not be serialized.
    #[error("deal serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where committed deals go.
///
/// `save` is called once per committed transition, after the in-memory
/// mutation and ledger append. Implementations must either persist the
/// whole aggregate or fail; partial writes are the caller's rollback
/// trigger, not a supported state.
pub trait DealStore: Send + Sync {
    /// Persist the full aggregate.
    fn save(&self, deal: &Deal) -> Result<(), PersistError>;
}

/// A store that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl DealStore for NullStore {
    fn save(&self, _deal: &Deal) -> Result<(), PersistError> {
        Ok(())
    }
}

/// An in-memory store keeping the serialized form of each deal.
///
/// Serializing on save keeps the stored copy decoupled from the live
/// aggregate and exercises the same code path a real backend would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    deals: Mutex<HashMap<DealId, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a previously saved deal, if present.
    pub fn load(&self, id: DealId) -> Option<Deal> {
        let deals = self.deals.lock().ok()?;
        let json = deals.get(&id)?;
        serde_json::from_str(json).ok()
    }

    /// Number of deals saved.
    pub fn len(&self) -> usize {
        self.deals.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DealStore for MemoryStore {
    fn save(&self, deal: &Deal) -> Result<(), PersistError> {
        let json = serde_json::to_string(deal)?;
        let mut deals = self
            .deals
            .lock()
            .map_err(|_| PersistError::Unavailable("store lock poisoned".into()))?;
        deals.insert(deal.id, json);
        Ok(())
    }
}
