//! # Engine Error Taxonomy
//!
//! `EngineError` covers genuine failures only: storage going away mid-write
//! (after the rollback has already run), a poisoned per-deal lock, or an
//! unknown deal id at the coordinator. Rule rejections are not errors — they
//! come back as structured outcomes with `accepted == false`.

use paddock_core::DealId;
use thiserror::Error;

use crate::store::PersistError;

/// A failure inside the engine, as opposed to a rule rejection.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The store failed to persist a committed transition. The in-memory
    /// aggregate has already been rolled back to its pre-transition state
    /// when this is returned.
    #[error("persistence failed after rollback: {0}")]
    Persistence(#[from] PersistError),

    /// A per-deal lock was poisoned by a panicking holder.
    #[error("deal lock poisoned for {deal}")]
    LockPoisoned {
        /// The deal whose lock was poisoned.
        deal: DealId,
    },

    /// The coordinator has no deal registered under this id.
    #[error("unknown deal {0}")]
    UnknownDeal(DealId),
}
