//! # Deal Coordinator
//!
//! Per-deal serialization. The coordinator owns a registry mapping each
//! deal id to its own mutex; every operation locks exactly one deal. Two
//! operations on the same deal run one after the other in lock-acquisition
//! order; operations on different deals never contend.
//!
//! Reads go through the same per-deal lock as writes, so a validation or
//! summary never observes a half-applied transition. There is no global
//! lock around deal state — the registry mutex guards only the map itself
//! and is held just long enough to clone out the per-deal handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use paddock_core::{Actor, DealId};
use paddock_deal::{Deal, DealStage, DealStatus};

use crate::error::EngineError;
use crate::ledger::TimelineSummary;
use crate::stage::StageChangeOutcome;
use crate::status::StatusChangeOutcome;
use crate::validator::{ValidationResult, ValidationSummary};
use crate::workflow::DealEngine;

/// Serializes operations per deal and routes them through a shared
/// [`DealEngine`].
pub struct DealCoordinator {
    engine: DealEngine,
    deals: Mutex<HashMap<DealId, Arc<Mutex<Deal>>>>,
}

impl DealCoordinator {
    /// Create a coordinator around an engine.
    pub fn new(engine: DealEngine) -> Self {
        Self {
            engine,
            deals: Mutex::new(HashMap::new()),
        }
    }

    /// Register a deal, taking ownership. Returns its id.
    ///
    /// Registering the same id again replaces the stored aggregate.
    pub fn register(&self, deal: Deal) -> DealId {
        let id = deal.id;
        let mut deals = match self.deals.lock() {
            Ok(deals) => deals,
            Err(poisoned) => poisoned.into_inner(),
        };
        deals.insert(id, Arc::new(Mutex::new(deal)));
        debug!(deal = %id, "deal registered");
        id
    }

    /// Whether a deal is registered under this id.
    pub fn contains(&self, id: DealId) -> bool {
        match self.deals.lock() {
            Ok(deals) => deals.contains_key(&id),
            Err(poisoned) => poisoned.into_inner().contains_key(&id),
        }
    }

    /// Run `f` with exclusive access to the deal.
    ///
    /// This is the one lock everything else routes through. The registry
    /// map is unlocked before the deal lock is taken, so holding one deal
    /// never blocks operations on another.
    pub fn with_deal<R>(
        &self,
        id: DealId,
        f: impl FnOnce(&mut Deal, &DealEngine) -> R,
    ) -> Result<R, EngineError> {
        let handle = {
            let deals = match self.deals.lock() {
                Ok(deals) => deals,
                Err(poisoned) => poisoned.into_inner(),
            };
            deals
                .get(&id)
                .cloned()
                .ok_or(EngineError::UnknownDeal(id))?
        };
        let mut deal = handle
            .lock()
            .map_err(|_| EngineError::LockPoisoned { deal: id })?;
        Ok(f(&mut deal, &self.engine))
    }

    // ── Serialized operations ────────────────────────────────────────

    /// Attempt a stage transition under the deal's lock.
    pub fn attempt_stage_transition(
        &self,
        id: DealId,
        target: DealStage,
        actor: &Actor,
    ) -> Result<StageChangeOutcome, EngineError> {
        self.with_deal(id, |deal, engine| {
            engine.attempt_stage_transition(deal, target, actor)
        })?
    }

    /// Attempt a status transition under the deal's lock.
    pub fn attempt_status_transition(
        &self,
        id: DealId,
        target: DealStatus,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<StatusChangeOutcome, EngineError> {
        self.with_deal(id, |deal, engine| {
            engine.attempt_status_transition(deal, target, reason, actor)
        })?
    }

    /// Full health check under the deal's lock.
    pub fn validate(&self, id: DealId) -> Result<ValidationResult, EngineError> {
        self.with_deal(id, |deal, engine| engine.validate(deal))
    }

    /// Condensed verdict under the deal's lock.
    pub fn validation_summary(&self, id: DealId) -> Result<ValidationSummary, EngineError> {
        self.with_deal(id, |deal, engine| engine.validation_summary(deal))
    }

    /// Timeline summary under the deal's lock.
    pub fn summarize_timeline(&self, id: DealId) -> Result<TimelineSummary, EngineError> {
        self.with_deal(id, |deal, engine| engine.summarize_timeline(deal))
    }

    /// A point-in-time copy of the aggregate.
    pub fn snapshot(&self, id: DealId) -> Result<Deal, EngineError> {
        self.with_deal(id, |deal, _| deal.clone())
    }
}
