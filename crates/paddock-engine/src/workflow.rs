//! # The Deal Engine Facade
//!
//! One object wiring the validator, the ledger, both transition engines,
//! and the roster paths to a shared store and event sink. Callers that
//! manage their own deal ownership use this directly; callers that want
//! per-deal serialization go through the coordinator, which wraps one of
//! these.

use std::sync::Arc;

use paddock_core::Actor;
use paddock_deal::{Deal, DealStage, DealStatus};

use crate::error::EngineError;
use crate::events::{EventSink, NullSink};
use crate::ledger::{TimelineLedger, TimelineSummary};
use crate::roster::RosterEngine;
use crate::stage::{StageChangeOutcome, StageTransitionEngine};
use crate::status::{StatusChangeOutcome, StatusTransitionEngine};
use crate::store::{DealStore, NullStore};
use crate::validator::{RequirementValidator, ValidationResult, ValidationSummary};

/// The complete workflow engine for deal aggregates.
pub struct DealEngine {
    validator: RequirementValidator,
    ledger: TimelineLedger,
    stage: StageTransitionEngine,
    status: StatusTransitionEngine,
    roster: RosterEngine,
}

impl DealEngine {
    /// Create an engine writing through the given store and sink.
    pub fn new(store: Arc<dyn DealStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            validator: RequirementValidator::new(),
            ledger: TimelineLedger::new(),
            stage: StageTransitionEngine::new(store.clone(), sink.clone()),
            status: StatusTransitionEngine::new(store.clone(), sink.clone()),
            roster: RosterEngine::new(store, sink),
        }
    }

    /// An engine with no persistence and no event delivery, for pure
    /// in-memory use.
    pub fn detached() -> Self {
        Self::new(Arc::new(NullStore), Arc::new(NullSink))
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Attempt a stage transition. See [`StageTransitionEngine::attempt`].
    pub fn attempt_stage_transition(
        &self,
        deal: &mut Deal,
        target: DealStage,
        actor: &Actor,
    ) -> Result<StageChangeOutcome, EngineError> {
        self.stage.attempt(deal, target, actor)
    }

    /// Attempt a status transition. See [`StatusTransitionEngine::attempt`].
    pub fn attempt_status_transition(
        &self,
        deal: &mut Deal,
        target: DealStatus,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<StatusChangeOutcome, EngineError> {
        self.status.attempt(deal, target, reason, actor)
    }

    // ── Read-side ────────────────────────────────────────────────────

    /// Full health check over the aggregate.
    pub fn validate(&self, deal: &Deal) -> ValidationResult {
        self.validator.validate(deal)
    }

    /// Gate check for a specific target stage.
    pub fn validate_stage(&self, deal: &Deal, target: DealStage) -> ValidationResult {
        self.validator.validate_stage(deal, target)
    }

    /// Condensed verdict for the current stage.
    pub fn validation_summary(&self, deal: &Deal) -> ValidationSummary {
        self.validator.validation_summary(deal)
    }

    /// Unmet requirements for the current stage.
    pub fn remaining_requirements(&self, deal: &Deal) -> Vec<String> {
        self.validator.remaining_requirements(deal)
    }

    /// Aggregate the timeline.
    pub fn summarize_timeline(&self, deal: &Deal) -> TimelineSummary {
        self.ledger.summarize(deal)
    }

    // ── Collaborator access ──────────────────────────────────────────

    /// The validator, for callers composing their own checks.
    pub fn validator(&self) -> &RequirementValidator {
        &self.validator
    }

    /// The ledger, for comment/terms/logistics entries.
    pub fn ledger(&self) -> &TimelineLedger {
        &self.ledger
    }

    /// The roster and document mutation paths.
    pub fn roster(&self) -> &RosterEngine {
        &self.roster
    }
}

impl Default for DealEngine {
    fn default() -> Self {
        Self::detached()
    }
}
