//! # Stage Transition Engine
//!
//! Moves a deal between business stages. The gate is the adjacency table
//! plus the target stage's requirement rules (evaluated against current
//! field values; the engine never pretends the move already happened).
//!
//! Commit order: snapshot, mutate, append ledger entry, persist, notify.
//! The snapshot is a call-scoped value on this stack frame — it is created
//! per attempt, used for at most one rollback, and dropped on return.
//! Persistence failure restores the snapshot, emits `TransitionRolledBack`,
//! and surfaces as `Err`; everything before the commit point comes back as
//! a structured rejection with the deal untouched. Rejections are not
//! silent: every one is reported to the sink as a `ValidationFailed`
//! event carrying the itemized reasons.
//!
//! Entering `Complete` is the one dual mutation in the engine: the status
//! moves to `Completed` in the same commit, keeping
//! `stage == Complete ⇔ status == Completed` observable at all times. The
//! status adjacency table still applies, so only an `Active` deal can
//! complete.

use std::sync::Arc;

use tracing::{debug, info, warn};

use paddock_core::Actor;
use paddock_deal::{
    Deal, DealStage, DealStatus, EntryMetadata, TimelineEntry, TimelineEventType,
};

use crate::error::EngineError;
use crate::events::{EventSink, LifecycleEvent, LifecycleEventKind};
use crate::ledger::TimelineLedger;
use crate::store::DealStore;
use crate::validator::{RequirementValidator, ValidationResult};

/// Pre-mutation state restored if persistence fails.
struct TransitionSnapshot {
    stage: DealStage,
    status: DealStatus,
    timeline: Vec<TimelineEntry>,
}

impl TransitionSnapshot {
    fn capture(deal: &Deal) -> Self {
        Self {
            stage: deal.stage,
            status: deal.status,
            timeline: deal.timeline.clone(),
        }
    }

    fn restore(self, deal: &mut Deal) {
        deal.stage = self.stage;
        deal.status = self.status;
        deal.timeline = self.timeline;
        deal.touch();
    }
}

/// The result of a stage transition attempt.
#[derive(Debug, Clone)]
pub struct StageChangeOutcome {
    /// Whether the transition committed.
    pub accepted: bool,
    /// The stage before the attempt.
    pub previous_stage: DealStage,
    /// The stage after the attempt (unchanged on rejection).
    pub stage: DealStage,
    /// The gate verdict on rejection; the post-commit health check on
    /// success. `None` when the attempt failed the adjacency table before
    /// any rule ran.
    pub validation: Option<ValidationResult>,
    /// The appended entry on success; a synthetic, non-appended record of
    /// the refusal on rejection.
    pub entry: TimelineEntry,
    /// Why the attempt was rejected, itemized. Empty on success.
    pub rejection_reasons: Vec<String>,
}

/// Applies stage transitions with snapshot-rollback semantics.
pub struct StageTransitionEngine {
    validator: RequirementValidator,
    ledger: TimelineLedger,
    store: Arc<dyn DealStore>,
    sink: Arc<dyn EventSink>,
}

impl StageTransitionEngine {
    /// Create an engine writing through the given store and sink.
    pub fn new(store: Arc<dyn DealStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            validator: RequirementValidator::new(),
            ledger: TimelineLedger::new(),
            store,
            sink,
        }
    }

    /// Attempt to move the deal to `target`.
    ///
    /// Rule failures come back as `Ok` with `accepted == false`; `Err` is
    /// reserved for persistence failure, by which point the in-memory
    /// mutation has been rolled back.
    pub fn attempt(
        &self,
        deal: &mut Deal,
        target: DealStage,
        actor: &Actor,
    ) -> Result<StageChangeOutcome, EngineError> {
        let current = deal.stage;

        if !current.can_transition_to(target) {
            let reason = if current.is_terminal() {
                format!("{current} is terminal; no transitions leave it")
            } else {
                format!("no stage transition from {current} to {target}")
            };
            debug!(deal = %deal.id, %current, %target, "stage transition not adjacent");
            return Ok(self.rejection(deal, target, actor, None, vec![reason]));
        }

        let gate = self.validator.validate_stage(deal, target);
        if !gate.is_valid {
            let mut reasons = gate.missing_requirements.clone();
            reasons.extend(gate.blocking_conditions.iter().cloned());
            debug!(deal = %deal.id, %current, %target, ?reasons, "stage transition rejected by gate");
            return Ok(self.rejection(deal, target, actor, Some(gate), reasons));
        }

        // The dual mutation into Complete rides on the status adjacency
        // table: only an Active deal has a Completed edge.
        let completes = target == DealStage::Complete;
        if completes && !deal.status.can_transition_to(DealStatus::Completed) {
            let reason = format!(
                "a deal must be {} to complete; current status is {}",
                DealStatus::Active,
                deal.status
            );
            return Ok(self.rejection(deal, target, actor, Some(gate), vec![reason]));
        }

        // Commit point.
        let snapshot = TransitionSnapshot::capture(deal);
        let previous_status = deal.status;
        deal.stage = target;
        if completes {
            deal.status = DealStatus::Completed;
        }
        self.ledger
            .record_stage_change(deal, current, target, actor.clone());
        if completes {
            self.ledger.record_status_change(
                deal,
                previous_status,
                DealStatus::Completed,
                Some("deal completed".into()),
                Actor::system(),
            );
        }

        if let Err(persist) = self.store.save(deal) {
            snapshot.restore(deal);
            warn!(deal = %deal.id, %current, %target, error = %persist, "stage transition rolled back");
            self.sink.emit(&LifecycleEvent::new(
                LifecycleEventKind::TransitionRolledBack,
                deal,
                current,
                actor.clone(),
                serde_json::json!({ "target": target, "error": persist.to_string() }),
            ));
            return Err(EngineError::Persistence(persist));
        }

        info!(deal = %deal.id, %current, %target, "stage transition committed");
        self.sink.emit(&LifecycleEvent::new(
            LifecycleEventKind::StageChanged,
            deal,
            target,
            actor.clone(),
            LifecycleEvent::stage_payload(current, target),
        ));

        // Post-commit health check. A failure here is reported, never
        // reverted: the transition was legal when gated, and unwinding a
        // persisted commit would be worse than the degraded validity.
        let health = self.validator.validate(deal);
        if !health.is_valid {
            let codes: Vec<&str> = health.errors.iter().map(|e| e.code.as_str()).collect();
            warn!(deal = %deal.id, %target, ?codes, "deal fails validation after committed transition");
            self.sink.emit(&LifecycleEvent::new(
                LifecycleEventKind::ValidationFailed,
                deal,
                target,
                Actor::system(),
                serde_json::json!({ "codes": codes }),
            ));
        }

        let entry = deal
            .timeline
            .iter()
            .rev()
            .find(|e| e.event_type == TimelineEventType::StageChange)
            .cloned()
            .unwrap_or_else(|| self.synthetic_entry(deal, current, target, actor));
        Ok(StageChangeOutcome {
            accepted: true,
            previous_stage: current,
            stage: target,
            validation: Some(health),
            entry,
            rejection_reasons: Vec::new(),
        })
    }

    fn rejection(
        &self,
        deal: &Deal,
        target: DealStage,
        actor: &Actor,
        validation: Option<ValidationResult>,
        rejection_reasons: Vec<String>,
    ) -> StageChangeOutcome {
        self.sink.emit(&LifecycleEvent::new(
            LifecycleEventKind::ValidationFailed,
            deal,
            deal.stage,
            actor.clone(),
            serde_json::json!({ "target": target, "reasons": rejection_reasons }),
        ));
        StageChangeOutcome {
            accepted: false,
            previous_stage: deal.stage,
            stage: deal.stage,
            validation,
            entry: self.synthetic_entry(deal, deal.stage, target, actor),
            rejection_reasons,
        }
    }

    /// A record of the refusal for the caller. Never appended.
    fn synthetic_entry(
        &self,
        deal: &Deal,
        from: DealStage,
        target: DealStage,
        actor: &Actor,
    ) -> TimelineEntry {
        TimelineEntry::new(
            TimelineEventType::System,
            deal.stage,
            deal.status,
            format!("stage change from {from} to {target} was rejected"),
            actor.clone(),
            EntryMetadata {
                automatic: Some(true),
                ..EntryMetadata::stage_change(from, target)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::{HorseId, UserId};
    use paddock_deal::{
        doc_types, BasicInfo, DealTerms, Document, DocumentStatus, InsurancePolicy, Participant,
        ParticipantRole,
    };

    use crate::events::MemorySink;
    use crate::store::{MemoryStore, NullStore, PersistError};

    fn engine() -> (StageTransitionEngine, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (
            StageTransitionEngine::new(Arc::new(NullStore), sink.clone()),
            sink,
        )
    }

    fn staffed_deal() -> Deal {
        let mut deal = Deal::new(
            BasicInfo {
                horse: HorseId::new(),
                title: "Andalusian mare".into(),
                tags: vec![],
            },
            DealTerms::new(28_000.0, "EUR"),
        );
        deal.participants
            .push(Participant::new(UserId::new(), ParticipantRole::Seller));
        deal.participants
            .push(Participant::new(UserId::new(), ParticipantRole::Buyer));
        deal.status = DealStatus::Active;
        deal
    }

    fn approved(doc_type: &str) -> Document {
        let mut d = Document::new(doc_type, UserId::new());
        d.status = DocumentStatus::Approved;
        d
    }

    /// A deal at Closing with everything needed to complete.
    fn closing_deal() -> Deal {
        let mut deal = staffed_deal();
        deal.stage = DealStage::Closing;
        deal.documents.push(approved(doc_types::CONTRACT));
        deal.documents.push(approved(doc_types::SIGNED_CONTRACT));
        deal.documents.push(approved(doc_types::PAYMENT_CONFIRMATION));
        deal.documents.push(approved(doc_types::TRANSFER_OF_OWNERSHIP));
        deal
    }

    #[test]
    fn forward_transition_commits_and_notifies() {
        let (engine, sink) = engine();
        let mut deal = staffed_deal();

        let outcome = engine
            .attempt(&mut deal, DealStage::Discussion, &Actor::system())
            .unwrap();

        assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
        assert_eq!(deal.stage, DealStage::Discussion);
        assert_eq!(deal.timeline.len(), 1);
        assert_eq!(outcome.entry.metadata.new_stage, Some(DealStage::Discussion));
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::StageChanged]);
    }

    #[test]
    fn non_adjacent_attempt_leaves_deal_identical() {
        let (engine, sink) = engine();
        let mut deal = staffed_deal();
        let stage_before = deal.stage;
        let status_before = deal.status;

        let outcome = engine
            .attempt(&mut deal, DealStage::Closing, &Actor::system())
            .unwrap();

        assert!(!outcome.accepted);
        assert!(outcome.validation.is_none());
        assert_eq!(deal.stage, stage_before);
        assert_eq!(deal.status, status_before);
        assert!(deal.timeline.is_empty());
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::ValidationFailed]);
    }

    #[test]
    fn gate_failure_itemizes_missing_requirements() {
        let (engine, _) = engine();
        let mut deal = staffed_deal();
        deal.participants.retain(|p| p.role == ParticipantRole::Seller);

        let outcome = engine
            .attempt(&mut deal, DealStage::Discussion, &Actor::system())
            .unwrap();

        assert!(!outcome.accepted);
        assert!(outcome
            .rejection_reasons
            .iter()
            .any(|r| r.contains("buyer or agent")));
        let gate = outcome.validation.unwrap();
        assert!(gate
            .errors
            .iter()
            .any(|e| e.code == "discussion.buyer_side_present"));
        assert_eq!(deal.stage, DealStage::Initiation);
        assert!(deal.timeline.is_empty());
    }

    #[test]
    fn gate_rejection_is_reported_to_the_sink() {
        let (engine, sink) = engine();
        let mut deal = staffed_deal();
        deal.participants.retain(|p| p.role == ParticipantRole::Seller);

        engine
            .attempt(&mut deal, DealStage::Discussion, &Actor::system())
            .unwrap();

        assert_eq!(sink.kinds(), vec![LifecycleEventKind::ValidationFailed]);
        let events = sink.events();
        let event = &events[0];
        assert_eq!(event.payload["target"], "DISCUSSION");
        assert!(event
            .payload["reasons"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r.as_str().unwrap().contains("buyer or agent")));
    }

    #[test]
    fn backward_transition_is_allowed() {
        let (engine, _) = engine();
        let mut deal = staffed_deal();
        deal.stage = DealStage::Evaluation;

        let outcome = engine
            .attempt(&mut deal, DealStage::Discussion, &Actor::system())
            .unwrap();
        assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
        assert_eq!(deal.stage, DealStage::Discussion);
    }

    #[test]
    fn completion_is_a_dual_mutation() {
        let (engine, sink) = engine();
        let mut deal = closing_deal();

        let outcome = engine
            .attempt(&mut deal, DealStage::Complete, &Actor::system())
            .unwrap();

        assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
        assert_eq!(deal.stage, DealStage::Complete);
        assert_eq!(deal.status, DealStatus::Completed);
        assert!(deal.stage_status_consistent());
        // Stage entry plus the automatic status entry.
        assert_eq!(deal.timeline.len(), 2);
        assert_eq!(
            deal.timeline[1].metadata.new_status,
            Some(DealStatus::Completed)
        );
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::StageChanged]);
    }

    #[test]
    fn held_deal_cannot_complete() {
        let (engine, _) = engine();
        let mut deal = closing_deal();
        deal.status = DealStatus::OnHold;

        let outcome = engine
            .attempt(&mut deal, DealStage::Complete, &Actor::system())
            .unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.rejection_reasons[0].contains("must be ACTIVE"));
        assert_eq!(deal.stage, DealStage::Closing);
        assert_eq!(deal.status, DealStatus::OnHold);
    }

    #[test]
    fn complete_is_terminal() {
        let (engine, _) = engine();
        let mut deal = closing_deal();
        engine
            .attempt(&mut deal, DealStage::Complete, &Actor::system())
            .unwrap();

        for target in DealStage::ALL {
            let outcome = engine.attempt(&mut deal, target, &Actor::system()).unwrap();
            assert!(!outcome.accepted);
            assert!(outcome.rejection_reasons[0].contains("terminal"));
        }
        assert_eq!(deal.stage, DealStage::Complete);
    }

    #[test]
    fn persistence_failure_restores_the_snapshot() {
        struct FailStore;
        impl DealStore for FailStore {
            fn save(&self, _deal: &Deal) -> Result<(), PersistError> {
                Err(PersistError::Unavailable("backend down".into()))
            }
        }

        let sink = Arc::new(MemorySink::new());
        let engine = StageTransitionEngine::new(Arc::new(FailStore), sink.clone());
        let mut deal = staffed_deal();
        let timeline_before = deal.timeline.clone();

        let result = engine.attempt(&mut deal, DealStage::Discussion, &Actor::system());

        assert!(matches!(result, Err(EngineError::Persistence(_))));
        assert_eq!(deal.stage, DealStage::Initiation);
        assert_eq!(deal.status, DealStatus::Active);
        assert_eq!(deal.timeline.len(), timeline_before.len());
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::TransitionRolledBack]);
    }

    #[test]
    fn committed_transition_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = StageTransitionEngine::new(store.clone(), Arc::new(MemorySink::new()));
        let mut deal = staffed_deal();

        engine
            .attempt(&mut deal, DealStage::Discussion, &Actor::system())
            .unwrap();

        let saved = store.load(deal.id).unwrap();
        assert_eq!(saved.stage, DealStage::Discussion);
        assert_eq!(saved.timeline.len(), 1);
    }

    #[test]
    fn post_commit_validation_failure_is_soft() {
        let (engine, sink) = engine();
        // One lone participant: Initiation's empty rule table lets the
        // backward move through, but the full health check then fails on
        // the structural participant minimum.
        let mut deal = staffed_deal();
        deal.stage = DealStage::Discussion;
        deal.participants.truncate(1);

        let outcome = engine
            .attempt(&mut deal, DealStage::Initiation, &Actor::system())
            .unwrap();

        assert!(outcome.accepted);
        assert_eq!(deal.stage, DealStage::Initiation);
        let health = outcome.validation.unwrap();
        assert!(!health.is_valid);
        assert_eq!(
            sink.kinds(),
            vec![
                LifecycleEventKind::StageChanged,
                LifecycleEventKind::ValidationFailed
            ]
        );
    }

    #[test]
    fn documentation_gate_end_to_end() {
        let (engine, _) = engine();
        let mut deal = staffed_deal();
        deal.stage = DealStage::Evaluation;

        // Missing contract and insurance.
        let rejected = engine
            .attempt(&mut deal, DealStage::Documentation, &Actor::system())
            .unwrap();
        assert!(!rejected.accepted);
        assert_eq!(rejected.rejection_reasons.len(), 2);

        deal.documents.push(approved(doc_types::CONTRACT));
        deal.logistics.insurance = Some(InsurancePolicy {
            provider: "EquiSure".into(),
            policy_number: "P-9".into(),
            coverage: 28_000.0,
        });
        let accepted = engine
            .attempt(&mut deal, DealStage::Documentation, &Actor::system())
            .unwrap();
        assert!(accepted.accepted, "{:?}", accepted.rejection_reasons);
    }
}
