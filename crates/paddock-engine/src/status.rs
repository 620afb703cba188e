//! # Status Transition Engine
//!
//! Moves a deal between operational statuses. Three gates run in order and
//! every failure is collected: the status adjacency table, the
//! stage/status compatibility table, and the per-target semantic checks
//! (completion documents, mandatory reasons, the 24-hour reactivation
//! dwell).
//!
//! A rejected attempt does not touch the deal: the outcome carries a
//! synthetic entry describing the refusal, and that entry is never
//! appended to the timeline. The refusal is still reported to the sink as
//! a `ValidationFailed` event carrying the itemized reasons.
//! `Completed` is only compatible with stage `Complete`, so direct
//! completion goes through the stage engine, which performs the dual
//! stage+status mutation; the document checks here are the same gate from
//! the other side.

use std::sync::Arc;

use tracing::{debug, info, warn};

use paddock_core::Actor;
use paddock_deal::{
    doc_types, Deal, DealStatus, EntryMetadata, TimelineEntry, TimelineEventType,
};

use crate::error::EngineError;
use crate::events::{EventSink, LifecycleEvent, LifecycleEventKind};
use crate::ledger::TimelineLedger;
use crate::store::DealStore;

/// Minimum seconds a deal must stay on hold before reactivation (24h).
pub const REACTIVATION_DWELL_SECS: i64 = 24 * 60 * 60;

/// The documents that must be approved before a deal may complete.
const COMPLETION_DOCS: &[&str] = &[
    doc_types::SIGNED_CONTRACT,
    doc_types::TRANSFER_OF_OWNERSHIP,
    doc_types::PAYMENT_CONFIRMATION,
];

/// The result of a status transition attempt.
#[derive(Debug, Clone)]
pub struct StatusChangeOutcome {
    /// Whether the transition committed.
    pub accepted: bool,
    /// The status before the attempt.
    pub previous_status: DealStatus,
    /// The status after the attempt (unchanged on rejection).
    pub status: DealStatus,
    /// The appended entry on success; a synthetic, non-appended record of
    /// the refusal on rejection.
    pub entry: TimelineEntry,
    /// Why the attempt was rejected, itemized. Empty on success.
    pub rejection_reasons: Vec<String>,
}

/// Applies status transitions with check-then-commit semantics.
pub struct StatusTransitionEngine {
    ledger: TimelineLedger,
    store: Arc<dyn DealStore>,
    sink: Arc<dyn EventSink>,
}

impl StatusTransitionEngine {
    /// Create an engine writing through the given store and sink.
    pub fn new(store: Arc<dyn DealStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
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
        target: DealStatus,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<StatusChangeOutcome, EngineError> {
        let current = deal.status;
        let mut reasons = Vec::new();

        if !current.can_transition_to(target) {
            reasons.push(format!("no status transition from {current} to {target}"));
        }
        if !deal.stage.permits_status(target) {
            reasons.push(format!(
                "status {target} is not compatible with stage {}",
                deal.stage
            ));
        }
        self.check_semantics(deal, target, reason.as_deref(), &mut reasons);

        if !reasons.is_empty() {
            debug!(deal = %deal.id, %current, %target, ?reasons, "status transition rejected");
            return Ok(self.rejection(deal, target, reason, actor, reasons));
        }

        // Commit point. Snapshot first: the prune inside append can drop
        // entries from the front, so a length rollback is not enough.
        let timeline_snapshot = deal.timeline.clone();
        deal.status = target;
        self.ledger
            .record_status_change(deal, current, target, reason.clone(), actor.clone());

        if let Err(persist) = self.store.save(deal) {
            deal.status = current;
            deal.timeline = timeline_snapshot;
            deal.touch();
            warn!(deal = %deal.id, %current, %target, error = %persist, "status transition rolled back");
            self.sink.emit(&LifecycleEvent::new(
                LifecycleEventKind::TransitionRolledBack,
                deal,
                deal.stage,
                actor.clone(),
                serde_json::json!({ "target": target, "error": persist.to_string() }),
            ));
            return Err(EngineError::Persistence(persist));
        }

        info!(deal = %deal.id, %current, %target, "status transition committed");
        self.sink.emit(&LifecycleEvent::new(
            LifecycleEventKind::StatusChanged,
            deal,
            deal.stage,
            actor.clone(),
            LifecycleEvent::status_payload(current, target, reason.as_deref()),
        ));

        let entry = deal
            .timeline
            .last()
            .cloned()
            .unwrap_or_else(|| self.synthetic_entry(deal, current, target, None, actor));
        Ok(StatusChangeOutcome {
            accepted: true,
            previous_status: current,
            status: target,
            entry,
            rejection_reasons: Vec::new(),
        })
    }

    fn check_semantics(
        &self,
        deal: &Deal,
        target: DealStatus,
        reason: Option<&str>,
        reasons: &mut Vec<String>,
    ) {
        match target {
            DealStatus::Completed => {
                for doc_type in COMPLETION_DOCS {
                    if !deal.has_approved_document(doc_type) {
                        reasons.push(format!(
                            "completion requires an approved '{doc_type}' document"
                        ));
                    }
                }
            }
            DealStatus::OnHold | DealStatus::Cancelled => {
                if reason.map_or(true, |r| r.trim().is_empty()) {
                    reasons.push(format!("a reason is required to move a deal to {target}"));
                }
            }
            DealStatus::Active => {
                if deal.status == DealStatus::OnHold {
                    self.check_reactivation_dwell(deal, reasons);
                }
            }
            DealStatus::Pending => {}
        }
    }

    /// Reactivation needs 24 hours of dwell since the entry that put the
    /// deal on hold. One reverse scan; no entry found means the hold
    /// predates the retained timeline and the gate does not apply.
    fn check_reactivation_dwell(&self, deal: &Deal, reasons: &mut Vec<String>) {
        let held_at = deal.last_entry_where(|e| {
            e.event_type == TimelineEventType::StatusChange
                && e.metadata.new_status == Some(DealStatus::OnHold)
        });
        if let Some(entry) = held_at {
            let dwell = paddock_core::Timestamp::now().seconds_since(entry.timestamp);
            if dwell < REACTIVATION_DWELL_SECS {
                let remaining_hours = (REACTIVATION_DWELL_SECS - dwell + 3599) / 3600;
                reasons.push(format!(
                    "a held deal may only be reactivated after 24 hours; about {remaining_hours}h remaining"
                ));
            }
        }
    }

    fn rejection(
        &self,
        deal: &Deal,
        target: DealStatus,
        reason: Option<String>,
        actor: &Actor,
        rejection_reasons: Vec<String>,
    ) -> StatusChangeOutcome {
        self.sink.emit(&LifecycleEvent::new(
            LifecycleEventKind::ValidationFailed,
            deal,
            deal.stage,
            actor.clone(),
            serde_json::json!({ "target": target, "reasons": rejection_reasons }),
        ));
        StatusChangeOutcome {
            accepted: false,
            previous_status: deal.status,
            status: deal.status,
            entry: self.synthetic_entry(deal, deal.status, target, reason, actor),
            rejection_reasons,
        }
    }

    /// A record of the refusal for the caller. Never appended.
    fn synthetic_entry(
        &self,
        deal: &Deal,
        from: DealStatus,
        target: DealStatus,
        reason: Option<String>,
        actor: &Actor,
    ) -> TimelineEntry {
        TimelineEntry::new(
            TimelineEventType::System,
            deal.stage,
            deal.status,
            format!("status change from {from} to {target} was rejected"),
            actor.clone(),
            EntryMetadata {
                automatic: Some(true),
                ..EntryMetadata::status_change(from, target, reason)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::{HorseId, Timestamp, UserId};
    use paddock_deal::{
        BasicInfo, DealStage, DealTerms, Document, DocumentStatus, Participant, ParticipantRole,
    };

    use crate::events::MemorySink;
    use crate::store::{MemoryStore, NullStore, PersistError};

    fn engine() -> (StatusTransitionEngine, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (
            StatusTransitionEngine::new(Arc::new(NullStore), sink.clone()),
            sink,
        )
    }

    fn active_deal() -> Deal {
        let mut deal = Deal::new(
            BasicInfo {
                horse: HorseId::new(),
                title: "Lusitano stallion".into(),
                tags: vec![],
            },
            DealTerms::new(35_000.0, "EUR"),
        );
        deal.participants
            .push(Participant::new(UserId::new(), ParticipantRole::Seller));
        deal.participants
            .push(Participant::new(UserId::new(), ParticipantRole::Buyer));
        deal.status = DealStatus::Active;
        deal
    }

    #[test]
    fn hold_with_reason_commits_and_notifies() {
        let (engine, sink) = engine();
        let mut deal = active_deal();

        let outcome = engine
            .attempt(
                &mut deal,
                DealStatus::OnHold,
                Some("awaiting x-rays".into()),
                &Actor::system(),
            )
            .unwrap();

        assert!(outcome.accepted);
        assert_eq!(deal.status, DealStatus::OnHold);
        assert_eq!(deal.timeline.len(), 1);
        assert_eq!(outcome.entry.id, deal.timeline[0].id);
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::StatusChanged]);
    }

    #[test]
    fn hold_without_reason_is_rejected_untouched() {
        let (engine, sink) = engine();
        let mut deal = active_deal();

        let outcome = engine
            .attempt(&mut deal, DealStatus::OnHold, None, &Actor::system())
            .unwrap();

        assert!(!outcome.accepted);
        assert_eq!(deal.status, DealStatus::Active);
        assert!(deal.timeline.is_empty());
        assert!(outcome.rejection_reasons[0].contains("reason is required"));
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::ValidationFailed]);
        let events = sink.events();
        assert!(events[0]
            .payload["reasons"]
            .as_array()
            .unwrap()
            .iter()
            .any(|r| r.as_str().unwrap().contains("reason is required")));
    }

    #[test]
    fn non_adjacent_transition_is_rejected() {
        let (engine, _) = engine();
        let mut deal = active_deal();
        deal.status = DealStatus::Pending;

        let outcome = engine
            .attempt(
                &mut deal,
                DealStatus::OnHold,
                Some("pause".into()),
                &Actor::system(),
            )
            .unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.rejection_reasons[0].contains("no status transition"));
    }

    #[test]
    fn completion_rejected_outside_stage_complete() {
        let (engine, _) = engine();
        let mut deal = active_deal();
        deal.stage = DealStage::Closing;

        let outcome = engine
            .attempt(&mut deal, DealStatus::Completed, None, &Actor::system())
            .unwrap();
        assert!(!outcome.accepted);
        assert!(outcome
            .rejection_reasons
            .iter()
            .any(|r| r.contains("not compatible with stage")));
        // Missing completion documents are itemized alongside.
        assert!(outcome
            .rejection_reasons
            .iter()
            .any(|r| r.contains("signed_contract")));
    }

    #[test]
    fn reactivation_before_dwell_fails() {
        let (engine, _) = engine();
        let mut deal = active_deal();

        engine
            .attempt(
                &mut deal,
                DealStatus::OnHold,
                Some("pause".into()),
                &Actor::system(),
            )
            .unwrap();

        let outcome = engine
            .attempt(&mut deal, DealStatus::Active, None, &Actor::system())
            .unwrap();
        assert!(!outcome.accepted);
        assert!(outcome.rejection_reasons[0].contains("24 hours"));
        assert_eq!(deal.status, DealStatus::OnHold);
    }

    #[test]
    fn reactivation_after_dwell_succeeds() {
        let (engine, _) = engine();
        let mut deal = active_deal();
        deal.status = DealStatus::OnHold;

        // Backdate the hold entry past the dwell window.
        let mut entry = TimelineEntry::new(
            TimelineEventType::StatusChange,
            deal.stage,
            DealStatus::OnHold,
            "status changed from ACTIVE to ON_HOLD",
            Actor::system(),
            EntryMetadata::status_change(DealStatus::Active, DealStatus::OnHold, None),
        );
        entry.timestamp = Timestamp::now().plus_secs(-(REACTIVATION_DWELL_SECS + 60));
        deal.timeline.push(entry);

        let outcome = engine
            .attempt(&mut deal, DealStatus::Active, None, &Actor::system())
            .unwrap();
        assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
        assert_eq!(deal.status, DealStatus::Active);
    }

    #[test]
    fn dwell_scan_finds_most_recent_hold() {
        let (engine, _) = engine();
        let mut deal = active_deal();
        deal.status = DealStatus::OnHold;

        // An old hold followed by a recent one: the recent one governs.
        for age in [REACTIVATION_DWELL_SECS * 2, 60] {
            let mut entry = TimelineEntry::new(
                TimelineEventType::StatusChange,
                deal.stage,
                DealStatus::OnHold,
                "held",
                Actor::system(),
                EntryMetadata::status_change(DealStatus::Active, DealStatus::OnHold, None),
            );
            entry.timestamp = Timestamp::now().plus_secs(-age);
            deal.timeline.push(entry);
        }

        let outcome = engine
            .attempt(&mut deal, DealStatus::Active, None, &Actor::system())
            .unwrap();
        assert!(!outcome.accepted);
    }

    #[test]
    fn persistence_failure_rolls_back_and_errs() {
        struct FailStore;
        impl DealStore for FailStore {
            fn save(&self, _deal: &Deal) -> Result<(), PersistError> {
                Err(PersistError::Unavailable("disk gone".into()))
            }
        }

        let sink = Arc::new(MemorySink::new());
        let engine = StatusTransitionEngine::new(Arc::new(FailStore), sink.clone());
        let mut deal = active_deal();

        let result = engine.attempt(
            &mut deal,
            DealStatus::OnHold,
            Some("pause".into()),
            &Actor::system(),
        );
        assert!(matches!(result, Err(EngineError::Persistence(_))));
        assert_eq!(deal.status, DealStatus::Active);
        assert!(deal.timeline.is_empty());
        assert_eq!(sink.kinds(), vec![LifecycleEventKind::TransitionRolledBack]);
    }

    #[test]
    fn cancellation_with_reason_commits_through_store() {
        let store = Arc::new(MemoryStore::new());
        let engine = StatusTransitionEngine::new(store.clone(), Arc::new(MemorySink::new()));
        let mut deal = active_deal();

        let outcome = engine
            .attempt(
                &mut deal,
                DealStatus::Cancelled,
                Some("buyer withdrew".into()),
                &Actor::user(UserId::new()),
            )
            .unwrap();
        assert!(outcome.accepted);
        assert_eq!(
            store.load(deal.id).unwrap().status,
            DealStatus::Cancelled
        );
    }

    #[test]
    fn completion_docs_gate_lists_each_missing_document() {
        let (engine, _) = engine();
        let mut deal = active_deal();
        deal.stage = DealStage::Complete; // compatibility satisfied
        let mut signed = Document::new(doc_types::SIGNED_CONTRACT, UserId::new());
        signed.status = DocumentStatus::Approved;
        deal.documents.push(signed);

        let outcome = engine
            .attempt(&mut deal, DealStatus::Completed, None, &Actor::system())
            .unwrap();
        assert!(!outcome.accepted);
        let missing: Vec<_> = outcome
            .rejection_reasons
            .iter()
            .filter(|r| r.contains("requires an approved"))
            .collect();
        assert_eq!(missing.len(), 2);
    }
}
