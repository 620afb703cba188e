//! # Roster and Document Mutation Paths
//!
//! The audited ways to change who is on a deal and what paperwork it
//! carries. Every committed change appends a ledger entry, persists the
//! aggregate, and emits an event; a persistence failure restores the
//! pre-change snapshot exactly as the transition engines do.
//!
//! The role-coverage invariant lives here: a removal or deactivation that
//! would leave the deal without an active Seller or without an active
//! Buyer-or-Agent is rejected unless `force` is set. Documents are never
//! deleted — a replacement gets the next version number, a bad one gets
//! rejected with a reason.

use std::sync::Arc;

use tracing::{debug, info, warn};

use paddock_core::{Actor, DocumentId, ParticipantId, UserId};
use paddock_deal::{
    Deal, Document, DocumentReview, DocumentStatus, Participant, ParticipantRole, TimelineEntry,
};

use crate::error::EngineError;
use crate::events::{EventSink, LifecycleEvent, LifecycleEventKind};
use crate::ledger::TimelineLedger;
use crate::store::DealStore;

/// The result of a roster or document mutation attempt.
#[derive(Debug, Clone)]
pub struct RosterOutcome {
    /// Whether the change committed.
    pub accepted: bool,
    /// Why the change was rejected. Empty on success.
    pub rejection_reasons: Vec<String>,
}

impl RosterOutcome {
    fn accepted() -> Self {
        Self {
            accepted: true,
            rejection_reasons: Vec::new(),
        }
    }

    fn rejected(reasons: Vec<String>) -> Self {
        Self {
            accepted: false,
            rejection_reasons: reasons,
        }
    }
}

/// Applies participant and document changes with the same commit
/// discipline as the transition engines.
pub struct RosterEngine {
    ledger: TimelineLedger,
    store: Arc<dyn DealStore>,
    sink: Arc<dyn EventSink>,
}

impl RosterEngine {
    /// Create an engine writing through the given store and sink.
    pub fn new(store: Arc<dyn DealStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            ledger: TimelineLedger::new(),
            store,
            sink,
        }
    }

    // ── Participants ─────────────────────────────────────────────────

    /// Add an active participant.
    pub fn add_participant(
        &self,
        deal: &mut Deal,
        user: UserId,
        role: ParticipantRole,
        actor: &Actor,
    ) -> Result<ParticipantId, EngineError> {
        let snapshot = MutationSnapshot::capture(deal);
        let participant = Participant::new(user, role);
        let id = participant.id;
        deal.participants.push(participant);
        self.ledger.record_participant_change(
            deal,
            id,
            format!("{user} joined the deal as {role}"),
            actor.clone(),
        );

        self.commit(deal, snapshot, LifecycleEventKind::ParticipantChanged, actor, || {
            serde_json::json!({ "participant": id, "role": role, "change": "added" })
        })?;
        info!(deal = %deal.id, participant = %id, %role, "participant added");
        Ok(id)
    }

    /// Deactivate a participant, keeping them on the roster.
    ///
    /// Rejected when it would strip the last active required-role coverage,
    /// unless `force` is set.
    pub fn deactivate_participant(
        &self,
        deal: &mut Deal,
        participant: ParticipantId,
        reason: Option<String>,
        force: bool,
        actor: &Actor,
    ) -> Result<RosterOutcome, EngineError> {
        let Some(index) = deal.participants.iter().position(|p| p.id == participant) else {
            return Ok(RosterOutcome::rejected(vec![format!(
                "no participant {participant} on this deal"
            )]));
        };
        if !deal.participants[index].active {
            return Ok(RosterOutcome::rejected(vec![format!(
                "participant {participant} is already inactive"
            )]));
        }

        if !force {
            if let Some(violation) = self.coverage_violation(deal, index) {
                debug!(deal = %deal.id, %participant, %violation, "deactivation rejected");
                return Ok(RosterOutcome::rejected(vec![violation]));
            }
        }

        let snapshot = MutationSnapshot::capture(deal);
        deal.participants[index].set_active(false, reason.clone());
        let role = deal.participants[index].role;
        let description = match &reason {
            Some(r) => format!("{role} participant deactivated: {r}"),
            None => format!("{role} participant deactivated"),
        };
        self.ledger
            .record_participant_change(deal, participant, description, actor.clone());

        self.commit(deal, snapshot, LifecycleEventKind::ParticipantChanged, actor, || {
            serde_json::json!({ "participant": participant, "change": "deactivated" })
        })?;
        info!(deal = %deal.id, %participant, "participant deactivated");
        Ok(RosterOutcome::accepted())
    }

    /// Remove a participant from the roster entirely.
    ///
    /// Same coverage rule as deactivation; `force` overrides.
    pub fn remove_participant(
        &self,
        deal: &mut Deal,
        participant: ParticipantId,
        force: bool,
        actor: &Actor,
    ) -> Result<RosterOutcome, EngineError> {
        let Some(index) = deal.participants.iter().position(|p| p.id == participant) else {
            return Ok(RosterOutcome::rejected(vec![format!(
                "no participant {participant} on this deal"
            )]));
        };

        if !force {
            if let Some(violation) = self.coverage_violation(deal, index) {
                debug!(deal = %deal.id, %participant, %violation, "removal rejected");
                return Ok(RosterOutcome::rejected(vec![violation]));
            }
        }

        let snapshot = MutationSnapshot::capture(deal);
        let removed = deal.participants.remove(index);
        self.ledger.record_participant_change(
            deal,
            participant,
            format!("{} participant {} removed from the deal", removed.role, removed.user),
            actor.clone(),
        );

        self.commit(deal, snapshot, LifecycleEventKind::ParticipantChanged, actor, || {
            serde_json::json!({ "participant": participant, "change": "removed" })
        })?;
        info!(deal = %deal.id, %participant, "participant removed");
        Ok(RosterOutcome::accepted())
    }

    /// Whether losing the participant at `index` would strip the last
    /// active Seller or the last active Buyer-or-Agent.
    fn coverage_violation(&self, deal: &Deal, index: usize) -> Option<String> {
        let target = &deal.participants[index];
        if !target.active {
            return None;
        }

        let others_active = |pred: &dyn Fn(&Participant) -> bool| {
            deal.participants
                .iter()
                .enumerate()
                .any(|(i, p)| i != index && p.active && pred(p))
        };

        if target.role == ParticipantRole::Seller
            && deal.has_active_role(ParticipantRole::Seller)
            && !others_active(&|p| p.role == ParticipantRole::Seller)
        {
            return Some("this is the deal's last active seller".to_string());
        }
        if target.role.is_buyer_side()
            && deal.has_active_buyer_side()
            && !others_active(&|p| p.role.is_buyer_side())
        {
            return Some("this is the deal's last active buyer or agent".to_string());
        }
        None
    }

    // ── Documents ────────────────────────────────────────────────────

    /// Attach a pending document. A repeat `doc_type` gets the next
    /// version; nothing is ever overwritten.
    pub fn attach_document(
        &self,
        deal: &mut Deal,
        doc_type: &str,
        uploaded_by: UserId,
        actor: &Actor,
    ) -> Result<DocumentId, EngineError> {
        let snapshot = MutationSnapshot::capture(deal);
        let mut document = Document::new(doc_type, uploaded_by);
        document.version = deal.latest_document_version(doc_type) + 1;
        let id = document.id;
        let version = document.version;
        deal.documents.push(document);
        self.ledger.record_document_change(
            deal,
            id,
            format!("'{doc_type}' v{version} uploaded"),
            actor.clone(),
        );

        self.commit(deal, snapshot, LifecycleEventKind::DocumentChanged, actor, || {
            serde_json::json!({ "document": id, "doc_type": doc_type, "version": version, "change": "attached" })
        })?;
        info!(deal = %deal.id, document = %id, doc_type, version, "document attached");
        Ok(id)
    }

    /// Approve or reject a pending document. Rejection requires a reason.
    pub fn review_document(
        &self,
        deal: &mut Deal,
        document: DocumentId,
        approve: bool,
        reviewer: UserId,
        reason: Option<String>,
        actor: &Actor,
    ) -> Result<RosterOutcome, EngineError> {
        let Some(index) = deal.documents.iter().position(|d| d.id == document) else {
            return Ok(RosterOutcome::rejected(vec![format!(
                "no document {document} on this deal"
            )]));
        };
        if deal.documents[index].status != DocumentStatus::Pending {
            return Ok(RosterOutcome::rejected(vec![format!(
                "document {document} has already been reviewed"
            )]));
        }
        if !approve && reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
            return Ok(RosterOutcome::rejected(vec![
                "a reason is required to reject a document".to_string(),
            ]));
        }

        let snapshot = MutationSnapshot::capture(deal);
        let doc = &mut deal.documents[index];
        doc.status = if approve {
            DocumentStatus::Approved
        } else {
            DocumentStatus::Rejected
        };
        doc.review = Some(DocumentReview {
            reviewer,
            reviewed_at: paddock_core::Timestamp::now(),
            rejection_reason: if approve { None } else { reason.clone() },
        });
        let doc_type = doc.doc_type.clone();
        let verdict = if approve { "approved" } else { "rejected" };
        let description = match (&reason, approve) {
            (Some(r), false) => format!("'{doc_type}' {verdict}: {r}"),
            _ => format!("'{doc_type}' {verdict}"),
        };
        self.ledger
            .record_document_change(deal, document, description, actor.clone());

        self.commit(deal, snapshot, LifecycleEventKind::DocumentChanged, actor, || {
            serde_json::json!({ "document": document, "doc_type": doc_type, "change": verdict })
        })?;
        info!(deal = %deal.id, %document, verdict, "document reviewed");
        Ok(RosterOutcome::accepted())
    }

    // ── Commit discipline ────────────────────────────────────────────

    fn commit(
        &self,
        deal: &mut Deal,
        snapshot: MutationSnapshot,
        kind: LifecycleEventKind,
        actor: &Actor,
        payload: impl FnOnce() -> serde_json::Value,
    ) -> Result<(), EngineError> {
        if let Err(persist) = self.store.save(deal) {
            snapshot.restore(deal);
            warn!(deal = %deal.id, error = %persist, "roster mutation rolled back");
            self.sink.emit(&LifecycleEvent::new(
                LifecycleEventKind::TransitionRolledBack,
                deal,
                deal.stage,
                actor.clone(),
                serde_json::json!({ "error": persist.to_string() }),
            ));
            return Err(EngineError::Persistence(persist));
        }
        self.sink.emit(&LifecycleEvent::new(
            kind,
            deal,
            deal.stage,
            actor.clone(),
            payload(),
        ));
        Ok(())
    }
}

/// Pre-mutation state for the roster paths. Captured per call, dropped on
/// return.
struct MutationSnapshot {
    participants: Vec<Participant>,
    documents: Vec<Document>,
    timeline: Vec<TimelineEntry>,
}

impl MutationSnapshot {
    fn capture(deal: &Deal) -> Self {
        Self {
            participants: deal.participants.clone(),
            documents: deal.documents.clone(),
            timeline: deal.timeline.clone(),
        }
    }

    fn restore(self, deal: &mut Deal) {
        deal.participants = self.participants;
        deal.documents = self.documents;
        deal.timeline = self.timeline;
        deal.touch();
    }
}
