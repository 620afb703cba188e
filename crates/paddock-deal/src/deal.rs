//! # The Deal Aggregate
//!
//! A multi-party transaction moving through the stage/status dual state
//! machine. The aggregate is handed to the engine fully loaded; the engine
//! mutates it only through the transition engines and the roster/document
//! paths, each of which appends a timeline entry.
//!
//! ## Structural Invariant
//!
//! `stage == Complete ⇒ status == Completed`. The check is one-directional:
//! a `Completed` status implies stage `Complete` only when reached through
//! normal progression, so only the forward direction is asserted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use paddock_core::{DealId, HorseId, Timestamp};

use crate::document::Document;
use crate::participant::{Participant, ParticipantRole};
use crate::stage::DealStage;
use crate::status::DealStatus;
use crate::terms::{DealTerms, Logistics};
use crate::timeline::{TimelineEntry, TimelineEventType};

/// Maximum number of timeline entries retained per deal.
///
/// Appending beyond this prunes the oldest entries first. Reverse scans
/// over the timeline stay cheap because of this cap.
pub const MAX_TIMELINE_ENTRIES: usize = 100;

/// Descriptive information about the subject of the deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicInfo {
    /// The horse record this deal is about. Lives outside the engine.
    pub horse: HorseId,
    /// Short human-readable title.
    pub title: String,
    /// Descriptive tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A multi-party transaction (the aggregate root).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    /// Unique identifier.
    pub id: DealId,
    /// Current business stage.
    pub stage: DealStage,
    /// Current operational status.
    pub status: DealStatus,
    /// Subject reference and descriptive tags.
    pub basic_info: BasicInfo,
    /// Commercial terms.
    pub terms: DealTerms,
    /// Role-tagged parties, in join order.
    pub participants: Vec<Participant>,
    /// Attached documents.
    pub documents: Vec<Document>,
    /// Optional logistics sub-records.
    #[serde(default)]
    pub logistics: Logistics,
    /// Bounded, append-mostly audit timeline.
    pub timeline: Vec<TimelineEntry>,
    /// Free-form extension bag (attached comments live here, out of scope
    /// for the engine).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
    /// When the deal was created.
    pub created_at: Timestamp,
    /// When the deal was last mutated.
    pub updated_at: Timestamp,
}

impl Deal {
    /// Create a deal at `Initiation`/`Pending` with no participants.
    ///
    /// Creation is out of scope for the engine; this constructor exists for
    /// callers and tests assembling aggregates.
    pub fn new(basic_info: BasicInfo, terms: DealTerms) -> Self {
        let now = Timestamp::now();
        Self {
            id: DealId::new(),
            stage: DealStage::Initiation,
            status: DealStatus::Pending,
            basic_info,
            terms,
            participants: Vec::new(),
            documents: Vec::new(),
            logistics: Logistics::default(),
            timeline: Vec::new(),
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ── Participant queries ──────────────────────────────────────────

    /// Active participants with the given role.
    pub fn active_with_role(&self, role: ParticipantRole) -> impl Iterator<Item = &Participant> {
        self.participants
            .iter()
            .filter(move |p| p.active && p.role == role)
    }

    /// Whether at least one active participant has the given role.
    pub fn has_active_role(&self, role: ParticipantRole) -> bool {
        self.active_with_role(role).next().is_some()
    }

    /// Whether at least one active participant covers the buyer side
    /// (Buyer or Agent).
    pub fn has_active_buyer_side(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.active && p.role.is_buyer_side())
    }

    /// Whether the mandatory role coverage holds: at least one active
    /// Seller and at least one active Buyer-or-Agent.
    pub fn has_required_role_coverage(&self) -> bool {
        self.has_active_role(ParticipantRole::Seller) && self.has_active_buyer_side()
    }

    // ── Document queries ─────────────────────────────────────────────

    /// The highest-version approved document of the given type, if any.
    pub fn approved_document(&self, doc_type: &str) -> Option<&Document> {
        self.documents
            .iter()
            .filter(|d| d.doc_type == doc_type && d.is_approved())
            .max_by_key(|d| d.version)
    }

    /// Whether an approved document of the given type exists.
    pub fn has_approved_document(&self, doc_type: &str) -> bool {
        self.approved_document(doc_type).is_some()
    }

    /// The latest version number among documents of the given type, or 0.
    pub fn latest_document_version(&self, doc_type: &str) -> u32 {
        self.documents
            .iter()
            .filter(|d| d.doc_type == doc_type)
            .map(|d| d.version)
            .max()
            .unwrap_or(0)
    }

    // ── Timeline queries ─────────────────────────────────────────────

    /// The most recent timeline entry matching `pred` — a single reverse
    /// scan, never a reversal.
    pub fn last_entry_where<F>(&self, pred: F) -> Option<&TimelineEntry>
    where
        F: Fn(&TimelineEntry) -> bool,
    {
        self.timeline.iter().rev().find(|e| pred(e))
    }

    /// The most recent entry of the given event type.
    pub fn last_entry_of(&self, event_type: TimelineEventType) -> Option<&TimelineEntry> {
        self.last_entry_where(|e| e.event_type == event_type)
    }

    /// Timestamp of the most recent timeline activity, if any.
    pub fn last_activity(&self) -> Option<Timestamp> {
        self.timeline.last().map(|e| e.timestamp)
    }

    // ── Invariants ───────────────────────────────────────────────────

    /// The one-directional structural invariant:
    /// `stage == Complete ⇒ status == Completed`.
    pub fn stage_status_consistent(&self) -> bool {
        self.stage != DealStage::Complete || self.status == DealStatus::Completed
    }

    /// Mark the aggregate as mutated now.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
