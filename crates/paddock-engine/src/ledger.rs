//! # Timeline Ledger
//!
//! Appends audit entries to a deal's bounded timeline and answers questions
//! about it. The timeline is append-only from the caller's point of view;
//! the only removal is the FIFO prune that keeps it at
//! [`MAX_TIMELINE_ENTRIES`], applied synchronously inside every append so
//! the cap holds at all times, not eventually.
//!
//! The ledger owns no state of its own — every method takes the deal it
//! operates on. Typed `record_*` helpers standardize descriptions and
//! metadata so entries for the same kind of event always look the same.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use paddock_core::{Actor, DocumentId, ParticipantId, Timestamp};
use paddock_deal::{
    Deal, DealStage, DealStatus, EntryMetadata, TimelineEntry, TimelineEventType,
    MAX_TIMELINE_ENTRIES,
};

/// Aggregated view of a deal's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSummary {
    /// Entries currently retained (after pruning).
    pub total_entries: usize,
    /// Entry counts keyed by event-type name, sorted.
    pub counts_by_type: BTreeMap<String, usize>,
    /// Entry counts keyed by the stage in effect when written, sorted.
    pub counts_by_stage: BTreeMap<String, usize>,
    /// Timestamp of the oldest retained entry.
    pub first_entry_at: Option<Timestamp>,
    /// Timestamp of the newest entry.
    pub last_entry_at: Option<Timestamp>,
    /// Wall-clock seconds credited to each visited stage, keyed by stage
    /// name. A stage visited twice accumulates both dwells.
    pub secs_by_stage: BTreeMap<String, i64>,
    /// Average of the per-stage totals.
    pub average_stage_secs: Option<i64>,
}

/// Appends to and summarizes deal timelines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimelineLedger;

impl TimelineLedger {
    /// Create a ledger.
    pub fn new() -> Self {
        Self
    }

    /// Append an entry, pruning oldest-first past the cap, and touch the
    /// aggregate.
    pub fn append(&self, deal: &mut Deal, entry: TimelineEntry) {
        deal.timeline.push(entry);
        if deal.timeline.len() > MAX_TIMELINE_ENTRIES {
            let excess = deal.timeline.len() - MAX_TIMELINE_ENTRIES;
            deal.timeline.drain(..excess);
            debug!(deal = %deal.id, pruned = excess, "timeline pruned to cap");
        }
        deal.touch();
    }

    /// Build and append an entry stamped with the deal's current stage and
    /// status.
    pub fn record(
        &self,
        deal: &mut Deal,
        event_type: TimelineEventType,
        description: impl Into<String>,
        actor: Actor,
        metadata: EntryMetadata,
    ) {
        let entry = TimelineEntry::new(
            event_type,
            deal.stage,
            deal.status,
            description,
            actor,
            metadata,
        );
        self.append(deal, entry);
    }

    // ── Typed helpers ────────────────────────────────────────────────

    /// Record a committed stage change. Call after mutating `deal.stage`.
    pub fn record_stage_change(
        &self,
        deal: &mut Deal,
        from: DealStage,
        to: DealStage,
        actor: Actor,
    ) {
        self.record(
            deal,
            TimelineEventType::StageChange,
            format!("stage changed from {from} to {to}"),
            actor,
            EntryMetadata::stage_change(from, to),
        );
    }

    /// Record a committed status change. Call after mutating `deal.status`.
    pub fn record_status_change(
        &self,
        deal: &mut Deal,
        from: DealStatus,
        to: DealStatus,
        reason: Option<String>,
        actor: Actor,
    ) {
        let description = match &reason {
            Some(r) => format!("status changed from {from} to {to}: {r}"),
            None => format!("status changed from {from} to {to}"),
        };
        self.record(
            deal,
            TimelineEventType::StatusChange,
            description,
            actor,
            EntryMetadata::status_change(from, to, reason),
        );
    }

    /// Record a roster change for one participant.
    pub fn record_participant_change(
        &self,
        deal: &mut Deal,
        participant: ParticipantId,
        description: impl Into<String>,
        actor: Actor,
    ) {
        self.record(
            deal,
            TimelineEventType::ParticipantChange,
            description,
            actor,
            EntryMetadata {
                participant_id: Some(participant),
                ..EntryMetadata::default()
            },
        );
    }

    /// Record a document attach, re-version, or review.
    pub fn record_document_change(
        &self,
        deal: &mut Deal,
        document: DocumentId,
        description: impl Into<String>,
        actor: Actor,
    ) {
        self.record(
            deal,
            TimelineEventType::DocumentChange,
            description,
            actor,
            EntryMetadata {
                document_id: Some(document),
                ..EntryMetadata::default()
            },
        );
    }

    /// Record a change to the commercial terms.
    pub fn record_terms_change(&self, deal: &mut Deal, description: impl Into<String>, actor: Actor) {
        self.record(
            deal,
            TimelineEventType::TermsChange,
            description,
            actor,
            EntryMetadata::default(),
        );
    }

    /// Record a change to a logistics sub-record.
    pub fn record_logistics_change(
        &self,
        deal: &mut Deal,
        description: impl Into<String>,
        actor: Actor,
    ) {
        self.record(
            deal,
            TimelineEventType::LogisticsChange,
            description,
            actor,
            EntryMetadata::default(),
        );
    }

    /// Record a free-form comment.
    pub fn record_comment(&self, deal: &mut Deal, comment: impl Into<String>, actor: Actor) {
        self.record(
            deal,
            TimelineEventType::Comment,
            comment,
            actor,
            EntryMetadata::default(),
        );
    }

    /// Record an automatic engine-written note.
    pub fn record_system(&self, deal: &mut Deal, description: impl Into<String>) {
        self.record(
            deal,
            TimelineEventType::System,
            description,
            Actor::system(),
            EntryMetadata {
                automatic: Some(true),
                ..EntryMetadata::default()
            },
        );
    }

    // ── Analytics ────────────────────────────────────────────────────

    /// Aggregate the timeline into a summary.
    ///
    /// Time-in-stage walks the stage-change entries chronologically:
    /// each interval between boundaries is credited to the stage active
    /// before the boundary, and the interval from the last boundary to now
    /// is credited to the current stage. With no stage changes the deal has
    /// spent its whole life in its current stage.
    pub fn summarize(&self, deal: &Deal) -> TimelineSummary {
        let mut counts_by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut counts_by_stage: BTreeMap<String, usize> = BTreeMap::new();
        for entry in &deal.timeline {
            *counts_by_type
                .entry(entry.event_type.as_str().to_string())
                .or_default() += 1;
            *counts_by_stage
                .entry(entry.stage.as_str().to_string())
                .or_default() += 1;
        }

        let (secs_by_stage, average_stage_secs) = self.stage_dwell(deal);
        TimelineSummary {
            total_entries: deal.timeline.len(),
            counts_by_type,
            counts_by_stage,
            first_entry_at: deal.timeline.first().map(|e| e.timestamp),
            last_entry_at: deal.timeline.last().map(|e| e.timestamp),
            secs_by_stage,
            average_stage_secs,
        }
    }

    /// One chronological walk over the stage-change entries. The stage
    /// active before a boundary is seeded from the first boundary's
    /// `previous_stage` metadata, so entries written at other stages do
    /// not disturb the attribution.
    fn stage_dwell(&self, deal: &Deal) -> (BTreeMap<String, i64>, Option<i64>) {
        let now = Timestamp::now();
        let mut secs_by_stage: BTreeMap<String, i64> = BTreeMap::new();
        let mut active = deal
            .timeline
            .iter()
            .find(|e| e.event_type == TimelineEventType::StageChange)
            .and_then(|e| e.metadata.previous_stage)
            .unwrap_or(deal.stage);
        let mut previous_boundary = deal.created_at;

        for entry in &deal.timeline {
            if entry.event_type != TimelineEventType::StageChange {
                continue;
            }
            let interval = entry.timestamp.seconds_since(previous_boundary).max(0);
            *secs_by_stage
                .entry(active.as_str().to_string())
                .or_default() += interval;
            active = entry.metadata.new_stage.unwrap_or(entry.stage);
            previous_boundary = entry.timestamp;
        }
        *secs_by_stage
            .entry(active.as_str().to_string())
            .or_default() += now.seconds_since(previous_boundary).max(0);

        let total: i64 = secs_by_stage.values().sum();
        let average = total / secs_by_stage.len() as i64;
        (secs_by_stage, Some(average))
    }

    // ── Pure filters ─────────────────────────────────────────────────

    /// Entries of one event type, oldest first.
    pub fn entries_of_type<'d>(
        &self,
        deal: &'d Deal,
        event_type: TimelineEventType,
    ) -> Vec<&'d TimelineEntry> {
        deal.timeline
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Entries attributed to one actor, oldest first.
    pub fn entries_by_actor<'d>(&self, deal: &'d Deal, actor: &Actor) -> Vec<&'d TimelineEntry> {
        deal.timeline.iter().filter(|e| &e.actor == actor).collect()
    }

    /// Entries within an inclusive timestamp range, oldest first.
    pub fn entries_between<'d>(
        &self,
        deal: &'d Deal,
        from: Timestamp,
        to: Timestamp,
    ) -> Vec<&'d TimelineEntry> {
        deal.timeline
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp <= to)
            .collect()
    }
}
