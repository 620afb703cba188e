//! # Timeline Entries
//!
//! The audit records that make up a deal's timeline. The timeline is the
//! single source of truth for what happened to a deal and when — nothing
//! else in the system records history. The ledger in `paddock-engine`
//! appends these; this module only defines the shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use paddock_core::{Actor, DocumentId, ParticipantId, Timestamp};

use crate::stage::DealStage;
use crate::status::DealStatus;

/// The kind of event a timeline entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineEventType {
    /// The business stage changed.
    StageChange,
    /// The operational status changed.
    StatusChange,
    /// A participant was added, removed, activated, or deactivated.
    ParticipantChange,
    /// A document was attached, re-versioned, approved, or rejected.
    DocumentChange,
    /// The commercial terms changed.
    TermsChange,
    /// A logistics sub-record changed.
    LogisticsChange,
    /// A free-form comment.
    Comment,
    /// An automatic entry written by the engine itself.
    System,
}

impl TimelineEventType {
    /// The canonical string name of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StageChange => "STAGE_CHANGE",
            Self::StatusChange => "STATUS_CHANGE",
            Self::ParticipantChange => "PARTICIPANT_CHANGE",
            Self::DocumentChange => "DOCUMENT_CHANGE",
            Self::TermsChange => "TERMS_CHANGE",
            Self::LogisticsChange => "LOGISTICS_CHANGE",
            Self::Comment => "COMMENT",
            Self::System => "SYSTEM",
        }
    }
}

impl std::fmt::Display for TimelineEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured metadata attached to a timeline entry.
///
/// All fields are optional; each helper on the ledger fills in the ones
/// that apply. Absent fields are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Stage before a stage change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_stage: Option<DealStage>,
    /// Stage after a stage change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_stage: Option<DealStage>,
    /// Status before a status change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<DealStatus>,
    /// Status after a status change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<DealStatus>,
    /// Human-supplied reason for the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the entry was written automatically by the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic: Option<bool>,
    /// The document a document-change entry refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    /// The participant a participant-change entry refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<ParticipantId>,
}

impl EntryMetadata {
    /// Metadata for a stage change.
    pub fn stage_change(previous: DealStage, new: DealStage) -> Self {
        Self {
            previous_stage: Some(previous),
            new_stage: Some(new),
            ..Self::default()
        }
    }

    /// Metadata for a status change.
    pub fn status_change(previous: DealStatus, new: DealStatus, reason: Option<String>) -> Self {
        Self {
            previous_status: Some(previous),
            new_status: Some(new),
            reason,
            ..Self::default()
        }
    }
}

/// A single audit record in a deal's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Unique identifier of this entry.
    pub id: Uuid,
    /// What kind of event this records.
    pub event_type: TimelineEventType,
    /// The business stage in effect when the entry was written.
    pub stage: DealStage,
    /// The operational status in effect when the entry was written.
    pub status: DealStatus,
    /// When the entry was written.
    pub timestamp: Timestamp,
    /// Human-readable description of what happened.
    pub description: String,
    /// Who caused the event. `Actor::System` for automatic entries.
    pub actor: Actor,
    /// Structured metadata.
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl TimelineEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        event_type: TimelineEventType,
        stage: DealStage,
        status: DealStatus,
        description: impl Into<String>,
        actor: Actor,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            stage,
            status,
            timestamp: Timestamp::now(),
            description: description.into(),
            actor,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_metadata_defaults_are_empty() {
        let meta = EntryMetadata::default();
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn stage_change_metadata() {
        let meta = EntryMetadata::stage_change(DealStage::Initiation, DealStage::Discussion);
        assert_eq!(meta.previous_stage, Some(DealStage::Initiation));
        assert_eq!(meta.new_stage, Some(DealStage::Discussion));
        assert!(meta.reason.is_none());
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = TimelineEntry::new(
            TimelineEventType::Comment,
            DealStage::Discussion,
            DealStatus::Active,
            "price countered at 11k",
            Actor::system(),
            EntryMetadata::default(),
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: TimelineEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
