//! # paddock-deal — The Deal Aggregate and Its Value Types
//!
//! Defines the data model the workflow engine operates on: the `Deal`
//! aggregate root, the dual state-machine enums (`DealStage`, `DealStatus`)
//! with their adjacency and compatibility tables, participants, documents,
//! terms, logistics, and timeline entries.
//!
//! ## The Dual State Machine
//!
//! A deal carries two independent states:
//!
//! - **Stage** — the business-process phase
//!   (`Initiation → … → Complete`), gated by requirements.
//! - **Status** — the operational state
//!   (`Active`, `OnHold`, `Pending`, `Cancelled`, `Completed`).
//!
//! The legal moves for each live here as explicit tables
//! ([`DealStage::allowed_targets`], [`DealStatus::allowed_targets`]) along
//! with the stage→status compatibility table
//! ([`DealStage::compatible_statuses`]). The engines in `paddock-engine`
//! consult these tables — the tables themselves carry no behavior.
//!
//! This crate holds shapes and pure queries only. Every mutation that must
//! leave an audit trail goes through `paddock-engine`.

pub mod deal;
pub mod document;
pub mod participant;
pub mod stage;
pub mod status;
pub mod terms;
pub mod timeline;

// ─── Aggregate re-exports ───────────────────────────────────────────

pub use deal::{BasicInfo, Deal, MAX_TIMELINE_ENTRIES};

// ─── State machine re-exports ───────────────────────────────────────

pub use stage::DealStage;
pub use status::DealStatus;

// ─── Value type re-exports ──────────────────────────────────────────

pub use document::{doc_types, Document, DocumentReview, DocumentStatus};
pub use participant::{Participant, ParticipantRole, ParticipantStatusChange};
pub use terms::{DealTerms, InspectionPlan, InsurancePolicy, Logistics, TransportPlan};
pub use timeline::{EntryMetadata, TimelineEntry, TimelineEventType};
