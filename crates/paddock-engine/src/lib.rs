//! # paddock-engine — The Deal Workflow Engine
//!
//! Drives deal aggregates through their dual state machine and keeps the
//! audit trail honest. The pieces:
//!
//! - [`requirement`] / [`validator`] — data-driven stage rule tables and
//!   the validator that evaluates them, with structural fail-fast and
//!   cross-cutting blocking conditions.
//! - [`stage`] / [`status`] — the two transition engines. Check first,
//!   then snapshot, mutate, append, persist, notify; persistence failure
//!   rolls back the snapshot.
//! - [`ledger`] — bounded append path and analytics over the timeline.
//! - [`events`] — lifecycle event fan-out to an [`events::EventSink`],
//!   fire-and-forget.
//! - [`roster`] — audited participant and document mutations, including
//!   the role-coverage invariant.
//! - [`workflow`] — the [`workflow::DealEngine`] facade wiring it all to
//!   one store and sink.
//! - [`coordinator`] — per-deal locking for callers sharing deals across
//!   threads.
//!
//! Rule rejections are structured outcomes (`accepted == false` with
//! itemized reasons), never `Err`; [`error::EngineError`] is reserved for
//! persistence failure, poisoned locks, and unknown deal ids.

pub mod coordinator;
pub mod error;
pub mod events;
pub mod ledger;
pub mod requirement;
pub mod roster;
pub mod stage;
pub mod status;
pub mod store;
pub mod validator;
pub mod workflow;

pub use coordinator::DealCoordinator;
pub use error::EngineError;
pub use events::{
    EventSink, LifecycleEvent, LifecycleEventKind, MemorySink, NullSink,
};
pub use ledger::{TimelineLedger, TimelineSummary};
pub use requirement::{stage_requirements, RequirementKind, StageRequirement};
pub use roster::{RosterEngine, RosterOutcome};
pub use stage::{StageChangeOutcome, StageTransitionEngine};
pub use status::{StatusChangeOutcome, StatusTransitionEngine, REACTIVATION_DWELL_SECS};
pub use store::{DealStore, MemoryStore, NullStore, PersistError};
pub use validator::{
    RequirementValidator, Severity, ValidationError, ValidationResult, ValidationSummary,
    ValidationWarning,
};
pub use workflow::DealEngine;
