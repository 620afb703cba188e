//! # Lifecycle Event Fan-Out
//!
//! Structured notifications emitted after committed transitions and roster
//! changes. Delivery is fire-and-forget: a sink that drops, panics across
//! its own boundary, or goes nowhere at all never affects the transition
//! that produced the event — the ledger entry is the durable record, the
//! event is a courtesy.
//!
//! Recipients are computed from the deal's active roster at emission time,
//! widened by the roles the target stage makes relevant.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use paddock_core::{Actor, DealId, Timestamp, UserId};
use paddock_deal::{Deal, DealStage, DealStatus, ParticipantRole};

/// What kind of lifecycle event occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEventKind {
    /// A stage transition committed.
    StageChanged,
    /// A status transition committed.
    StatusChanged,
    /// A transition attempt was rejected at the gate, or a committed
    /// transition left the deal failing its full health check. The payload
    /// carries the itemized reasons.
    ValidationFailed,
    /// A committed mutation was undone because persistence failed.
    TransitionRolledBack,
    /// A participant joined, left, or changed activity.
    ParticipantChanged,
    /// A document was attached, re-versioned, or reviewed.
    DocumentChanged,
}

/// A structured notification about a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// What happened.
    pub kind: LifecycleEventKind,
    /// The deal it happened to.
    pub deal: DealId,
    /// Who caused it.
    pub actor: Actor,
    /// Kind-specific payload (old/new values, reasons, error lists).
    pub payload: Value,
    /// The users this event concerns, in roster order, deduplicated.
    pub recipients: Vec<UserId>,
    /// When the event was emitted.
    pub timestamp: Timestamp,
}

impl LifecycleEvent {
    /// Build an event against the deal's current roster and the stage the
    /// event concerns (which may differ from `deal.stage` mid-rollback).
    pub fn new(
        kind: LifecycleEventKind,
        deal: &Deal,
        stage: DealStage,
        actor: Actor,
        payload: Value,
    ) -> Self {
        Self {
            kind,
            deal: deal.id,
            actor,
            payload,
            recipients: recipients_for(deal, stage),
            timestamp: Timestamp::now(),
        }
    }

    /// Payload for a committed stage change.
    pub fn stage_payload(from: DealStage, to: DealStage) -> Value {
        serde_json::json!({ "from": from, "to": to })
    }

    /// Payload for a committed status change.
    pub fn status_payload(from: DealStatus, to: DealStatus, reason: Option<&str>) -> Value {
        serde_json::json!({ "from": from, "to": to, "reason": reason })
    }
}

/// The roles notified regardless of stage: the transacting parties.
const BASE_ROLES: &[ParticipantRole] = &[
    ParticipantRole::Seller,
    ParticipantRole::Buyer,
    ParticipantRole::Agent,
];

/// Extra roles a stage makes relevant.
///
/// Evaluation pulls in the people doing the evaluating; Closing pulls in
/// the transporter who needs to know delivery is imminent. The remaining
/// stages concern only the transacting parties.
fn stage_roles(stage: DealStage) -> &'static [ParticipantRole] {
    match stage {
        DealStage::Evaluation => &[ParticipantRole::Inspector, ParticipantRole::Veterinarian],
        DealStage::Closing => &[ParticipantRole::Transporter],
        DealStage::Initiation
        | DealStage::Discussion
        | DealStage::Documentation
        | DealStage::Complete => &[],
    }
}

/// Active participants whose role is relevant to the given stage, in
/// roster order, deduplicated by user id.
pub fn recipients_for(deal: &Deal, stage: DealStage) -> Vec<UserId> {
    let extra = stage_roles(stage);
    let mut recipients = Vec::new();
    for p in deal.participants.iter().filter(|p| p.active) {
        if BASE_ROLES.contains(&p.role) || extra.contains(&p.role) {
            if !recipients.contains(&p.user) {
                recipients.push(p.user);
            }
        }
    }
    recipients
}

/// Where lifecycle events go.
///
/// `emit` takes a reference and returns nothing: the engine never waits on
/// delivery and never learns whether it happened.
pub trait EventSink: Send + Sync {
    /// Deliver one event. Must not block the caller meaningfully.
    fn emit(&self, event: &LifecycleEvent);
}

/// A sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, event: &LifecycleEvent) {
        debug!(deal = %event.deal, kind = ?event.kind, "event dropped (null sink)");
    }
}

/// A sink that collects events in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Kinds emitted so far, in order.
    pub fn kinds(&self) -> Vec<LifecycleEventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LifecycleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
