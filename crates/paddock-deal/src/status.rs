//! # Operational Status
//!
//! The operational state of a deal, independent of its business stage.
//! A deal in Documentation can be on hold; a deal in Discussion can be
//! cancelled outright.
//!
//! ## Allowed Transitions
//!
//! ```text
//! PENDING ──▶ ACTIVE ──▶ ON_HOLD ──▶ ACTIVE (reactivation)
//!    │          │  │        │
//!    │          │  └──▶ COMPLETED (terminal)
//!    └──────────┴──┬────────┘
//!                  ▼
//!              CANCELLED (terminal)
//! ```

use serde::{Deserialize, Serialize};

/// The operational status of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// The deal is live and progressing.
    Active,
    /// Temporarily paused; expected to resume.
    OnHold,
    /// Created but not yet activated.
    Pending,
    /// Abandoned. Terminal.
    Cancelled,
    /// Successfully concluded. Terminal.
    Completed,
}

impl DealStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::OnHold => "ON_HOLD",
            Self::Pending => "PENDING",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Whether this status is terminal (no outgoing edges).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// The statuses reachable from this one in a single transition.
    pub fn allowed_targets(&self) -> &'static [DealStatus] {
        match self {
            Self::Active => &[Self::OnHold, Self::Cancelled, Self::Completed],
            Self::OnHold => &[Self::Active, Self::Cancelled],
            Self::Pending => &[Self::Active, Self::Cancelled],
            Self::Cancelled => &[],
            Self::Completed => &[],
        }
    }

    /// Whether `target` is reachable from this status in one transition.
    pub fn can_transition_to(&self, target: DealStatus) -> bool {
        self.allowed_targets().contains(&target)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_edges() {
        assert!(DealStatus::Active.can_transition_to(DealStatus::OnHold));
        assert!(DealStatus::Active.can_transition_to(DealStatus::Cancelled));
        assert!(DealStatus::Active.can_transition_to(DealStatus::Completed));
        assert!(!DealStatus::Active.can_transition_to(DealStatus::Pending));
    }

    #[test]
    fn on_hold_edges() {
        assert!(DealStatus::OnHold.can_transition_to(DealStatus::Active));
        assert!(DealStatus::OnHold.can_transition_to(DealStatus::Cancelled));
        assert!(!DealStatus::OnHold.can_transition_to(DealStatus::Completed));
    }

    #[test]
    fn pending_edges() {
        assert!(DealStatus::Pending.can_transition_to(DealStatus::Active));
        assert!(DealStatus::Pending.can_transition_to(DealStatus::Cancelled));
        assert!(!DealStatus::Pending.can_transition_to(DealStatus::OnHold));
        assert!(!DealStatus::Pending.can_transition_to(DealStatus::Completed));
    }

    #[test]
    fn terminal_statuses_have_no_edges() {
        assert!(DealStatus::Cancelled.is_terminal());
        assert!(DealStatus::Completed.is_terminal());
        assert!(DealStatus::Cancelled.allowed_targets().is_empty());
        assert!(DealStatus::Completed.allowed_targets().is_empty());
    }

    #[test]
    fn serde_rename() {
        assert_eq!(
            serde_json::to_string(&DealStatus::OnHold).unwrap(),
            "\"ON_HOLD\""
        );
        let back: DealStatus = serde_json::from_str("\"ON_HOLD\"").unwrap();
        assert_eq!(back, DealStatus::OnHold);
    }
}
