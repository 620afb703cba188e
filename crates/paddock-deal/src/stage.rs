//! # Business Stages
//!
//! The six ordered stages a deal moves through, and the adjacency table
//! that constrains movement between them.
//!
//! ## Stages
//!
//! ```text
//! INITIATION ⇄ DISCUSSION ⇄ EVALUATION ⇄ DOCUMENTATION ⇄ CLOSING ──▶ COMPLETE
//! ```
//!
//! Movement is one neighbor at a time, forward or backward — no skipping.
//! The legal moves are an explicit table, not index arithmetic: Discussion
//! and Evaluation connect back to Initiation and Discussion respectively
//! because the table says so, and `Complete` has no outgoing edges at all.
//! A new variant added here forces every `match` below to be revisited;
//! no wildcard arms are used.

use serde::{Deserialize, Serialize};

use crate::status::DealStatus;

/// The business-process stage of a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStage {
    /// Parties are being brought together; the deal exists but little else.
    Initiation,
    /// Terms are being negotiated between the parties.
    Discussion,
    /// The horse is being evaluated — inspection, veterinary review.
    Evaluation,
    /// Contracts and supporting documents are being prepared and approved.
    Documentation,
    /// Signatures, payment, and transfer of ownership.
    Closing,
    /// The deal is done. Terminal.
    Complete,
}

impl DealStage {
    /// The canonical string name of this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initiation => "INITIATION",
            Self::Discussion => "DISCUSSION",
            Self::Evaluation => "EVALUATION",
            Self::Documentation => "DOCUMENTATION",
            Self::Closing => "CLOSING",
            Self::Complete => "COMPLETE",
        }
    }

    /// Whether this stage is terminal (no outgoing edges).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The stages reachable from this one in a single transition.
    ///
    /// This is the doubly-linked adjacency table. `Complete` returns the
    /// empty slice — a transition attempt from it always fails.
    pub fn allowed_targets(&self) -> &'static [DealStage] {
        match self {
            Self::Initiation => &[Self::Discussion],
            Self::Discussion => &[Self::Initiation, Self::Evaluation],
            Self::Evaluation => &[Self::Discussion, Self::Documentation],
            Self::Documentation => &[Self::Evaluation, Self::Closing],
            Self::Closing => &[Self::Documentation, Self::Complete],
            Self::Complete => &[],
        }
    }

    /// Whether `target` is reachable from this stage in one transition.
    pub fn can_transition_to(&self, target: DealStage) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// The operational statuses compatible with this stage.
    ///
    /// `Complete` only ever pairs with `Completed`; every other stage
    /// permits the non-final statuses but never `Completed`.
    pub fn compatible_statuses(&self) -> &'static [DealStatus] {
        match self {
            Self::Initiation
            | Self::Discussion
            | Self::Evaluation
            | Self::Documentation
            | Self::Closing => &[
                DealStatus::Active,
                DealStatus::OnHold,
                DealStatus::Pending,
                DealStatus::Cancelled,
            ],
            Self::Complete => &[DealStatus::Completed],
        }
    }

    /// Whether `status` may coexist with this stage.
    pub fn permits_status(&self, status: DealStatus) -> bool {
        self.compatible_statuses().contains(&status)
    }

    /// All stages in progression order.
    pub const ALL: [DealStage; 6] = [
        Self::Initiation,
        Self::Discussion,
        Self::Evaluation,
        Self::Documentation,
        Self::Closing,
        Self::Complete,
    ];
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
