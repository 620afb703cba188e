//! # Participants
//!
//! The role-tagged parties attached to a deal. Every deal must keep at
//! least one active Seller and one active Buyer-or-Agent — the engine's
//! roster operations enforce that invariant; this module supplies the
//! types and the coverage queries they rely on.

use serde::{Deserialize, Serialize};

use paddock_core::{ParticipantId, Timestamp, UserId};

/// The role a participant plays in a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    /// The party selling the horse.
    Seller,
    /// The party buying the horse.
    Buyer,
    /// An agent acting on behalf of a buyer.
    Agent,
    /// Veterinarian engaged for the evaluation stage.
    Veterinarian,
    /// Trainer consulted on the horse's condition or suitability.
    Trainer,
    /// Independent inspector for the evaluation stage.
    Inspector,
    /// Transporter engaged for delivery at closing.
    Transporter,
}

impl ParticipantRole {
    /// The canonical string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seller => "SELLER",
            Self::Buyer => "BUYER",
            Self::Agent => "AGENT",
            Self::Veterinarian => "VETERINARIAN",
            Self::Trainer => "TRAINER",
            Self::Inspector => "INSPECTOR",
            Self::Transporter => "TRANSPORTER",
        }
    }

    /// Whether this role satisfies the buyer-side coverage requirement.
    pub fn is_buyer_side(&self) -> bool {
        matches!(self, Self::Buyer | Self::Agent)
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded activation/deactivation of a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantStatusChange {
    /// Whether the participant became active.
    pub active: bool,
    /// When the change happened.
    pub timestamp: Timestamp,
    /// Why, if a reason was given.
    pub reason: Option<String>,
}

/// A party attached to a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier of this participant entry.
    pub id: ParticipantId,
    /// The user record this participant refers to.
    pub user: UserId,
    /// The role this participant plays.
    pub role: ParticipantRole,
    /// Free-form permission strings granted to this participant.
    pub permissions: Vec<String>,
    /// Whether the participant is currently active on the deal.
    pub active: bool,
    /// When the participant joined the deal.
    pub joined_at: Timestamp,
    /// History of activation/deactivation changes.
    pub status_history: Vec<ParticipantStatusChange>,
}

impl Participant {
    /// Create a new active participant with no permissions.
    pub fn new(user: UserId, role: ParticipantRole) -> Self {
        Self {
            id: ParticipantId::new(),
            user,
            role,
            permissions: Vec::new(),
            active: true,
            joined_at: Timestamp::now(),
            status_history: Vec::new(),
        }
    }

    /// Set the active flag, recording the change in the history.
    pub fn set_active(&mut self, active: bool, reason: Option<String>) {
        self.active = active;
        self.status_history.push(ParticipantStatusChange {
            active,
            timestamp: Timestamp::now(),
            reason,
        });
    }
}
