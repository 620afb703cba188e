//! # Actor Attribution
//!
//! Every ledger entry and lifecycle event names the actor that caused it.
//! An actor is either a user (by id) or the system itself, for automatic
//! entries such as pruning notices and rollback records.

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// The party responsible for a state change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Actor {
    /// A human (or API) user, identified by their user record.
    User(UserId),
    /// The engine itself — automatic entries.
    System,
}

impl Actor {
    /// The system actor for automatic entries.
    pub fn system() -> Self {
        Self::System
    }

    /// Construct a user actor.
    pub fn user(id: UserId) -> Self {
        Self::User(id)
    }

    /// Whether this is the system actor.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::System => f.write_str("system"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_displays_as_system() {
        assert_eq!(Actor::system().to_string(), "system");
        assert!(Actor::system().is_system());
    }

    #[test]
    fn user_displays_with_prefix() {
        let actor = Actor::user(UserId::new());
        assert!(actor.to_string().starts_with("user:"));
        assert!(!actor.is_system());
    }

    #[test]
    fn serde_roundtrip() {
        let actor = Actor::user(UserId::new());
        let json = serde_json::to_string(&actor).unwrap();
        let back: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(actor, back);
    }
}
