//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the paddock stack.
//! These prevent accidental identifier confusion — you cannot pass a
//! `ParticipantId` where a `DealId` is expected.
//!
//! The per-deal lock registry is keyed by `DealId`; identifier hygiene here
//! is what keeps two unrelated deals from ever sharing a lock entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a deal aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub Uuid);

/// Unique identifier for a participant entry within a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

/// Unique identifier for a document attached to a deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

/// Unique identifier for a user record (external to this engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

/// Unique identifier for the horse record a deal references.
///
/// The horse itself lives outside this engine; the engine only carries the
/// reference and checks that it is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HorseId(pub Uuid);

macro_rules! impl_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

impl_id!(DealId, "deal");
impl_id!(ParticipantId, "participant");
impl_id!(DocumentId, "document");
impl_id!(UserId, "user");
impl_id!(HorseId, "horse");
