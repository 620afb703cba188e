//! # paddock-core — Foundational Types for the Deal Workflow Engine
//!
//! This crate is the bedrock of the paddock stack. It defines the primitives
//! every other crate builds on: identifier newtypes, a UTC-only timestamp,
//! the actor type used for audit attribution, and the core error enum.
//! It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `DealId`, `ParticipantId`,
//!    `DocumentId`, `UserId`, `HorseId` — all uuid-backed newtypes. No bare
//!    strings or raw uuids cross a module boundary.
//!
//! 2. **UTC-only timestamps.** The `Timestamp` type enforces UTC with Z
//!    suffix and seconds precision. Non-UTC inputs are rejected at
//!    construction, so ordering and dwell-time arithmetic never straddle
//!    timezone ambiguity.
//!
//! 3. **"system" is a first-class actor.** Automatic ledger entries carry
//!    `Actor::system()` rather than a magic string scattered across crates.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `paddock-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod actor;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use actor::Actor;
pub use error::CoreError;
pub use identity::{DealId, DocumentId, HorseId, ParticipantId, UserId};
pub use temporal::Timestamp;
