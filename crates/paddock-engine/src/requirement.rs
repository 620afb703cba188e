//! # Stage Requirement Tables
//!
//! The typed, predicate-backed rules gating entry into each stage. Rules
//! are data, not code paths: each stage owns an ordered static table of
//! [`StageRequirement`] records, and the validator makes one flat pass over
//! the table for the stage it is asked about, collecting every failure.
//!
//! `depends_on` is a declarative hint linking related rules for callers
//! that render requirement checklists — it does not reorder or gate
//! evaluation.
//!
//! Predicates are pure functions over an immutable deal reference. Nothing
//! here mutates, logs, or performs I/O.

use paddock_deal::{doc_types, Deal, DealStage, ParticipantRole};
use serde::{Deserialize, Serialize};

/// The kind of condition a requirement expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    /// An approved document of a given type must exist.
    Document,
    /// A participant with a given role must be active.
    Participant,
    /// Something must have been reviewed and approved.
    Approval,
    /// Payment must be confirmed.
    Payment,
    /// An inspection must be arranged or reported.
    Inspection,
    /// A signature must be on file.
    Signature,
    /// Any other predicate over the deal's fields.
    Condition,
}

/// A single rule gating entry into a stage.
pub struct StageRequirement {
    /// Stable identifier, also used as the error code.
    pub id: &'static str,
    /// What kind of condition this is.
    pub kind: RequirementKind,
    /// The predicate; `false` means the requirement is unmet.
    pub predicate: fn(&Deal) -> bool,
    /// Human-readable description of the unmet requirement.
    pub error_message: &'static str,
    /// Declarative hints linking prerequisite rule ids.
    pub depends_on: &'static [&'static str],
}

impl std::fmt::Debug for StageRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRequirement")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// The ordered requirement table for a stage.
///
/// `Initiation` has no entry rules: it is the starting stage and the only
/// way back into it is from Discussion, which needs no gate beyond the
/// adjacency table.
pub fn stage_requirements(stage: DealStage) -> &'static [StageRequirement] {
    match stage {
        DealStage::Initiation => &[],
        DealStage::Discussion => DISCUSSION_REQUIREMENTS,
        DealStage::Evaluation => EVALUATION_REQUIREMENTS,
        DealStage::Documentation => DOCUMENTATION_REQUIREMENTS,
        DealStage::Closing => CLOSING_REQUIREMENTS,
        DealStage::Complete => COMPLETE_REQUIREMENTS,
    }
}

// ─── Predicates ──────────────────────────────────────────────────────

fn has_active_seller(deal: &Deal) -> bool {
    deal.has_active_role(ParticipantRole::Seller)
}

fn has_active_buyer_side(deal: &Deal) -> bool {
    deal.has_active_buyer_side()
}

fn price_is_positive(deal: &Deal) -> bool {
    deal.terms.price_is_valid()
}

fn date_range_ordered(deal: &Deal) -> bool {
    deal.terms.date_range_is_ordered()
}

fn duration_terms_have_range(deal: &Deal) -> bool {
    // Lease/training terms carry a duration; when they do, both bounds of
    // the date range are required.
    match deal.terms.duration_days {
        Some(_) => deal.terms.start_date.is_some() && deal.terms.end_date.is_some(),
        None => true,
    }
}

fn inspection_arranged(deal: &Deal) -> bool {
    deal.logistics.inspection.is_some()
        || deal.has_active_role(ParticipantRole::Inspector)
        || deal.has_active_role(ParticipantRole::Veterinarian)
}

fn contract_approved(deal: &Deal) -> bool {
    deal.has_approved_document(doc_types::CONTRACT)
}

fn insurance_bound(deal: &Deal) -> bool {
    deal.logistics.insurance.is_some()
}

fn signed_contract_approved(deal: &Deal) -> bool {
    deal.has_approved_document(doc_types::SIGNED_CONTRACT)
}

fn payment_confirmed(deal: &Deal) -> bool {
    deal.has_approved_document(doc_types::PAYMENT_CONFIRMATION)
}

fn ownership_transferred(deal: &Deal) -> bool {
    deal.has_approved_document(doc_types::TRANSFER_OF_OWNERSHIP)
}

// ─── Tables ──────────────────────────────────────────────────────────

static DISCUSSION_REQUIREMENTS: &[StageRequirement] = &[
    StageRequirement {
        id: "discussion.seller_present",
        kind: RequirementKind::Participant,
        predicate: has_active_seller,
        error_message: "an active seller is required before discussion can begin",
        depends_on: &[],
    },
    StageRequirement {
        id: "discussion.buyer_side_present",
        kind: RequirementKind::Participant,
        predicate: has_active_buyer_side,
        error_message: "an active buyer or agent is required before discussion can begin",
        depends_on: &[],
    },
    StageRequirement {
        id: "discussion.price_positive",
        kind: RequirementKind::Condition,
        predicate: price_is_positive,
        error_message: "the asking price must be a positive amount",
        depends_on: &[],
    },
];

static EVALUATION_REQUIREMENTS: &[StageRequirement] = &[
    StageRequirement {
        id: "evaluation.inspection_arranged",
        kind: RequirementKind::Inspection,
        predicate: inspection_arranged,
        error_message:
            "an inspection must be scheduled or an inspector/veterinarian must join the deal",
        depends_on: &["discussion.buyer_side_present"],
    },
    StageRequirement {
        id: "evaluation.date_range_ordered",
        kind: RequirementKind::Condition,
        predicate: date_range_ordered,
        error_message: "the term start date must precede the end date",
        depends_on: &[],
    },
    StageRequirement {
        id: "evaluation.duration_has_range",
        kind: RequirementKind::Condition,
        predicate: duration_terms_have_range,
        error_message: "lease or training terms require both a start and an end date",
        depends_on: &[],
    },
];

static DOCUMENTATION_REQUIREMENTS: &[StageRequirement] = &[
    StageRequirement {
        id: "documentation.contract_approved",
        kind: RequirementKind::Document,
        predicate: contract_approved,
        error_message: "an approved contract document is required",
        depends_on: &[],
    },
    StageRequirement {
        id: "documentation.insurance_bound",
        kind: RequirementKind::Condition,
        predicate: insurance_bound,
        error_message: "insurance cover must be in place before documentation can close",
        depends_on: &[],
    },
];

static CLOSING_REQUIREMENTS: &[StageRequirement] = &[
    StageRequirement {
        id: "closing.signed_contract",
        kind: RequirementKind::Signature,
        predicate: signed_contract_approved,
        error_message: "an approved signed contract is required for closing",
        depends_on: &["documentation.contract_approved"],
    },
    StageRequirement {
        id: "closing.payment_confirmed",
        kind: RequirementKind::Payment,
        predicate: payment_confirmed,
        error_message: "an approved payment confirmation is required for closing",
        depends_on: &[],
    },
];

static COMPLETE_REQUIREMENTS: &[StageRequirement] = &[
    StageRequirement {
        id: "complete.signed_contract",
        kind: RequirementKind::Signature,
        predicate: signed_contract_approved,
        error_message: "an approved signed contract is required to complete the deal",
        depends_on: &["closing.signed_contract"],
    },
    StageRequirement {
        id: "complete.payment_confirmed",
        kind: RequirementKind::Payment,
        predicate: payment_confirmed,
        error_message: "an approved payment confirmation is required to complete the deal",
        depends_on: &["closing.payment_confirmed"],
    },
    StageRequirement {
        id: "complete.ownership_transferred",
        kind: RequirementKind::Document,
        predicate: ownership_transferred,
        error_message: "an approved transfer-of-ownership document is required to complete the deal",
        depends_on: &[],
    },
];
