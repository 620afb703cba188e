//! # Requirement Validator
//!
//! Stateless rule evaluation over a deal aggregate. Two entry points with
//! deliberately different scopes:
//!
//! - [`RequirementValidator::validate`] — the full health check:
//!   structural checks (fail-fast, `Critical`), then common cross-stage
//!   checks, then the current stage's rule table. Blocking conditions are
//!   attached advisorily.
//! - [`RequirementValidator::validate_stage`] — the narrow transition
//!   gate: the target stage's rule table plus blocking conditions, which
//!   here fail the verdict outright.
//!
//! Call sites choose the scope explicitly; nothing infers it from context.
//!
//! Structural failures short-circuit — there is no point evaluating stage
//! rules against a malformed aggregate. Stage-rule failures are collected
//! exhaustively so the caller gets the complete missing-requirements list
//! in one round-trip.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use paddock_deal::{doc_types, Deal, DealStage, DealStatus, DocumentStatus, ParticipantRole};

use crate::requirement::stage_requirements;

/// How long a deal may sit without timeline activity before the health
/// check warns about it, in seconds (30 days).
pub const STALENESS_THRESHOLD_SECS: i64 = 30 * 24 * 60 * 60;

/// Document types whose rejection is a cross-cutting blocking condition.
const CRITICAL_DOC_TYPES: &[&str] = &[
    doc_types::CONTRACT,
    doc_types::SIGNED_CONTRACT,
    doc_types::TRANSFER_OF_OWNERSHIP,
    doc_types::PAYMENT_CONFIRMATION,
];

// ─── Verdict Types ───────────────────────────────────────────────────

/// How severe a validation error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A rule failed; blocks the specific transition being gated.
    Error,
    /// The aggregate is structurally invalid; always blocks.
    Critical,
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Stable code (the requirement id, or a `structural.`/`common.` code).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// How severe the failure is.
    pub severity: Severity,
}

/// An advisory finding that never blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Stable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// What the caller should do about it.
    pub recommendation: String,
}

/// The structured verdict of a validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the deal passed this pass's checks.
    pub is_valid: bool,
    /// Failed checks, in evaluation order.
    pub errors: Vec<ValidationError>,
    /// Advisory findings.
    pub warnings: Vec<ValidationWarning>,
    /// Human-readable descriptions of unmet requirements.
    pub missing_requirements: Vec<String>,
    /// Actionable next steps, deduplicated.
    pub suggestions: BTreeSet<String>,
    /// Cross-cutting hard stops (see [`RequirementValidator::blocking_conditions`]).
    pub blocking_conditions: Vec<String>,
}

impl ValidationResult {
    fn passing() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            missing_requirements: Vec::new(),
            suggestions: BTreeSet::new(),
            blocking_conditions: Vec::new(),
        }
    }

    /// Whether any error is `Critical`.
    pub fn has_critical(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Critical)
    }

    /// Collect suggestions for the errors and warnings recorded so far.
    fn derive_suggestions(&mut self) {
        for error in &self.errors {
            if let Some(s) = suggestion_for(&error.code) {
                self.suggestions.insert(s.to_string());
            }
        }
        for warning in &self.warnings {
            if let Some(s) = suggestion_for(&warning.code) {
                self.suggestions.insert(s.to_string());
            }
            self.suggestions.insert(warning.recommendation.clone());
        }
    }
}

/// A condensed verdict for callers that only want the headline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Whether the deal satisfies its current stage's requirements.
    pub can_progress: bool,
    /// Everything standing in the way: rule failures and blocking conditions.
    pub blockers: Vec<String>,
    /// Advisory findings from the full health check.
    pub warnings: Vec<String>,
    /// Deduplicated actionable next steps.
    pub recommendations: BTreeSet<String>,
}

// ─── Suggestion Lookup ───────────────────────────────────────────────

/// Fixed code→suggestion mapping. Deterministic: the same code always
/// yields the same suggestion text.
fn suggestion_for(code: &str) -> Option<&'static str> {
    match code {
        "discussion.seller_present" => Some("add the seller as an active participant"),
        "discussion.buyer_side_present" => Some("add a buyer or an agent as an active participant"),
        "discussion.price_positive" => Some("set a positive asking price in the deal terms"),
        "evaluation.inspection_arranged" => {
            Some("schedule an inspection or invite an inspector/veterinarian")
        }
        "evaluation.date_range_ordered" => Some("correct the term dates so the start precedes the end"),
        "evaluation.duration_has_range" => Some("set both start and end dates for the lease/training term"),
        "documentation.contract_approved" => Some("upload the contract and have it approved"),
        "documentation.insurance_bound" => Some("bind an insurance policy for the transaction"),
        "closing.signed_contract" | "complete.signed_contract" => {
            Some("collect signatures and upload the signed contract for approval")
        }
        "closing.payment_confirmed" | "complete.payment_confirmed" => {
            Some("record and approve the payment confirmation")
        }
        "complete.ownership_transferred" => {
            Some("file the transfer-of-ownership document and have it approved")
        }
        "structural.participants_insufficient" | "structural.role_coverage" => {
            Some("ensure the deal has an active seller and an active buyer or agent")
        }
        "common.stage_status_mismatch" => Some("complete the deal's status to match its stage"),
        "common.stale_deal" => Some("follow up with the participants or place the deal on hold"),
        _ => None,
    }
}

// ─── The Validator ───────────────────────────────────────────────────

/// Stateless rule-evaluation engine over deal aggregates.
///
/// Holds no mutable state; all rule tables are static data. Construct one
/// and share it freely.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementValidator;

impl RequirementValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Full health check: structural → common → current-stage rules.
    ///
    /// Structural failures return immediately with `Critical` severity and
    /// no stage rules evaluated. Blocking conditions are attached but do
    /// not flip the verdict here — only a transition gate treats them as
    /// hard stops.
    pub fn validate(&self, deal: &Deal) -> ValidationResult {
        let mut result = ValidationResult::passing();

        self.check_structural(deal, &mut result);
        if result.has_critical() {
            result.is_valid = false;
            result.derive_suggestions();
            debug!(deal = %deal.id, errors = result.errors.len(), "structural validation failed");
            return result;
        }

        self.check_common(deal, &mut result);
        self.check_stage_rules(deal, deal.stage, &mut result);
        result.blocking_conditions = self.blocking_conditions(deal);

        result.is_valid = result.errors.is_empty();
        result.derive_suggestions();
        debug!(
            deal = %deal.id,
            valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "full validation"
        );
        result
    }

    /// Narrow transition gate: the target stage's rules plus blocking
    /// conditions. Rules are evaluated against the deal's *current* field
    /// values — no hypothetical mutation. Blocking conditions fail the
    /// verdict even when every stage rule passes.
    pub fn validate_stage(&self, deal: &Deal, target: DealStage) -> ValidationResult {
        let mut result = ValidationResult::passing();

        self.check_stage_rules(deal, target, &mut result);
        result.blocking_conditions = self.blocking_conditions(deal);

        result.is_valid = result.errors.is_empty() && result.blocking_conditions.is_empty();
        result.derive_suggestions();
        debug!(
            deal = %deal.id,
            target = %target,
            valid = result.is_valid,
            missing = result.missing_requirements.len(),
            "stage validation"
        );
        result
    }

    /// Cross-cutting hard stops, independent of any stage's rule table.
    ///
    /// - A required role (Seller, Buyer/Agent) whose participants are all
    ///   inactive.
    /// - A critical document type whose latest disposition is a rejection
    ///   with no approved version on file.
    pub fn blocking_conditions(&self, deal: &Deal) -> Vec<String> {
        let mut blocking = Vec::new();

        let sellers: Vec<_> = deal
            .participants
            .iter()
            .filter(|p| p.role == ParticipantRole::Seller)
            .collect();
        if !sellers.is_empty() && !sellers.iter().any(|p| p.active) {
            blocking.push("every seller on the deal is inactive".to_string());
        }

        let buyer_side: Vec<_> = deal
            .participants
            .iter()
            .filter(|p| p.role.is_buyer_side())
            .collect();
        if !buyer_side.is_empty() && !buyer_side.iter().any(|p| p.active) {
            blocking.push("every buyer/agent on the deal is inactive".to_string());
        }

        for doc_type in CRITICAL_DOC_TYPES {
            let rejected = deal
                .documents
                .iter()
                .any(|d| d.doc_type == *doc_type && d.status == DocumentStatus::Rejected);
            if rejected && !deal.has_approved_document(doc_type) {
                blocking.push(format!(
                    "critical document '{doc_type}' was rejected and has no approved version"
                ));
            }
        }

        blocking
    }

    /// Condensed verdict: narrow gate for the current stage plus the full
    /// health check's warnings.
    pub fn validation_summary(&self, deal: &Deal) -> ValidationSummary {
        let narrow = self.validate_stage(deal, deal.stage);
        let full = self.validate(deal);

        let mut blockers: Vec<String> =
            narrow.errors.iter().map(|e| e.message.clone()).collect();
        blockers.extend(narrow.blocking_conditions.iter().cloned());

        let mut recommendations = narrow.suggestions;
        recommendations.extend(full.suggestions);

        ValidationSummary {
            can_progress: narrow.is_valid,
            blockers,
            warnings: full.warnings.iter().map(|w| w.message.clone()).collect(),
            recommendations,
        }
    }

    /// What still stands between the deal and its current stage's
    /// requirements. Empty exactly when
    /// `validate_stage(deal, deal.stage).is_valid`.
    pub fn remaining_requirements(&self, deal: &Deal) -> Vec<String> {
        let result = self.validate_stage(deal, deal.stage);
        let mut remaining = result.missing_requirements;
        remaining.extend(result.blocking_conditions);
        remaining
    }

    // ── Internal passes ──────────────────────────────────────────────

    /// Structural checks: the aggregate must reference a subject, carry
    /// usable terms, and have at least two participants covering the
    /// required roles.
    fn check_structural(&self, deal: &Deal, result: &mut ValidationResult) {
        if deal.basic_info.horse.as_uuid().is_nil() {
            result.errors.push(ValidationError {
                code: "structural.subject_missing".into(),
                message: "the deal does not reference a horse record".into(),
                severity: Severity::Critical,
            });
        }

        if deal.terms.currency.is_empty() || !deal.terms.price.is_finite() {
            result.errors.push(ValidationError {
                code: "structural.terms_missing".into(),
                message: "the deal terms are absent or unusable".into(),
                severity: Severity::Critical,
            });
        }

        if deal.participants.len() < 2 {
            result.errors.push(ValidationError {
                code: "structural.participants_insufficient".into(),
                message: "a deal needs at least two participants".into(),
                severity: Severity::Critical,
            });
        } else if !deal.has_required_role_coverage() {
            result.errors.push(ValidationError {
                code: "structural.role_coverage".into(),
                message: "a deal needs an active seller and an active buyer or agent".into(),
                severity: Severity::Critical,
            });
        }
    }

    /// Common checks independent of stage: stage/status consistency and
    /// staleness.
    fn check_common(&self, deal: &Deal, result: &mut ValidationResult) {
        if !deal.stage_status_consistent() {
            result.errors.push(ValidationError {
                code: "common.stage_status_mismatch".into(),
                message: format!(
                    "a deal at stage {} must have status {}, found {}",
                    DealStage::Complete,
                    DealStatus::Completed,
                    deal.status
                ),
                severity: Severity::Error,
            });
        }

        if deal.status == DealStatus::Active {
            let last = deal.last_activity().unwrap_or(deal.created_at);
            let idle = paddock_core::Timestamp::now().seconds_since(last);
            if idle > STALENESS_THRESHOLD_SECS {
                result.warnings.push(ValidationWarning {
                    code: "common.stale_deal".into(),
                    message: format!("no activity on this deal for {} days", idle / 86_400),
                    recommendation: "review whether the deal should be put on hold or cancelled"
                        .into(),
                });
            }
        }
    }

    /// One flat, exhaustive pass over a stage's rule table. Every failing
    /// predicate yields one error and one missing-requirement string;
    /// evaluation never stops early.
    fn check_stage_rules(&self, deal: &Deal, stage: DealStage, result: &mut ValidationResult) {
        for req in stage_requirements(stage) {
            if !(req.predicate)(deal) {
                result.errors.push(ValidationError {
                    code: req.id.to_string(),
                    message: req.error_message.to_string(),
                    severity: Severity::Error,
                });
                result
                    .missing_requirements
                    .push(req.error_message.to_string());
            }
        }
    }
}
