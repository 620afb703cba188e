//! # Documents
//!
//! Documents attached to a deal. Documents are never deleted — a superseded
//! document gets a new version, a bad one gets rejected with a reason.
//! Required-document checks elsewhere always filter on
//! `(doc_type, status == Approved)`.

use serde::{Deserialize, Serialize};

use paddock_core::{DocumentId, Timestamp, UserId};

/// Well-known document type tags.
///
/// `doc_type` is a free-form string; these constants name the types the
/// requirement tables and the completion gate look for.
pub mod doc_types {
    /// The draft/negotiated sale contract.
    pub const CONTRACT: &str = "contract";
    /// The fully signed contract.
    pub const SIGNED_CONTRACT: &str = "signed_contract";
    /// Transfer-of-ownership record.
    pub const TRANSFER_OF_OWNERSHIP: &str = "transfer_of_ownership";
    /// Confirmation of payment.
    pub const PAYMENT_CONFIRMATION: &str = "payment_confirmation";
    /// Inspection report from the evaluation stage.
    pub const INSPECTION_REPORT: &str = "inspection_report";
}

/// The approval status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Uploaded, awaiting review.
    Pending,
    /// Reviewed and approved.
    Approved,
    /// Reviewed and rejected; see the review record for the reason.
    Rejected,
}

impl DocumentStatus {
    /// The canonical string name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review metadata recorded when a document is approved or rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReview {
    /// Who reviewed the document.
    pub reviewer: UserId,
    /// When the review happened.
    pub reviewed_at: Timestamp,
    /// Why the document was rejected, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// A document attached to a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier of this document.
    pub id: DocumentId,
    /// Free-form type tag (see [`doc_types`] for the well-known values).
    pub doc_type: String,
    /// Current approval status.
    pub status: DocumentStatus,
    /// Version number, starting at 1. Re-uploads bump this.
    pub version: u32,
    /// Who uploaded the document.
    pub uploaded_by: UserId,
    /// When the document was uploaded.
    pub uploaded_at: Timestamp,
    /// Review metadata, once reviewed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<DocumentReview>,
}

impl Document {
    /// Create a new pending document at version 1.
    pub fn new(doc_type: impl Into<String>, uploaded_by: UserId) -> Self {
        Self {
            id: DocumentId::new(),
            doc_type: doc_type.into(),
            status: DocumentStatus::Pending,
            version: 1,
            uploaded_by,
            uploaded_at: Timestamp::now(),
            review: None,
        }
    }

    /// Whether this document counts toward a required-document check.
    pub fn is_approved(&self) -> bool {
        self.status == DocumentStatus::Approved
    }
}
