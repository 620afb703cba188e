//! # Terms and Logistics
//!
//! The commercial terms of a deal (price, currency, duration, date range,
//! free-form conditions) and the optional logistics sub-records
//! (transportation, inspection, insurance).

use serde::{Deserialize, Serialize};

use paddock_core::{Timestamp, UserId};

/// The commercial terms of a deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealTerms {
    /// Agreed price. Validation requires this to be positive and finite.
    pub price: f64,
    /// ISO 4217 currency code (not validated here).
    pub currency: String,
    /// Duration in days, for lease/training arrangements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    /// Start of the lease/training period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    /// End of the lease/training period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    /// Free-form negotiated conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

impl DealTerms {
    /// Terms with just a price and currency.
    pub fn new(price: f64, currency: impl Into<String>) -> Self {
        Self {
            price,
            currency: currency.into(),
            duration_days: None,
            start_date: None,
            end_date: None,
            conditions: Vec::new(),
        }
    }

    /// Whether the price is a usable positive number.
    pub fn price_is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }

    /// Whether the date range is ordered. Vacuously true when either
    /// bound is absent.
    pub fn date_range_is_ordered(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start < end,
            _ => true,
        }
    }
}

/// Transportation arrangements for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportPlan {
    /// Carrier or transporter name.
    pub carrier: String,
    /// Scheduled pickup, if booked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<Timestamp>,
    /// Destination description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Inspection arrangements for the evaluation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionPlan {
    /// When the inspection is scheduled.
    pub scheduled_at: Timestamp,
    /// Where the inspection takes place.
    pub location: String,
    /// The inspecting user, once assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector: Option<UserId>,
}

/// Insurance cover for the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    /// Insurer name.
    pub provider: String,
    /// Policy reference.
    pub policy_number: String,
    /// Covered amount, in the deal's currency.
    pub coverage: f64,
}

/// Optional logistics sub-records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logistics {
    /// Transportation arrangements, once made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transportation: Option<TransportPlan>,
    /// Inspection arrangements, once scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspection: Option<InspectionPlan>,
    /// Insurance cover, once bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<InsurancePolicy>,
}
