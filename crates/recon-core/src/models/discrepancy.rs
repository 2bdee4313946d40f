//! Discrepancy model
//!
//! A typed finding produced by the classifier or the hung-call detector.
//! `cost_difference` is always signed: positive means side A billed more
//! than side B.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discrepancy classification
///
/// The declaration order is the display order of the final report; keep it
/// in sync with `rank()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    MissingInA,
    LrnMismatch,
    DurationMismatch,
    RateMismatch,
    CostMismatch,
    MissingInB,
    ZeroDurationInA,
    ZeroDurationInB,
    HungCallYours,
    HungCallProvider,
}

impl DiscrepancyType {
    /// All types, in display order
    pub const ALL: [DiscrepancyType; 10] = [
        DiscrepancyType::MissingInA,
        DiscrepancyType::LrnMismatch,
        DiscrepancyType::DurationMismatch,
        DiscrepancyType::RateMismatch,
        DiscrepancyType::CostMismatch,
        DiscrepancyType::MissingInB,
        DiscrepancyType::ZeroDurationInA,
        DiscrepancyType::ZeroDurationInB,
        DiscrepancyType::HungCallYours,
        DiscrepancyType::HungCallProvider,
    ];

    /// Position in the display order
    pub fn rank(&self) -> usize {
        match self {
            DiscrepancyType::MissingInA => 0,
            DiscrepancyType::LrnMismatch => 1,
            DiscrepancyType::DurationMismatch => 2,
            DiscrepancyType::RateMismatch => 3,
            DiscrepancyType::CostMismatch => 4,
            DiscrepancyType::MissingInB => 5,
            DiscrepancyType::ZeroDurationInA => 6,
            DiscrepancyType::ZeroDurationInB => 7,
            DiscrepancyType::HungCallYours => 8,
            DiscrepancyType::HungCallProvider => 9,
        }
    }

    /// Stable snake_case tag, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancyType::MissingInA => "missing_in_a",
            DiscrepancyType::LrnMismatch => "lrn_mismatch",
            DiscrepancyType::DurationMismatch => "duration_mismatch",
            DiscrepancyType::RateMismatch => "rate_mismatch",
            DiscrepancyType::CostMismatch => "cost_mismatch",
            DiscrepancyType::MissingInB => "missing_in_b",
            DiscrepancyType::ZeroDurationInA => "zero_duration_in_a",
            DiscrepancyType::ZeroDurationInB => "zero_duration_in_b",
            DiscrepancyType::HungCallYours => "hung_call_yours",
            DiscrepancyType::HungCallProvider => "hung_call_provider",
        }
    }
}

/// One reconciliation finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Classification of this finding
    #[serde(rename = "type")]
    pub kind: DiscrepancyType,

    /// Calling party number
    pub a_number: String,

    /// Called party number
    pub b_number: String,

    /// Seize instant, epoch seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seize_time: Option<i64>,

    /// Billed duration on side A, seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_duration: Option<i64>,

    /// Billed duration on side B, seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_duration: Option<i64>,

    /// Per-minute rate on side A
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_rate: Option<Decimal>,

    /// Per-minute rate on side B
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_rate: Option<Decimal>,

    /// 6-second increment cost on side A
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_cost: Option<Decimal>,

    /// 6-second increment cost on side B
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_cost: Option<Decimal>,

    /// Signed dollar delta (A minus B), 4 decimal places
    pub cost_difference: Decimal,

    /// LRN on side A
    #[serde(skip_serializing_if = "Option::is_none")]
    pub your_lrn: Option<String>,

    /// LRN on side B
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_lrn: Option<String>,

    /// Raw index of a one-sided record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_index: Option<i64>,

    /// Raw index of the A record of a matched pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_index_a: Option<i64>,

    /// Raw index of the B record of a matched pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_index_b: Option<i64>,

    /// Cluster size, for hung-call exemplars
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hung_call_count: Option<i64>,
}

impl Discrepancy {
    /// Empty finding of the given type; callers fill the relevant fields
    pub fn new(kind: DiscrepancyType) -> Self {
        Self {
            kind,
            a_number: String::new(),
            b_number: String::new(),
            seize_time: None,
            your_duration: None,
            provider_duration: None,
            your_rate: None,
            provider_rate: None,
            your_cost: None,
            provider_cost: None,
            cost_difference: Decimal::ZERO,
            your_lrn: None,
            provider_lrn: None,
            source_index: None,
            source_index_a: None,
            source_index_b: None,
            hung_call_count: None,
        }
    }

    /// Absolute dollar magnitude used for sampling and ordering
    #[inline]
    pub fn magnitude(&self) -> Decimal {
        self.cost_difference.abs()
    }
}
