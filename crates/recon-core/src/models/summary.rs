//! Job summary model
//!
//! Aggregate counts and dollar totals for one reconciliation job. Billed
//! totals come from SQL aggregation over the staging store; mismatch counts
//! come from the bounded collector.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate results for a single reconciliation job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconSummary {
    /// Row counts per side
    pub total_records_a: i64,
    pub total_records_b: i64,

    /// Accepted 1-to-1 matches
    pub matched_records: i64,

    /// 6-second increment billing totals per side, 2 decimal places
    pub your_total_billed: Decimal,
    pub provider_total_billed: Decimal,

    /// Total billed minutes per side, 2 decimal places
    pub your_total_minutes: Decimal,
    pub provider_total_minutes: Decimal,

    /// A minus B, 2 decimal places
    pub billing_difference: Decimal,
    pub minutes_difference: Decimal,

    /// Unmatched counts per side (zero-duration and billed combined)
    pub missing_in_yours: i64,
    pub missing_in_provider: i64,

    /// Split of unmatched rows by billed duration
    pub zero_duration_in_yours: i64,
    pub billed_missing_in_yours: i64,
    pub zero_duration_in_provider: i64,
    pub billed_missing_in_provider: i64,

    /// Matched-pair mismatch counts from the collector
    pub duration_mismatches: i64,
    pub rate_mismatches: i64,
    pub cost_mismatches: i64,
    pub lrn_mismatches: i64,

    /// Sum of every per-type count
    pub total_discrepancies: i64,

    /// Sum of cost_difference over all emitted discrepancies, 2 decimals
    pub monetary_impact: Decimal,

    /// Per-type sums of cost_difference, 2 decimals, keyed by type tag
    pub impact_breakdown: BTreeMap<String, Decimal>,

    /// Hung-call cluster statistics per side
    pub hung_calls_yours: i64,
    pub hung_calls_provider: i64,
    pub hung_call_groups_yours: i64,
    pub hung_call_groups_provider: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_job() {
        let summary = ReconSummary::default();
        assert_eq!(summary.total_records_a, 0);
        assert_eq!(summary.matched_records, 0);
        assert_eq!(summary.monetary_impact, Decimal::ZERO);
        assert!(summary.impact_breakdown.is_empty());
    }

    #[test]
    fn test_serializes_round_trip() {
        let mut summary = ReconSummary::default();
        summary.total_records_a = 10;
        summary
            .impact_breakdown
            .insert("missing_in_b".to_string(), Decimal::new(27, 3));

        let json = serde_json::to_string(&summary).unwrap();
        let back: ReconSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total_records_a, 10);
        assert_eq!(
            back.impact_breakdown.get("missing_in_b"),
            Some(&Decimal::new(27, 3))
        );
    }
}
