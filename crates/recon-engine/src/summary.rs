//! Summary aggregation
//!
//! Totals come straight from SQL over the staging store, never from the
//! retained discrepancy sample; only the per-type counts and impact sums
//! are read off the collector, which accumulates them independently of
//! retention.

use crate::billing::round_money;
use crate::collector::BoundedCollector;
use crate::hung::HungStats;
use recon_core::models::{DiscrepancyType, ReconSummary};
use recon_core::ReconResult;
use recon_store::{Side, StagingStore};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

pub async fn build_summary(
    store: &StagingStore,
    collector: &BoundedCollector,
    matched_records: i64,
    hung: &HungStats,
) -> ReconResult<ReconSummary> {
    let (totals_a, totals_b) = tokio::try_join!(
        store.side_totals(Side::A),
        store.side_totals(Side::B),
    )?;
    let ((zero_a, billed_a), (zero_b, billed_b)) = tokio::try_join!(
        store.unmatched_split(Side::A),
        store.unmatched_split(Side::B),
    )?;

    let your_total_billed = round_money(decimal_from(totals_a.total_billed));
    let provider_total_billed = round_money(decimal_from(totals_b.total_billed));
    let your_total_minutes = round_money(Decimal::from(totals_a.total_seconds) / Decimal::from(60));
    let provider_total_minutes =
        round_money(Decimal::from(totals_b.total_seconds) / Decimal::from(60));

    let impact_breakdown = collector
        .impact_breakdown()
        .into_iter()
        .map(|(kind, total)| (kind.as_str().to_string(), round_money(total)))
        .collect();

    Ok(ReconSummary {
        total_records_a: totals_a.total_records,
        total_records_b: totals_b.total_records,
        matched_records,
        your_total_billed,
        provider_total_billed,
        your_total_minutes,
        provider_total_minutes,
        billing_difference: round_money(your_total_billed - provider_total_billed),
        minutes_difference: round_money(your_total_minutes - provider_total_minutes),
        missing_in_yours: zero_a + billed_a,
        missing_in_provider: zero_b + billed_b,
        zero_duration_in_yours: zero_a,
        billed_missing_in_yours: billed_a,
        zero_duration_in_provider: zero_b,
        billed_missing_in_provider: billed_b,
        duration_mismatches: collector.count(DiscrepancyType::DurationMismatch),
        rate_mismatches: collector.count(DiscrepancyType::RateMismatch),
        cost_mismatches: collector.count(DiscrepancyType::CostMismatch),
        lrn_mismatches: collector.count(DiscrepancyType::LrnMismatch),
        total_discrepancies: collector.total_count(),
        monetary_impact: round_money(collector.monetary_impact()),
        impact_breakdown,
        hung_calls_yours: hung.calls_yours,
        hung_calls_provider: hung.calls_provider,
        hung_call_groups_yours: hung.groups_yours,
        hung_call_groups_provider: hung.groups_provider,
    })
}

/// SQL REAL totals become decimals only for the final 2-decimal rounding
fn decimal_from(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}
