//! Discrepancy classification
//!
//! Pure functions from staged rows and matched pairs to typed findings.
//! Orientation is always A's point of view: a positive cost_difference
//! means side A billed more than side B.

use crate::billing::{call_cost, round_cost};
use recon_core::models::{Discrepancy, DiscrepancyType};
use recon_store::{CandidatePair, Side, StagedRow};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Matched-pair deltas below these thresholds are noise
const COST_EPSILON: Decimal = dec!(0.0001);
const RATE_EPSILON: Decimal = dec!(0.0001);
const DURATION_EPSILON_SECS: i64 = 1;

fn optional_lrn(lrn: &str) -> Option<String> {
    if lrn.is_empty() {
        None
    } else {
        Some(lrn.to_string())
    }
}

/// Classify one unmatched row from either side.
///
/// An unmatched A row is a call the provider never produced (`missing_in_b`
/// family); an unmatched B row is one our switch never produced
/// (`missing_in_a` family). Zero-duration rows get their own types.
pub fn classify_unmatched(side: Side, row: &StagedRow) -> Discrepancy {
    let cost = call_cost(row.billed_duration, row.rate_value());

    let kind = match (side, row.billed_duration > 0) {
        (Side::A, true) => DiscrepancyType::MissingInB,
        (Side::A, false) => DiscrepancyType::ZeroDurationInB,
        (Side::B, true) => DiscrepancyType::MissingInA,
        (Side::B, false) => DiscrepancyType::ZeroDurationInA,
    };

    let mut d = Discrepancy::new(kind);
    d.a_number = row.a_number.clone();
    d.b_number = row.b_number.clone();
    d.seize_time = row.seize_time;
    d.source_index = Some(row.raw_index);

    match side {
        Side::A => {
            d.your_duration = Some(row.billed_duration);
            d.your_rate = Some(row.rate_value());
            d.your_cost = Some(cost);
            d.your_lrn = optional_lrn(&row.lrn);
            d.cost_difference = round_cost(cost);
        }
        Side::B => {
            d.provider_duration = Some(row.billed_duration);
            d.provider_rate = Some(row.rate_value());
            d.provider_cost = Some(cost);
            d.provider_lrn = optional_lrn(&row.lrn);
            d.cost_difference = round_cost(-cost);
        }
    }

    d
}

/// Classify one matched pair; None when the pair agrees.
///
/// A differing LRN supersedes the cost variants: the LRN finding carries
/// the dollar delta and no second finding is emitted for the pair.
pub fn classify_pair(pair: &CandidatePair) -> Option<Discrepancy> {
    let rate_a = pair.rate_a_value();
    let rate_b = pair.rate_b_value();
    let your_cost = call_cost(pair.duration_a, rate_a);
    let provider_cost = call_cost(pair.duration_b, rate_b);
    let cost_diff = your_cost - provider_cost;

    let lrn_conflict =
        !pair.lrn_a.is_empty() && !pair.lrn_b.is_empty() && pair.lrn_a != pair.lrn_b;

    let kind = if lrn_conflict {
        DiscrepancyType::LrnMismatch
    } else if cost_diff.abs() > COST_EPSILON {
        let duration_delta = (pair.duration_a - pair.duration_b).abs();
        let rate_delta = (rate_a - rate_b).abs();

        if duration_delta > DURATION_EPSILON_SECS && rate_delta <= RATE_EPSILON {
            DiscrepancyType::DurationMismatch
        } else if rate_delta > RATE_EPSILON && duration_delta <= DURATION_EPSILON_SECS {
            DiscrepancyType::RateMismatch
        } else {
            DiscrepancyType::CostMismatch
        }
    } else {
        return None;
    };

    let mut d = Discrepancy::new(kind);
    d.a_number = pair.a_number.clone();
    d.b_number = pair.b_number.clone();
    d.seize_time = pair.seize_a.or(pair.seize_b);
    d.your_duration = Some(pair.duration_a);
    d.provider_duration = Some(pair.duration_b);
    d.your_rate = Some(rate_a);
    d.provider_rate = Some(rate_b);
    d.your_cost = Some(your_cost);
    d.provider_cost = Some(provider_cost);
    d.cost_difference = round_cost(cost_diff);
    d.your_lrn = optional_lrn(&pair.lrn_a);
    d.provider_lrn = optional_lrn(&pair.lrn_b);
    d.source_index_a = Some(pair.index_a);
    d.source_index_b = Some(pair.index_b);
    Some(d)
}
