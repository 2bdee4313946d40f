//! Hung-call detection
//!
//! A switch that times calls out at a fixed value leaves clusters of
//! unmatched records sharing one duration. Per side, durations over the
//! floor held by enough rows count as hung groups; the highest-revenue
//! rows of each group are emitted as exemplars.

use crate::billing::{call_cost, round_cost};
use crate::collector::BoundedCollector;
use recon_core::config::SamplingConfig;
use recon_core::models::{Discrepancy, DiscrepancyType};
use recon_core::ReconResult;
use recon_store::{HungExemplar, Side, StagingStore};
use tracing::info;

/// Hung-call cluster statistics for both sides
#[derive(Debug, Clone, Copy, Default)]
pub struct HungStats {
    pub calls_yours: i64,
    pub groups_yours: i64,
    pub calls_provider: i64,
    pub groups_provider: i64,
}

/// Detect hung-call clusters among unmatched rows and emit exemplars.
pub async fn detect(
    store: &StagingStore,
    sampling: &SamplingConfig,
    collector: &mut BoundedCollector,
) -> ReconResult<HungStats> {
    let min_duration = sampling.hung_min_duration_secs;
    let min_cluster = sampling.hung_min_cluster;

    // The two per-side aggregates are independent reads.
    let ((calls_yours, groups_yours), (calls_provider, groups_provider)) = tokio::try_join!(
        store.hung_stats(Side::A, min_duration, min_cluster),
        store.hung_stats(Side::B, min_duration, min_cluster),
    )?;

    if calls_yours + calls_provider > 0 {
        info!(
            "Hung-call clusters: {} rows / {} groups on A, {} rows / {} groups on B",
            calls_yours, groups_yours, calls_provider, groups_provider
        );
    }

    for side in [Side::A, Side::B] {
        let exemplars = store
            .hung_exemplars(side, min_duration, min_cluster, sampling.hung_exemplar_cap)
            .await?;
        for exemplar in exemplars {
            collector.add(exemplar_discrepancy(side, &exemplar));
        }
    }

    Ok(HungStats {
        calls_yours,
        groups_yours,
        calls_provider,
        groups_provider,
    })
}

fn exemplar_discrepancy(side: Side, exemplar: &HungExemplar) -> Discrepancy {
    let cost = call_cost(exemplar.billed_duration, exemplar.rate_value());

    let kind = match side {
        Side::A => DiscrepancyType::HungCallYours,
        Side::B => DiscrepancyType::HungCallProvider,
    };

    let mut d = Discrepancy::new(kind);
    d.a_number = exemplar.a_number.clone();
    d.b_number = exemplar.b_number.clone();
    d.seize_time = exemplar.seize_time;
    d.source_index = Some(exemplar.raw_index);
    d.hung_call_count = Some(exemplar.cluster_size);

    match side {
        Side::A => {
            d.your_duration = Some(exemplar.billed_duration);
            d.your_rate = Some(exemplar.rate_value());
            d.your_cost = Some(cost);
            d.cost_difference = round_cost(cost);
        }
        Side::B => {
            d.provider_duration = Some(exemplar.billed_duration);
            d.provider_rate = Some(exemplar.rate_value());
            d.provider_cost = Some(cost);
            d.cost_difference = round_cost(-cost);
        }
    }

    d
}
