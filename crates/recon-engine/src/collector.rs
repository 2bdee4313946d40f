//! Bounded discrepancy collector
//!
//! Retains at most K discrepancies per type, keyed on |cost_difference|,
//! while counts and cost sums keep accumulating for everything it is handed.
//! Replacement is a linear scan for the smallest retained magnitude; an
//! incoming entry wins only when strictly larger, so at saturation with
//! all-equal magnitudes the first K stay.

use recon_core::models::{Discrepancy, DiscrepancyType};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Bucket {
    retained: Vec<Discrepancy>,
    count: i64,
    cost_total: Decimal,
}

/// Per-type top-K accumulator owning all retained discrepancies
#[derive(Debug)]
pub struct BoundedCollector {
    cap: usize,
    buckets: Vec<Bucket>,
}

impl BoundedCollector {
    /// Collector retaining up to `cap` entries per type
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            buckets: (0..DiscrepancyType::ALL.len())
                .map(|_| Bucket::default())
                .collect(),
        }
    }

    /// Hand a discrepancy to the collector; it is retained or dropped here
    pub fn add(&mut self, discrepancy: Discrepancy) {
        let bucket = &mut self.buckets[discrepancy.kind.rank()];
        bucket.count += 1;
        bucket.cost_total += discrepancy.cost_difference;

        if bucket.retained.len() < self.cap {
            bucket.retained.push(discrepancy);
            return;
        }

        let weakest = bucket
            .retained
            .iter()
            .enumerate()
            .min_by_key(|(_, d)| d.magnitude())
            .map(|(i, _)| i);
        if let Some(i) = weakest {
            if discrepancy.magnitude() > bucket.retained[i].magnitude() {
                bucket.retained[i] = discrepancy;
            }
        }
    }

    /// Count of everything seen for one type
    pub fn count(&self, kind: DiscrepancyType) -> i64 {
        self.buckets[kind.rank()].count
    }

    /// Count of everything seen, all types
    pub fn total_count(&self) -> i64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Running cost_difference sum for one type
    pub fn cost_total(&self, kind: DiscrepancyType) -> Decimal {
        self.buckets[kind.rank()].cost_total
    }

    /// Sum of cost_difference over everything seen
    pub fn monetary_impact(&self) -> Decimal {
        self.buckets.iter().map(|b| b.cost_total).sum()
    }

    /// Per-type cost_difference sums for every type that was seen
    pub fn impact_breakdown(&self) -> BTreeMap<DiscrepancyType, Decimal> {
        DiscrepancyType::ALL
            .iter()
            .filter(|kind| self.buckets[kind.rank()].count > 0)
            .map(|kind| (*kind, self.buckets[kind.rank()].cost_total))
            .collect()
    }

    /// Number of retained entries across all types
    pub fn retained_len(&self) -> usize {
        self.buckets.iter().map(|b| b.retained.len()).sum()
    }

    /// Drain the sample in display order: type order first, then
    /// |cost_difference| descending within a type
    pub fn into_sorted(self) -> Vec<Discrepancy> {
        let mut result = Vec::with_capacity(self.retained_len());
        for mut bucket in self.buckets {
            bucket
                .retained
                .sort_by(|x, y| y.magnitude().cmp(&x.magnitude()));
            result.extend(bucket.retained);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn finding(kind: DiscrepancyType, cost_difference: Decimal, tag: i64) -> Discrepancy {
        let mut d = Discrepancy::new(kind);
        d.cost_difference = cost_difference;
        d.source_index = Some(tag);
        d
    }

    #[test]
    fn test_counts_survive_dropping() {
        let mut collector = BoundedCollector::new(2);
        for i in 0..5 {
            collector.add(finding(DiscrepancyType::MissingInB, dec!(0.01), i));
        }
        assert_eq!(collector.count(DiscrepancyType::MissingInB), 5);
        assert_eq!(
            collector.cost_total(DiscrepancyType::MissingInB),
            dec!(0.05)
        );
        assert_eq!(collector.retained_len(), 2);
    }

    #[test]
    fn test_replacement_keeps_largest_magnitudes() {
        let mut collector = BoundedCollector::new(2);
        collector.add(finding(DiscrepancyType::CostMismatch, dec!(0.01), 0));
        collector.add(finding(DiscrepancyType::CostMismatch, dec!(-0.50), 1));
        collector.add(finding(DiscrepancyType::CostMismatch, dec!(0.10), 2));
        collector.add(finding(DiscrepancyType::CostMismatch, dec!(0.002), 3));

        let sample = collector.into_sorted();
        let tags: Vec<i64> = sample.iter().filter_map(|d| d.source_index).collect();
        assert_eq!(tags, vec![1, 2]);
    }

    #[test]
    fn test_saturation_with_equal_magnitudes_keeps_first_k() {
        let mut collector = BoundedCollector::new(3);
        for i in 0..10 {
            collector.add(finding(DiscrepancyType::RateMismatch, dec!(0.02), i));
        }
        let tags: Vec<i64> = collector
            .into_sorted()
            .iter()
            .filter_map(|d| d.source_index)
            .collect();
        assert_eq!(tags, vec![0, 1, 2]);
    }

    #[test]
    fn test_readout_order() {
        let mut collector = BoundedCollector::new(10);
        collector.add(finding(DiscrepancyType::HungCallYours, dec!(0.9), 0));
        collector.add(finding(DiscrepancyType::MissingInB, dec!(0.1), 1));
        collector.add(finding(DiscrepancyType::LrnMismatch, dec!(0.004), 2));
        collector.add(finding(DiscrepancyType::LrnMismatch, dec!(-0.8), 3));
        collector.add(finding(DiscrepancyType::MissingInA, dec!(0.2), 4));

        let kinds: Vec<DiscrepancyType> =
            collector.into_sorted().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiscrepancyType::MissingInA,
                DiscrepancyType::LrnMismatch,
                DiscrepancyType::LrnMismatch,
                DiscrepancyType::MissingInB,
                DiscrepancyType::HungCallYours,
            ]
        );
    }

    #[test]
    fn test_lrn_tiebreak_is_magnitude_descending() {
        let mut collector = BoundedCollector::new(10);
        collector.add(finding(DiscrepancyType::LrnMismatch, dec!(0.004), 0));
        collector.add(finding(DiscrepancyType::LrnMismatch, dec!(-0.8), 1));
        let tags: Vec<i64> = collector
            .into_sorted()
            .iter()
            .filter_map(|d| d.source_index)
            .collect();
        assert_eq!(tags, vec![1, 0]);
    }

    #[test]
    fn test_impact_accounting() {
        let mut collector = BoundedCollector::new(1);
        collector.add(finding(DiscrepancyType::MissingInB, dec!(0.027), 0));
        collector.add(finding(DiscrepancyType::MissingInA, dec!(-0.010), 1));
        collector.add(finding(DiscrepancyType::MissingInA, dec!(-0.015), 2));

        assert_eq!(collector.total_count(), 3);
        assert_eq!(collector.monetary_impact(), dec!(0.002));
        let breakdown = collector.impact_breakdown();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(
            breakdown.get(&DiscrepancyType::MissingInA),
            Some(&dec!(-0.025))
        );
    }
}
