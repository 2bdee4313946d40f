//! Greedy 1-to-1 matching
//!
//! The candidate cursor arrives cheapest-first (|Δtime|, then |Δduration|);
//! a pair is accepted iff neither row has been taken. Acceptance order is
//! what makes this correct, so selection is strictly serial. Accepted pairs
//! are handed to the caller immediately and only their ids are kept, to be
//! flushed into the matched-id tables once the cursor drains.

use futures::StreamExt;
use recon_core::ReconResult;
use recon_store::{CandidatePair, StagingStore};
use std::collections::HashSet;
use tracing::{debug, info};

/// Outcome of the matching phase
#[derive(Debug, Clone, Copy)]
pub struct MatchStats {
    /// Accepted 1-to-1 pairs
    pub matched_records: i64,
    /// Candidates the cursor produced (diagnostic)
    pub candidates_seen: u64,
}

/// Run greedy selection over the candidate cursor.
///
/// `on_pair` sees every accepted pair exactly once, in acceptance order.
pub async fn run_matcher<F>(
    store: &StagingStore,
    tolerance_secs: i64,
    insert_batch: usize,
    mut on_pair: F,
) -> ReconResult<MatchStats>
where
    F: FnMut(&CandidatePair),
{
    let mut used_a: HashSet<i64> = HashSet::new();
    let mut used_b: HashSet<i64> = HashSet::new();
    let mut accepted: Vec<(i64, i64)> = Vec::new();
    let mut candidates_seen: u64 = 0;

    {
        let mut stream = store.candidates(tolerance_secs);
        while let Some(candidate) = stream.next().await {
            let pair = candidate?;
            candidates_seen += 1;

            if used_a.contains(&pair.a_id) || used_b.contains(&pair.b_id) {
                continue;
            }
            used_a.insert(pair.a_id);
            used_b.insert(pair.b_id);
            on_pair(&pair);
            accepted.push((pair.a_id, pair.b_id));
        }
    }

    debug!(
        "Greedy selection accepted {} of {} candidates",
        accepted.len(),
        candidates_seen
    );

    for chunk in accepted.chunks(insert_batch.max(1)) {
        store.insert_matched_ids(chunk).await?;
    }

    info!("Matched {} record pairs", accepted.len());

    Ok(MatchStats {
        matched_records: accepted.len() as i64,
        candidates_seen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_core::models::CanonicalRow;
    use recon_store::Side;
    use rust_decimal_macros::dec;

    fn row(seize: i64, duration: i64, raw_index: i64) -> CanonicalRow {
        CanonicalRow {
            a_number: "5551234567".to_string(),
            b_number: "5559876543".to_string(),
            seize_time: Some(seize),
            answer_time: None,
            end_time: None,
            billed_duration: duration,
            rate: dec!(0.015),
            lrn: String::new(),
            raw_index,
        }
    }

    async fn store_with(
        a_rows: &[CanonicalRow],
        b_rows: &[CanonicalRow],
        dir: &tempfile::TempDir,
    ) -> StagingStore {
        let store = StagingStore::open(&dir.path().join("staging.db"))
            .await
            .unwrap();
        store.insert_batch(Side::A, a_rows).await.unwrap();
        store.insert_batch(Side::B, b_rows).await.unwrap();
        store.create_indexes().await.unwrap();
        store.create_match_tables().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_one_to_one_selection() {
        let dir = tempfile::tempdir().unwrap();
        // Two A rows compete for the same B row; the closer one wins and
        // the loser stays unmatched.
        let store = store_with(
            &[row(1000, 60, 0), row(1010, 60, 1)],
            &[row(1005, 60, 0)],
            &dir,
        )
        .await;

        let mut pairs = Vec::new();
        let stats = run_matcher(&store, 60, 10_000, |p| {
            pairs.push((p.index_a, p.index_b));
        })
        .await
        .unwrap();

        assert_eq!(stats.matched_records, 1);
        assert_eq!(pairs, vec![(1, 0)]);

        let (zero, billed) = store.unmatched_split(Side::A).await.unwrap();
        assert_eq!(zero + billed, 1);
    }

    #[tokio::test]
    async fn test_no_id_is_used_twice() {
        let dir = tempfile::tempdir().unwrap();
        let a_rows: Vec<CanonicalRow> = (0..4).map(|i| row(1000 + i, 60, i)).collect();
        let b_rows: Vec<CanonicalRow> = (0..4).map(|i| row(1002 + i, 60, i)).collect();
        let store = store_with(&a_rows, &b_rows, &dir).await;

        let mut seen_a = HashSet::new();
        let mut seen_b = HashSet::new();
        let stats = run_matcher(&store, 60, 10_000, |p| {
            assert!(seen_a.insert(p.a_id), "A id {} matched twice", p.a_id);
            assert!(seen_b.insert(p.b_id), "B id {} matched twice", p.b_id);
        })
        .await
        .unwrap();

        assert_eq!(stats.matched_records, 4);
    }

    #[tokio::test]
    async fn test_tolerance_boundary() {
        let dir = tempfile::tempdir().unwrap();
        // 60s apart matches, 61s does not.
        let store = store_with(
            &[row(1000, 60, 0), row(5000, 60, 1)],
            &[row(1060, 60, 0), row(5061, 60, 1)],
            &dir,
        )
        .await;

        let stats = run_matcher(&store, 60, 10_000, |_| {}).await.unwrap();
        assert_eq!(stats.matched_records, 1);
    }

    #[tokio::test]
    async fn test_empty_numbers_match_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = row(1000, 60, 0);
        a.a_number = String::new();
        a.b_number = String::new();
        let mut b = row(1001, 60, 0);
        b.a_number = String::new();
        b.b_number = String::new();
        let store = store_with(&[a], &[b], &dir).await;

        let stats = run_matcher(&store, 60, 10_000, |_| {}).await.unwrap();
        assert_eq!(stats.matched_records, 1);
    }
}
