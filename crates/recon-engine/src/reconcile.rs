//! Job orchestration
//!
//! `reconcile` is the engine's only entry point. It re-validates the inputs
//! the boundary already checked, stages both sides into a scratch SQLite
//! store, matches, classifies, aggregates, and returns a complete result.
//! Scratch resources are released on every exit path; a cleanup failure on
//! an error path never masks the job's own error.

use crate::classifier::{classify_pair, classify_unmatched};
use crate::collector::BoundedCollector;
use crate::{hung, matcher, summary};
use futures::StreamExt;
use recon_core::models::{ColumnMapping, JobInput, JobOutput};
use recon_core::{EngineConfig, ReconError, ReconResult};
use recon_ingest::{canonicalize, decode, FileFormat};
use recon_store::{ScratchSpace, Side, StagingStore};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Run one reconciliation job end to end.
///
/// All-or-nothing: either a complete `JobOutput` is returned or an error,
/// never partial results.
pub async fn reconcile(input: &JobInput, config: &EngineConfig) -> ReconResult<JobOutput> {
    let job_id = Uuid::new_v4();
    info!("Starting reconciliation job {}", job_id);

    validate_input(input, config)?;

    let mut scratch = ScratchSpace::create(&config.scratch.base_dir(), job_id)?;
    let result = run_job(job_id, input, config, &scratch).await;

    match (result, scratch.cleanup()) {
        (Ok(output), Ok(())) => Ok(output),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            warn!(
                "Scratch cleanup failed after job error (job error wins): {}",
                cleanup_err
            );
            Err(err)
        }
    }
}

/// Defensive re-checks of the boundary contract
fn validate_input(input: &JobInput, config: &EngineConfig) -> ReconResult<()> {
    input.mapping_a.validate()?;
    input.mapping_b.validate()?;

    FileFormat::from_declared_name(&input.file_a_declared_name)?;
    FileFormat::from_declared_name(&input.file_b_declared_name)?;

    check_file_size(&input.file_a_path, config.limits.max_file_bytes)?;
    check_file_size(&input.file_b_path, config.limits.max_file_bytes)?;

    Ok(())
}

fn check_file_size(path: &Path, limit: u64) -> ReconResult<()> {
    let metadata = fs::metadata(path)
        .map_err(|e| ReconError::Io(format!("cannot stat {}: {}", path.display(), e)))?;
    if metadata.len() > limit {
        return Err(ReconError::FileTooLarge {
            path: path.display().to_string(),
            bytes: metadata.len(),
            limit,
        });
    }
    Ok(())
}

async fn run_job(
    job_id: Uuid,
    input: &JobInput,
    config: &EngineConfig,
    scratch: &ScratchSpace,
) -> ReconResult<JobOutput> {
    let store = StagingStore::open(&scratch.db_path()).await?;
    let result = run_phases(job_id, input, config, scratch, &store).await;
    store.close().await;
    result
}

async fn run_phases(
    job_id: Uuid,
    input: &JobInput,
    config: &EngineConfig,
    scratch: &ScratchSpace,
    store: &StagingStore,
) -> ReconResult<JobOutput> {
    let started = Instant::now();

    let phase = Instant::now();
    let rows_a = load_side(
        store,
        Side::A,
        &input.file_a_path,
        &input.file_a_declared_name,
        &input.mapping_a,
        scratch,
        config,
    )
    .await?;
    let rows_b = load_side(
        store,
        Side::B,
        &input.file_b_path,
        &input.file_b_declared_name,
        &input.mapping_b,
        scratch,
        config,
    )
    .await?;
    info!(
        "Staged {} A rows and {} B rows in {:?}",
        rows_a,
        rows_b,
        phase.elapsed()
    );

    let phase = Instant::now();
    store.create_indexes().await?;
    store.create_match_tables().await?;
    info!("Built staging indexes in {:?}", phase.elapsed());

    let mut collector = BoundedCollector::new(config.sampling.per_type_cap);

    let phase = Instant::now();
    let match_stats = matcher::run_matcher(
        store,
        config.matching.tolerance_secs,
        config.matching.insert_batch,
        |pair| {
            if let Some(finding) = classify_pair(pair) {
                collector.add(finding);
            }
        },
    )
    .await?;
    info!(
        "Matching finished in {:?} ({} candidates, {} accepted)",
        phase.elapsed(),
        match_stats.candidates_seen,
        match_stats.matched_records
    );

    let phase = Instant::now();
    for side in [Side::A, Side::B] {
        let mut stream = store.unmatched(side);
        while let Some(staged) = stream.next().await {
            let row = staged?;
            collector.add(classify_unmatched(side, &row));
        }
    }
    let hung_stats = hung::detect(store, &config.sampling, &mut collector).await?;
    info!("Classification finished in {:?}", phase.elapsed());

    let phase = Instant::now();
    let summary =
        summary::build_summary(store, &collector, match_stats.matched_records, &hung_stats)
            .await?;
    info!("Aggregation finished in {:?}", phase.elapsed());

    let total_discrepancy_count = summary.total_discrepancies;
    let discrepancies = collector.into_sorted();
    let has_more = total_discrepancy_count > discrepancies.len() as i64;

    info!(
        "Job {} complete in {:?}: {} discrepancies ({} returned)",
        job_id,
        started.elapsed(),
        total_discrepancy_count,
        discrepancies.len()
    );

    Ok(JobOutput {
        job_id: job_id.to_string(),
        summary,
        discrepancies,
        has_more,
        total_discrepancy_count,
    })
}

/// Decode, normalize, and stage one side in insert-batch sized transactions
async fn load_side(
    store: &StagingStore,
    side: Side,
    path: &Path,
    declared_name: &str,
    mapping: &ColumnMapping,
    scratch: &ScratchSpace,
    config: &EngineConfig,
) -> ReconResult<u64> {
    let records = decode(path, declared_name, scratch.dir())?;
    let batch_size = config.matching.insert_batch.max(1);
    let mut batch = Vec::with_capacity(batch_size);
    let mut total: u64 = 0;

    for record in records {
        let record = record?;
        total += 1;
        if total > config.limits.max_rows {
            return Err(ReconError::RowLimitExceeded {
                side: side.label().to_string(),
                limit: config.limits.max_rows,
            });
        }

        batch.push(canonicalize(&record, mapping));
        if batch.len() >= batch_size {
            store.insert_batch(side, &batch).await?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        store.insert_batch(side, &batch).await?;
    }

    if total == 0 {
        return Err(ReconError::EmptyInput(declared_name.to_string()));
    }

    Ok(total)
}
