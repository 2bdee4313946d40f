//! Job-scoped scratch resources
//!
//! Every job gets one directory under the configured scratch root, named by
//! the job UUID. The staging database and any extracted archive entries
//! live there. Cleanup runs on every exit path; a failure during cleanup is
//! logged and never masks the error that got us there.

use recon_core::{ReconError, ReconResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A per-job scratch directory with guaranteed release
#[derive(Debug)]
pub struct ScratchSpace {
    job_id: Uuid,
    dir: PathBuf,
    cleaned: bool,
}

impl ScratchSpace {
    /// Create the scratch directory for a job under `base_dir`
    pub fn create(base_dir: &Path, job_id: Uuid) -> ReconResult<Self> {
        let dir = base_dir.join(format!("recon-{}", job_id));
        fs::create_dir_all(&dir)
            .map_err(|e| ReconError::Io(format!("failed to create scratch dir: {}", e)))?;
        debug!("Created scratch space at {}", dir.display());

        Ok(Self {
            job_id,
            dir,
            cleaned: false,
        })
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Directory for intermediate files (archive extraction etc.)
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the staging database file
    pub fn db_path(&self) -> PathBuf {
        self.dir.join("staging.db")
    }

    /// Remove the scratch directory and everything in it.
    ///
    /// Idempotent; callers on error paths should log the returned error at
    /// warn and propagate their original one.
    pub fn cleanup(&mut self) -> ReconResult<()> {
        if self.cleaned {
            return Ok(());
        }
        self.cleaned = true;
        fs::remove_dir_all(&self.dir)
            .map_err(|e| ReconError::Io(format!("failed to remove scratch dir: {}", e)))?;
        debug!("Removed scratch space for job {}", self.job_id);
        Ok(())
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if !self.cleaned {
            if let Err(e) = fs::remove_dir_all(&self.dir) {
                warn!(
                    "Failed to remove scratch dir {} on drop: {}",
                    self.dir.display(),
                    e
                );
            }
        }
    }
}
