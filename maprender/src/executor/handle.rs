//! Handle to a job submitted without a completion callback.
//!
//! ```ignore
//! let handle = dispatcher.submit(&map, job)?;
//! if handle.status() == JobStatus::Queued {
//!     println!("waiting for a worker");
//! }
//! let output = handle.wait().await?;
//! ```

use tokio::sync::{oneshot, watch};

use super::job::{JobId, JobOutput};
use crate::error::{MapError, MapResult};

/// Lifecycle of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting for a free worker.
    Queued,
    /// Rendering on a worker.
    Running,
    /// Finished with an output.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Awaitable result of a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    status_rx: watch::Receiver<JobStatus>,
    result_rx: oneshot::Receiver<MapResult<JobOutput>>,
}

impl JobHandle {
    pub(crate) fn new(
        job_id: JobId,
        status_rx: watch::Receiver<JobStatus>,
        result_rx: oneshot::Receiver<MapResult<JobOutput>>,
    ) -> Self {
        Self {
            job_id,
            status_rx,
            result_rx,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.job_id
    }

    /// Most recent status, without waiting.
    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// Waits for the job's single outcome.
    ///
    /// A job dropped before completing (runtime shutdown) resolves to an
    /// internal error.
    pub async fn wait(self) -> MapResult<JobOutput> {
        self.result_rx.await.unwrap_or_else(|_| {
            Err(MapError::Internal(format!(
                "render job {} was dropped before completing",
                self.job_id
            )))
        })
    }
}
