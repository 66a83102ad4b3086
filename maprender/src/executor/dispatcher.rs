//! Asynchronous render dispatcher.
//!
//! [`Dispatcher`] validates a request on the caller's thread, binds it to its
//! map in a [`JobClosure`](super::job::JobClosure) and hands it to a bounded
//! pool of blocking workers. Each job completes exactly once, either through
//! the callback given to [`Dispatcher::submit_with`] or through the
//! [`JobHandle`] returned by [`Dispatcher::submit`].
//!
//! A panic while rendering is converted into an internal error for that job.
//! A panic inside a completion callback cannot be reported to anyone, so it is
//! handed to the fatal handler, which by default aborts the process.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

use super::config::DispatcherConfig;
use super::handle::{JobHandle, JobStatus};
use super::job::{GridRequest, JobClosure, JobId, JobOutput, RasterRequest, RenderJob};
use super::pool::WorkerPool;
use crate::error::{MapError, MapResult};
use crate::grid::{GridEncoding, GridOptions};
use crate::map::{LayerSelector, SharedMap};

/// Receives a completion callback's panic payload.
pub type FatalHandler = Arc<dyn Fn(&JobId, Box<dyn Any + Send>) + Send + Sync>;

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    /// Jobs currently holding a worker.
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

impl DispatcherStats {
    /// Jobs submitted but not yet finished, queued or running.
    pub fn pending(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.failed)
    }
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Schedules render jobs onto a bounded worker pool.
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Handle,
    pool: Arc<WorkerPool>,
    counters: Arc<Counters>,
    fatal: FatalHandler,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig, runtime: Handle) -> Self {
        info!(workers = config.workers, "Render dispatcher started");
        Self {
            runtime,
            pool: Arc::new(WorkerPool::new(config.workers)),
            counters: Arc::new(Counters::default()),
            fatal: Arc::new(default_fatal_handler),
        }
    }

    /// Creates a dispatcher on the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn current(config: DispatcherConfig) -> Self {
        Self::new(config, Handle::current())
    }

    /// Replaces the handler for panicking completion callbacks.
    pub fn with_fatal_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&JobId, Box<dyn Any + Send>) + Send + Sync + 'static,
    {
        self.fatal = Arc::new(handler);
        self
    }

    pub fn workers(&self) -> usize {
        self.pool.capacity()
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            in_flight: self.pool.in_flight(),
            peak_in_flight: self.pool.peak_in_flight(),
        }
    }

    /// Schedules a job and returns a handle to await its outcome.
    ///
    /// Validation errors are returned immediately and nothing is scheduled.
    pub fn submit(&self, map: &SharedMap, job: RenderJob) -> MapResult<JobHandle> {
        let (status_tx, status_rx) = watch::channel(JobStatus::Queued);
        let (result_tx, result_rx) = oneshot::channel();
        let id = self.spawn(map, job, Some(status_tx), move |outcome| {
            // the handle may have been dropped; nobody is waiting then
            let _ = result_tx.send(outcome);
        })?;
        Ok(JobHandle::new(id, status_rx, result_rx))
    }

    /// Schedules a job whose outcome is passed to `on_complete`.
    ///
    /// The callback runs exactly once, on a runtime thread, after the job has
    /// released its hold on the map.
    pub fn submit_with<F>(&self, map: &SharedMap, job: RenderJob, on_complete: F) -> MapResult<JobId>
    where
        F: FnOnce(MapResult<JobOutput>) + Send + 'static,
    {
        self.spawn(map, job, None, on_complete)
    }

    /// Renders `extent` (`[minx, miny, maxx, maxy]`) as `format`.
    pub fn render<F>(
        &self,
        map: &SharedMap,
        extent: &[f64],
        format: &str,
        on_complete: F,
    ) -> MapResult<JobId>
    where
        F: FnOnce(MapResult<Vec<u8>>) + Send + 'static,
    {
        let job = RenderJob::Raster(RasterRequest::new(extent, format)?);
        self.submit_with(map, job, move |outcome| {
            on_complete(outcome.and_then(JobOutput::into_image))
        })
    }

    /// Renders one layer into an encoded feature grid.
    pub fn render_grid<F>(
        &self,
        map: &SharedMap,
        layer: impl Into<LayerSelector>,
        options: GridOptions,
        on_complete: F,
    ) -> MapResult<JobId>
    where
        F: FnOnce(MapResult<GridEncoding>) + Send + 'static,
    {
        let job = RenderJob::Grid(GridRequest::new(layer, options)?);
        self.submit_with(map, job, move |outcome| {
            on_complete(outcome.and_then(JobOutput::into_grid))
        })
    }

    fn spawn<F>(
        &self,
        map: &SharedMap,
        job: RenderJob,
        status: Option<watch::Sender<JobStatus>>,
        on_complete: F,
    ) -> MapResult<JobId>
    where
        F: FnOnce(MapResult<JobOutput>) + Send + 'static,
    {
        job.validate()?;

        let id = JobId::auto();
        let kind = job.kind();
        let active = map.active();
        let closure = JobClosure::new(id.clone(), map, job);
        if active > 0 {
            warn!(
                job_id = %id,
                active_jobs = active,
                "Map is already in use by other render jobs, this job will wait for it"
            );
        }
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(job_id = %id, kind, "Render job submitted");

        let pool = Arc::clone(&self.pool);
        let counters = Arc::clone(&self.counters);
        let fatal = Arc::clone(&self.fatal);
        let task_id = id.clone();

        self.runtime.spawn(async move {
            let started = Instant::now();
            let outcome = match pool.acquire().await {
                Ok(permit) => {
                    set_status(&status, JobStatus::Running);
                    debug!(job_id = %task_id, kind, "Render job running");
                    let outcome = match tokio::task::spawn_blocking(move || closure.run()).await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(join_failure(e)),
                    };
                    drop(permit);
                    outcome
                }
                Err(e) => {
                    drop(closure);
                    Err(e)
                }
            };

            let duration_ms = started.elapsed().as_millis();
            match &outcome {
                Ok(_) => {
                    counters.completed.fetch_add(1, Ordering::Relaxed);
                    set_status(&status, JobStatus::Succeeded);
                    debug!(job_id = %task_id, kind, duration_ms, "Render job completed");
                }
                Err(err) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    set_status(&status, JobStatus::Failed);
                    warn!(
                        job_id = %task_id,
                        kind,
                        error = %err,
                        duration_ms,
                        "Render job failed"
                    );
                }
            }

            deliver(&task_id, outcome, on_complete, &fatal);
        });

        Ok(id)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.pool.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

fn set_status(status: &Option<watch::Sender<JobStatus>>, value: JobStatus) {
    if let Some(tx) = status {
        tx.send_replace(value);
    }
}

fn join_failure(err: JoinError) -> MapError {
    match err.try_into_panic() {
        Ok(payload) => MapError::from_panic(payload.as_ref()),
        Err(err) => MapError::Internal(format!("render job was cancelled: {}", err)),
    }
}

fn deliver<F>(id: &JobId, outcome: MapResult<JobOutput>, on_complete: F, fatal: &FatalHandler)
where
    F: FnOnce(MapResult<JobOutput>),
{
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || on_complete(outcome))) {
        error!(job_id = %id, "Completion callback panicked");
        fatal(id, payload);
    }
}

fn default_fatal_handler(id: &JobId, payload: Box<dyn Any + Send>) {
    crate::panic::escalate(id, payload);
}
