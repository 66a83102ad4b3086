//! Render jobs and the closures that carry them to a worker.
//!
//! A [`RenderJob`] describes what to produce; a [`JobClosure`] binds it to a
//! map for the lifetime of the job. The closure holds a usage slot on the map
//! from submission until the worker finishes, and running it yields exactly
//! one outcome.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{MapError, MapResult};
use crate::geometry::BBox;
use crate::grid::{Grid, GridEncoding, GridOptions};
use crate::map::{LayerSelector, SharedMap, UsageGuard};
use crate::render::{render_grid, render_to_bytes, OutputFormat};

/// Global counter for generating unique job IDs.
static JOB_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a submitted job.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique `render-{counter}` ID.
    pub fn auto() -> Self {
        let counter = JOB_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("render-{}", counter))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Render the map at `extent` and encode it as `format`.
///
/// The format name is only checked for emptiness up front; an unrecognised
/// name fails on the worker with a codec error.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterRequest {
    pub extent: BBox,
    pub format: String,
}

impl RasterRequest {
    pub fn new(extent: &[f64], format: impl Into<String>) -> MapResult<Self> {
        let request = Self {
            extent: BBox::from_slice(extent)?,
            format: format.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> MapResult<()> {
        if !self.extent.is_valid() {
            return Err(MapError::Validation(format!(
                "extent must hold four finite numbers, got [{}]",
                self.extent
            )));
        }
        if self.format.trim().is_empty() {
            return Err(MapError::Validation(
                "format must be a non-empty string".to_string(),
            ));
        }
        Ok(())
    }
}

/// Render one layer into a feature-id grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRequest {
    pub layer: LayerSelector,
    pub options: GridOptions,
}

impl GridRequest {
    pub fn new(layer: impl Into<LayerSelector>, options: GridOptions) -> MapResult<Self> {
        options.validate()?;
        Ok(Self {
            layer: layer.into(),
            options,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderJob {
    Raster(RasterRequest),
    Grid(GridRequest),
}

impl RenderJob {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderJob::Raster(_) => "raster",
            RenderJob::Grid(_) => "grid",
        }
    }

    pub fn validate(&self) -> MapResult<()> {
        match self {
            RenderJob::Raster(request) => request.validate(),
            RenderJob::Grid(request) => request.options.validate(),
        }
    }
}

/// What a successful job produces.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    Image(Vec<u8>),
    Grid(GridEncoding),
}

impl JobOutput {
    pub fn into_image(self) -> MapResult<Vec<u8>> {
        match self {
            JobOutput::Image(bytes) => Ok(bytes),
            JobOutput::Grid(_) => Err(MapError::Internal(
                "expected an image, job produced a grid".to_string(),
            )),
        }
    }

    pub fn into_grid(self) -> MapResult<GridEncoding> {
        match self {
            JobOutput::Grid(grid) => Ok(grid),
            JobOutput::Image(_) => Err(MapError::Internal(
                "expected a grid, job produced an image".to_string(),
            )),
        }
    }
}

/// A job bound to its map, holding a usage slot until it has run.
pub(crate) struct JobClosure {
    id: JobId,
    map: SharedMap,
    job: RenderJob,
    usage: UsageGuard,
}

impl JobClosure {
    /// Takes the usage slot immediately.
    pub(crate) fn new(id: JobId, map: &SharedMap, job: RenderJob) -> Self {
        Self {
            id,
            usage: map.acquire(),
            map: map.clone(),
            job,
        }
    }

    /// Executes the job on the current thread.
    ///
    /// The usage slot is released before this returns, and also if the render
    /// unwinds.
    pub(crate) fn run(self) -> MapResult<JobOutput> {
        let JobClosure {
            id,
            map,
            job,
            usage,
        } = self;
        debug!(job_id = %id, kind = job.kind(), "Rendering on worker");
        let outcome = execute(&map, job);
        usage.release();
        outcome
    }
}

fn execute(map: &SharedMap, job: RenderJob) -> MapResult<JobOutput> {
    match job {
        RenderJob::Raster(request) => {
            let format = OutputFormat::parse(&request.format)?;
            // zooming changes the map, so the whole render holds the write lock
            let mut map = map.write();
            map.zoom_to_box(request.extent);
            if !map.extent().has_area() {
                return Err(MapError::Runtime(format!(
                    "extent [{}] has no area at {}x{}, nothing to render",
                    request.extent,
                    map.width(),
                    map.height()
                )));
            }
            render_to_bytes(&map, &format).map(JobOutput::Image)
        }
        RenderJob::Grid(request) => {
            let map = map.read();
            let mut grid = Grid::new(map.width(), map.height(), &request.options)?;
            render_grid(&map, &request.layer, &mut grid)?;
            Ok(JobOutput::Grid(grid.encode()))
        }
    }
}
