//! Asynchronous render job framework.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                            │
//! │  validate → acquire map → spawn, complete exactly once      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │ Worker      │  │ JobClosure       │  │ Completion     │  │
//! │  │ Pool        │  │ (map + job +     │  │ callback or    │  │
//! │  │ (FIFO)      │  │  usage guard)    │  │ JobHandle      │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use maprender::executor::{Dispatcher, DispatcherConfig};
//!
//! let dispatcher = Dispatcher::current(DispatcherConfig::default());
//! dispatcher.render(&map, &[-180.0, -85.0, 180.0, 85.0], "png", |result| {
//!     match result {
//!         Ok(png) => println!("{} bytes", png.len()),
//!         Err(e) => eprintln!("render failed: {}", e),
//!     }
//! })?;
//! ```

mod config;
mod dispatcher;
mod handle;
mod job;
mod pool;

pub use config::{default_worker_count, DispatcherConfig, AUTO_WORKERS, DEFAULT_WORKERS_FALLBACK};
pub use dispatcher::{Dispatcher, DispatcherStats, FatalHandler};
pub use handle::{JobHandle, JobStatus};
pub use job::{GridRequest, JobId, JobOutput, RasterRequest, RenderJob};
pub use pool::{WorkerPermit, WorkerPool};
