//! Process-level panic handling.
//!
//! [`init`] installs a hook that writes a report with the dispatcher state to
//! stderr before chaining to the previous hook. [`escalate`] is the default
//! fate of a panicking completion callback: the same report, then abort.
//!
//! Panic hooks must be `'static`, so the dispatcher state is reached through
//! a global registry populated with [`set_stats_callback`].

use std::any::Any;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::sync::{Mutex, OnceLock};

use tracing::error;

use crate::executor::{DispatcherStats, JobId};

static PANIC_REGISTRY: OnceLock<Mutex<PanicRegistry>> = OnceLock::new();

#[derive(Default)]
struct PanicRegistry {
    /// Captures dispatcher counters for the report.
    stats_callback: Option<Box<dyn Fn() -> DispatcherStats + Send + Sync>>,
}

fn registry() -> &'static Mutex<PanicRegistry> {
    PANIC_REGISTRY.get_or_init(|| Mutex::new(PanicRegistry::default()))
}

/// Installs the panic hook.
///
/// Call once early at startup; the previous hook still runs afterwards.
pub fn init() {
    let _ = registry();

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        write_report(None, location.as_deref(), panic_message(info.payload()).as_deref());
        original_hook(info);
    }));
}

/// Registers the callback used to include dispatcher counters in reports.
pub fn set_stats_callback<F>(callback: F)
where
    F: Fn() -> DispatcherStats + Send + Sync + 'static,
{
    if let Ok(mut guard) = registry().lock() {
        guard.stats_callback = Some(Box::new(callback));
    }
}

pub fn clear_stats_callback() {
    if let Ok(mut guard) = registry().lock() {
        guard.stats_callback = None;
    }
}

/// Extracts the text of a panic payload, if it has any.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

/// Reports a panicking completion callback and aborts the process.
///
/// A callback failure leaves the caller with no way to learn the outcome of
/// its job, so the process does not continue.
pub fn escalate(job_id: &JobId, payload: Box<dyn Any + Send>) -> ! {
    let message = panic_message(payload.as_ref());
    error!(
        job_id = %job_id,
        message = message.as_deref().unwrap_or("<non-string payload>"),
        "Completion callback panicked, aborting"
    );
    write_report(Some(job_id), None, message.as_deref());
    std::process::abort()
}

fn write_report(job_id: Option<&JobId>, location: Option<&str>, message: Option<&str>) {
    // logging may be unusable at this point
    let mut stderr = std::io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(
        stderr,
        "╔══════════════════════════════════════════════════════════════════╗"
    );
    let _ = writeln!(
        stderr,
        "║                     MAPRENDER PANIC HANDLER                      ║"
    );
    let _ = writeln!(
        stderr,
        "╚══════════════════════════════════════════════════════════════════╝"
    );
    let _ = writeln!(stderr);

    let _ = writeln!(stderr, "━━━ Panic Information ━━━");
    if let Some(job_id) = job_id {
        let _ = writeln!(stderr, "Completion callback of job: {}", job_id);
    }
    if let Some(location) = location {
        let _ = writeln!(stderr, "Location: {}", location);
    }
    if let Some(message) = message {
        let _ = writeln!(stderr, "Message: {}", message);
    }
    let _ = writeln!(stderr);

    if let Ok(guard) = registry().lock() {
        if let Some(ref callback) = guard.stats_callback {
            let stats = callback();
            let _ = writeln!(stderr, "━━━ Dispatcher State ━━━");
            let _ = writeln!(stderr, "Jobs submitted:   {}", stats.submitted);
            let _ = writeln!(stderr, "Jobs completed:   {}", stats.completed);
            let _ = writeln!(stderr, "Jobs failed:      {}", stats.failed);
            let _ = writeln!(stderr, "Jobs pending:     {}", stats.pending());
            let _ = writeln!(stderr, "Workers busy:     {}", stats.in_flight);
            let _ = writeln!(stderr);
        }
    }

    let _ = writeln!(stderr, "━━━ End of MapRender Panic Handler ━━━");
    let _ = writeln!(stderr);
    let _ = stderr.flush();
}
