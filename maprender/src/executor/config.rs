//! Dispatcher configuration.

// =============================================================================
// Configuration Constants
// =============================================================================

/// Worker count used when the host parallelism cannot be queried.
pub const DEFAULT_WORKERS_FALLBACK: usize = 4;

/// Setting value meaning "one worker per available core".
pub const AUTO_WORKERS: usize = 0;

/// Number of render workers for this host.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(DEFAULT_WORKERS_FALLBACK)
}

// =============================================================================
// Dispatcher Configuration
// =============================================================================

/// Configuration for the render dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of jobs rendering at the same time.
    pub workers: usize,
}

impl DispatcherConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: resolve_workers(workers),
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
        }
    }
}

impl From<&crate::config::RenderSettings> for DispatcherConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self::with_workers(settings.workers)
    }
}

fn resolve_workers(workers: usize) -> usize {
    if workers == AUTO_WORKERS {
        default_worker_count()
    } else {
        workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderSettings;

    #[test]
    fn test_default_uses_host_parallelism() {
        let config = DispatcherConfig::default();
        assert_eq!(config.workers, default_worker_count());
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_auto_workers() {
        assert_eq!(
            DispatcherConfig::with_workers(AUTO_WORKERS).workers,
            default_worker_count()
        );
        assert_eq!(DispatcherConfig::with_workers(3).workers, 3);
    }

    #[test]
    fn test_from_settings() {
        let settings = RenderSettings {
            workers: 6,
            ..RenderSettings::default()
        };
        assert_eq!(DispatcherConfig::from(&settings).workers, 6);
    }
}
