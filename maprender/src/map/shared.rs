//! Shared ownership of a map between callers and in-flight render jobs.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use super::Map;
use crate::error::MapResult;

struct MapCell {
    map: RwLock<Map>,
    usage: AtomicIsize,
}

/// A map shared between synchronous callers and render jobs.
///
/// Cloning is cheap and every clone refers to the same map. Jobs that read
/// the map take the shared lock, jobs that change its extent take the
/// exclusive lock, so concurrent renders of one map queue instead of racing.
/// The usage counter tracks how many submitted jobs still reference the map.
#[derive(Clone)]
pub struct SharedMap {
    inner: Arc<MapCell>,
}

impl SharedMap {
    pub fn new(map: Map) -> Self {
        Self {
            inner: Arc::new(MapCell {
                map: RwLock::new(map),
                usage: AtomicIsize::new(0),
            }),
        }
    }

    /// Number of submitted jobs that have not yet released the map.
    pub fn active(&self) -> isize {
        self.inner.usage.load(Ordering::SeqCst)
    }

    /// Takes a usage slot, released when the guard drops.
    pub fn acquire(&self) -> UsageGuard {
        self.inner.usage.fetch_add(1, Ordering::SeqCst);
        UsageGuard {
            cell: Arc::clone(&self.inner),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Map> {
        self.inner.map.read()
    }

    /// Exclusive access. Blocks until in-flight readers and writers finish.
    pub fn write(&self) -> RwLockWriteGuard<'_, Map> {
        self.inner.map.write()
    }

    /// Applies a synchronous mutation.
    ///
    /// Logs a warning when render jobs still reference the map; the call then
    /// waits for the lock, so the jobs see either the old or the new state.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map) -> R) -> R {
        let active = self.active();
        if active > 0 {
            warn!(
                active_jobs = active,
                "Map modified while in use by render jobs; waiting for exclusive access"
            );
        }
        let mut map = self.write();
        f(&mut map)
    }

    /// Synchronous render into an encoded buffer.
    pub fn render_to_string(&self, format: &str) -> MapResult<Vec<u8>> {
        let format = crate::render::OutputFormat::parse(format)?;
        crate::render::render_to_bytes(&self.read(), &format)
    }

    /// Synchronous render into a file.
    pub fn render_to_file(&self, path: &Path, format: Option<&str>) -> MapResult<()> {
        crate::render::render_to_file(&self.read(), path, format)
    }

    /// Whether two handles refer to the same map.
    pub fn ptr_eq(&self, other: &SharedMap) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Map> for SharedMap {
    fn from(map: Map) -> Self {
        Self::new(map)
    }
}

impl fmt::Debug for SharedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMap")
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

/// One usage slot on a [`SharedMap`]; the slot is released on drop.
#[must_use = "dropping the guard releases the map immediately"]
pub struct UsageGuard {
    cell: Arc<MapCell>,
}

impl UsageGuard {
    /// Releases the slot now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for UsageGuard {
    fn drop(&mut self) {
        self.cell.usage.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for UsageGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsageGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> SharedMap {
        SharedMap::new(Map::new(16, 16).unwrap())
    }

    #[test]
    fn test_counter_starts_at_zero() {
        assert_eq!(shared().active(), 0);
    }

    #[test]
    fn test_acquire_release_pairs() {
        let map = shared();
        let guards: Vec<UsageGuard> = (0..5).map(|_| map.acquire()).collect();
        assert_eq!(map.active(), 5);
        for guard in guards {
            guard.release();
        }
        assert_eq!(map.active(), 0);
    }

    #[test]
    fn test_guard_outlives_clone() {
        let map = shared();
        let guard = map.clone().acquire();
        assert_eq!(map.active(), 1);
        drop(guard);
        assert_eq!(map.active(), 0);
    }

    #[test]
    fn test_update_while_in_use_still_applies() {
        let map = shared();
        let _guard = map.acquire();
        map.update(|m| m.set_buffer_size(64));
        assert_eq!(map.read().buffer_size(), 64);
    }

    #[test]
    fn test_clones_share_state() {
        let a = shared();
        let b = a.clone();
        a.update(|m| m.set_srs("epsg:3857"));
        assert_eq!(b.read().srs(), "epsg:3857");
        assert!(a.ptr_eq(&b));
    }
}
