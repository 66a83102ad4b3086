//! Worker pool bounding how many renders run at once.
//!
//! The pool is a capacity limiter only. Jobs waiting for a permit are served
//! in the order they started waiting, which is the semaphore's own fairness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{MapError, MapResult};

/// A semaphore-backed pool of render workers.
#[derive(Debug)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl WorkerPool {
    /// Creates a pool; a capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Waits for a free worker.
    pub async fn acquire(&self) -> MapResult<WorkerPermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| MapError::Internal("render worker pool is closed".to_string()))?;

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        Ok(WorkerPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of jobs currently holding a worker.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of concurrently running jobs observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }
}

/// A held worker slot, released on drop.
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for WorkerPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPermit").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_is_raised() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.capacity(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn test_permit_tracks_in_flight() {
        let pool = WorkerPool::new(2);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        assert_eq!(pool.in_flight(), 2);
        assert_eq!(pool.available(), 0);
        drop(a);
        assert_eq!(pool.in_flight(), 1);
        drop(b);
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let pool = Arc::new(WorkerPool::new(1));
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap().unwrap();
        assert_eq!(pool.peak_in_flight(), 1);
    }
}
