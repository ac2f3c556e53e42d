//! Persistent CPU worker threads.
//!
//! The backend owns a fixed set of named workers for its whole lifetime. Each
//! wave is broadcast to every worker, and workers claim fixed-size chunks from
//! a shared cursor until the range is exhausted; the broadcast returning is the
//! wave barrier. Kernels may borrow the run's distance table, buckets and
//! partition directly.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::ExecutionBackend;
use crate::{concurrency::fetch_min_native, error::SsspError, Distance};

/// Thread-parallel CPU backend.
pub struct ThreadPoolBackend {
    workers: ThreadPool,
    chunk_size: usize,
}

impl ThreadPoolBackend {
    /// Starts `threads` workers claiming `chunk_size` items at a time.
    ///
    /// # Errors
    /// [`SsspError::Backend`] if the workers cannot be spawned.
    ///
    /// # Panics
    /// Panics if `threads == 0` or `chunk_size == 0`.
    pub fn new(threads: usize, chunk_size: usize) -> Result<Self, SsspError> {
        assert!(threads != 0, "threads must be > 0");
        assert!(chunk_size != 0, "chunk_size must be > 0");
        let workers = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sssp-worker-{i}"))
            .build()
            .map_err(|e| SsspError::Backend(e.to_string()))?;
        Ok(Self {
            workers,
            chunk_size,
        })
    }

    /// Items claimed per cursor step.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl core::fmt::Debug for ThreadPoolBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThreadPoolBackend")
            .field("threads", &self.workers.current_num_threads())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl ExecutionBackend for ThreadPoolBackend {
    fn name(&self) -> &'static str {
        "thread-pool"
    }

    fn parallelism(&self) -> usize {
        self.workers.current_num_threads()
    }

    fn parallel_for(&self, items: usize, kernel: &(dyn Fn(usize) + Sync)) {
        if items == 0 {
            return;
        }

        // A single chunk is not worth a round trip through the workers.
        if self.parallelism() == 1 || items <= self.chunk_size {
            (0..items).for_each(kernel);
            return;
        }

        let cursor = CachePadded::new(AtomicUsize::new(0));
        let chunk = self.chunk_size;

        self.workers.broadcast(|_| loop {
            let start = cursor.fetch_add(chunk, Ordering::Relaxed);
            if start >= items {
                break;
            }
            let end = (start + chunk).min(items);
            (start..end).for_each(kernel);
        });
    }

    fn atomic_fetch_min(&self, slot: &AtomicU64, value: Distance) -> Distance {
        fetch_min_native(slot, value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn small_waves_run_on_the_caller() {
        let backend = ThreadPoolBackend::new(8, 1024).unwrap();
        let caller = std::thread::current().id();
        let seen = Mutex::new(HashSet::new());
        backend.parallel_for(100, &|_| {
            seen.lock().unwrap().insert(std::thread::current().id());
        });
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen.contains(&caller));
    }

    #[test]
    fn large_waves_sum_correctly() {
        let backend = ThreadPoolBackend::new(4, 16).unwrap();
        let total = AtomicU64::new(0);
        backend.parallel_for(10_000, &|i| {
            total.fetch_add(i as u64, Ordering::Relaxed);
        });
        assert_eq!(total.load(Ordering::Relaxed), (0..10_000u64).sum::<u64>());
    }

    #[test]
    fn workers_outlive_waves() {
        let backend = ThreadPoolBackend::new(3, 1).unwrap();
        let seen = Mutex::new(HashSet::new());
        for _ in 0..200 {
            backend.parallel_for(64, &|_| {
                let current = std::thread::current();
                assert!(current.name().is_some_and(|n| n.starts_with("sssp-worker-")));
                seen.lock().unwrap().insert(current.id());
            });
        }
        // 200 waves, never more threads than the pool was built with
        assert!(seen.into_inner().unwrap().len() <= 3);
    }

    #[test]
    #[should_panic(expected = "threads must be > 0")]
    fn zero_threads_panics() {
        let _ = ThreadPoolBackend::new(0, 1);
    }
}
