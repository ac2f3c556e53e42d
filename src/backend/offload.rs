//! Accelerator-offload backend.
//!
//! Models a device queue: the context owns a dedicated `rayon` pool standing in
//! for the accelerator, every wave is launched as one flat ND-range kernel split
//! into work-groups, and the host blocks on the launch the way a queue `wait()`
//! does. Atomic min is lowered to a compare-exchange loop, as device compilers
//! do for 64-bit operands.

use core::sync::atomic::AtomicU64;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::ExecutionBackend;
use crate::{concurrency::fetch_min_cas, error::SsspError, Distance};

/// Offload backend over a dedicated device queue.
pub struct OffloadBackend {
    queue: ThreadPool,
    work_group_size: usize,
}

impl OffloadBackend {
    /// Brings up a queue with `threads` compute units.
    ///
    /// # Errors
    /// [`SsspError::Backend`] if the queue's threads cannot be spawned.
    ///
    /// # Panics
    /// Panics if `work_group_size == 0`.
    pub fn new(threads: usize, work_group_size: usize) -> Result<Self, SsspError> {
        assert!(work_group_size != 0, "work_group_size must be > 0");
        let queue = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("sssp-offload-{i}"))
            .build()
            .map_err(|e| SsspError::Backend(e.to_string()))?;
        Ok(Self {
            queue,
            work_group_size,
        })
    }

    /// Minimum number of work items a single task executes.
    pub fn work_group_size(&self) -> usize {
        self.work_group_size
    }
}

impl core::fmt::Debug for OffloadBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OffloadBackend")
            .field("compute_units", &self.queue.current_num_threads())
            .field("work_group_size", &self.work_group_size)
            .finish()
    }
}

impl ExecutionBackend for OffloadBackend {
    fn name(&self) -> &'static str {
        "offload"
    }

    fn parallelism(&self) -> usize {
        self.queue.current_num_threads()
    }

    fn parallel_for(&self, items: usize, kernel: &(dyn Fn(usize) + Sync)) {
        if items == 0 {
            return;
        }
        let group = self.work_group_size;
        self.queue.install(|| {
            (0..items)
                .into_par_iter()
                .with_min_len(group)
                .for_each(|i| kernel(i));
        });
    }

    fn atomic_fetch_min(&self, slot: &AtomicU64, value: Distance) -> Distance {
        fetch_min_cas(slot, value)
    }
}
