//! Inline backend.

use core::sync::atomic::AtomicU64;

use super::ExecutionBackend;
use crate::{concurrency::fetch_min_native, Distance};

/// Runs every work item on the calling thread, in index order.
///
/// Bucket state observed between waves is always an exact snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialBackend;

impl ExecutionBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn parallel_for(&self, items: usize, kernel: &(dyn Fn(usize) + Sync)) {
        for i in 0..items {
            kernel(i);
        }
    }

    fn atomic_fetch_min(&self, slot: &AtomicU64, value: Distance) -> Distance {
        fetch_min_native(slot, value)
    }
}
