//! Relaxation protocol.
//!
//! The only write path into shared run state: an atomic fetch-min on the
//! target's distance slot, then a bucket migration computed from the value the
//! min replaced. Concurrent relaxations of the same vertex converge on the
//! minimum, and an erase issued by a relaxation that lost the race always
//! targets a bucket strictly above the winner's.

use core::sync::atomic::{AtomicU64, Ordering};

use super::buckets::BucketArray;
use crate::backend::ExecutionBackend;
use crate::error::SsspError;
use crate::{Distance, VertexId, Weight, INF};

/// One `AtomicU64` tentative distance per vertex, initialized to [`INF`].
pub struct DistanceTable {
    slots: Box<[AtomicU64]>,
}

impl DistanceTable {
    /// Allocates a table for `vertices` vertices.
    ///
    /// # Errors
    /// [`SsspError::Allocation`] if the slots cannot be reserved.
    pub fn new(vertices: usize) -> Result<Self, SsspError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(vertices)
            .map_err(|_| SsspError::Allocation {
                bytes: vertices.saturating_mul(core::mem::size_of::<AtomicU64>()),
            })?;
        slots.extend((0..vertices).map(|_| AtomicU64::new(INF)));
        Ok(Self {
            slots: slots.into_boxed_slice(),
        })
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the table covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current tentative distance of `vertex`.
    #[inline]
    pub fn get(&self, vertex: VertexId) -> Distance {
        self.slots[vertex].load(Ordering::Acquire)
    }

    /// The raw slot for `vertex`.
    #[inline]
    pub fn slot(&self, vertex: VertexId) -> &AtomicU64 {
        &self.slots[vertex]
    }

    /// Copies the current distances out.
    pub fn snapshot(&self) -> Vec<Distance> {
        self.slots.iter().map(|s| s.load(Ordering::Acquire)).collect()
    }

    /// Consumes the table.
    pub fn into_vec(self) -> Vec<Distance> {
        self.slots
            .into_vec()
            .into_iter()
            .map(AtomicU64::into_inner)
            .collect()
    }
}

impl core::fmt::Debug for DistanceTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.snapshot()).finish()
    }
}

/// Bucket index of a finite distance.
#[inline]
pub fn bucket_of(distance: Distance, delta: Distance) -> usize {
    usize::try_from(distance / delta).unwrap_or(usize::MAX - 1)
}

/// Proposes `dist[u] + weight` for `v` and migrates `v` between buckets if it improves.
///
/// Returns whether `v`'s distance was lowered by this call. When several calls
/// race on the same `v`, every one that lowers the slot inserts `v` into the
/// bucket of its own candidate; the smallest candidate always ends up with a
/// bit set in its bucket. Larger, stale memberships are filtered by the driver.
///
/// # Errors
/// Whatever [`BucketArray::insert`] reports for the new bucket. The distance
/// slot has already been lowered by then, so the run must be abandoned.
#[inline]
pub fn relax(
    u: VertexId,
    v: VertexId,
    weight: Weight,
    delta: Distance,
    distances: &DistanceTable,
    buckets: &BucketArray,
    backend: &dyn ExecutionBackend,
) -> Result<bool, SsspError> {
    let candidate = distances
        .get(u)
        .saturating_add(Distance::from(weight))
        .min(INF);
    if candidate >= distances.get(v) {
        return Ok(false);
    }

    let previous = backend.atomic_fetch_min(distances.slot(v), candidate);
    if candidate >= previous {
        return Ok(false);
    }

    let new_bucket = bucket_of(candidate, delta);
    if previous != INF {
        let old_bucket = bucket_of(previous, delta);
        if old_bucket != new_bucket {
            buckets.erase(old_bucket, v);
        }
    }
    // Re-inserting into the same bucket matters: the driver may already have
    // drained it this wave.
    buckets.insert(new_bucket, v)?;
    Ok(true)
}
