//! Segmented, lazily allocated bucket array.
//!
//! Bucket `i` holds the vertices whose tentative distance lies in
//! `[i * delta, (i + 1) * delta)`. Storage is split into segments where
//! segment `k` holds `2^k` buckets, so bucket `i` lives in segment
//! `floor(log2(i + 1))`. A segment is allocated the first time any of its
//! buckets is touched and never moves afterwards, which lets relaxations grow
//! the array while other work items read lower buckets. Each bucket's
//! membership bitset is allocated on first insert.
//!
//! Indices at or above the array's limit are refused with
//! [`SsspError::BucketLimit`], and segments or bitsets that cannot be
//! allocated surface as [`SsspError::Allocation`]. Header memory is bounded by
//! roughly twice the limit.
//!
//! ### Performance Characteristics
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `insert` / `erase` | \(O(1)\) | One `fetch_or` / `fetch_and` plus the member counter |
//! | `is_empty` / `len` | \(O(1)\) | Counter read |
//! | `ensure` | \(O(1)\) amortized | Allocates at most one segment |
//! | `take_members` / `union_into` | \(O(n / w)\) | One pass over the bucket's words |
//! | `next_non_empty` | \(O(h)\) | `h` allocated headers past `from`; gaps skipped |

use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::concurrency::AtomicBitset;
use crate::error::SsspError;
use crate::{VertexId, DEFAULT_MAX_BUCKETS};

const SEGMENTS: usize = usize::BITS as usize;

#[derive(Default)]
struct Bucket {
    members: OnceLock<AtomicBitset>,
    len: AtomicUsize,
}

/// Maps a bucket index to `(segment, offset)`.
#[inline]
fn locate(index: usize) -> (usize, usize) {
    debug_assert!(index < usize::MAX, "bucket index overflow");
    let slot = index + 1;
    let segment = (usize::BITS - 1 - slot.leading_zeros()) as usize;
    (segment, slot - (1usize << segment))
}

/// First bucket index stored in `segment`; saturates past the last segment.
#[inline]
fn segment_start(segment: usize) -> usize {
    u32::try_from(segment)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .map_or(usize::MAX, |first| first - 1)
}

/// Per-run array of vertex buckets.
pub struct BucketArray {
    vertices: usize,
    limit: usize,
    segments: [OnceLock<Box<[Bucket]>>; SEGMENTS],
    created: AtomicUsize,
}

impl BucketArray {
    /// Creates an empty array for a graph with `vertices` vertices, accepting
    /// bucket indices below [`DEFAULT_MAX_BUCKETS`].
    pub fn new(vertices: usize) -> Self {
        Self::with_limit(vertices, DEFAULT_MAX_BUCKETS)
    }

    /// Creates an empty array accepting bucket indices below `limit`.
    pub fn with_limit(vertices: usize, limit: usize) -> Self {
        Self {
            vertices,
            limit,
            segments: core::array::from_fn(|_| OnceLock::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Creates an array with buckets `0..buckets` already in place.
    ///
    /// # Errors
    /// As [`ensure`](Self::ensure).
    pub fn with_capacity(vertices: usize, buckets: usize) -> Result<Self, SsspError> {
        let array = Self::new(vertices);
        array.reserve(buckets)?;
        Ok(array)
    }

    /// Number of vertices each bucket ranges over.
    pub fn vertex_count(&self) -> usize {
        self.vertices
    }

    /// One past the highest bucket index this array accepts.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// One past the highest bucket index ever created.
    pub fn bucket_count(&self) -> usize {
        self.created.load(Ordering::Acquire)
    }

    /// Makes sure buckets `0..count` exist.
    ///
    /// # Errors
    /// As [`ensure`](Self::ensure).
    pub fn reserve(&self, count: usize) -> Result<(), SsspError> {
        match count.checked_sub(1) {
            Some(last) => self.ensure(last),
            None => Ok(()),
        }
    }

    /// Grows the array so bucket `index` exists.
    ///
    /// Safe to call concurrently with every other shared-reference operation.
    ///
    /// # Errors
    /// [`SsspError::BucketLimit`] if `index` is at or above the limit,
    /// [`SsspError::Allocation`] if its segment cannot be allocated.
    pub fn ensure(&self, index: usize) -> Result<(), SsspError> {
        self.bucket(index).map(|_| ())
    }

    fn bucket(&self, index: usize) -> Result<&Bucket, SsspError> {
        if index >= self.limit {
            return Err(SsspError::BucketLimit {
                index,
                limit: self.limit,
            });
        }
        let (segment, offset) = locate(index);
        let buckets = self.segment(segment)?;
        self.created.fetch_max(index + 1, Ordering::AcqRel);
        Ok(&buckets[offset])
    }

    fn segment(&self, segment: usize) -> Result<&[Bucket], SsspError> {
        if let Some(buckets) = self.segments[segment].get() {
            return Ok(&buckets[..]);
        }
        let len = 1usize << segment;
        let mut fresh = Vec::new();
        fresh
            .try_reserve_exact(len)
            .map_err(|_| SsspError::Allocation {
                bytes: len.saturating_mul(core::mem::size_of::<Bucket>()),
            })?;
        fresh.resize_with(len, Bucket::default);
        // A racing grower may have installed its own empty segment first.
        Ok(&self.segments[segment].get_or_init(|| fresh.into_boxed_slice())[..])
    }

    fn existing(&self, index: usize) -> Option<&Bucket> {
        let (segment, offset) = locate(index);
        self.segments[segment].get().map(|buckets| &buckets[offset])
    }

    /// Adds `vertex` to bucket `index`, growing the array if needed.
    ///
    /// Returns `true` if the vertex was not already a member.
    ///
    /// # Errors
    /// As [`ensure`](Self::ensure), plus [`SsspError::Allocation`] if the
    /// bucket's bitset cannot be allocated.
    pub fn insert(&self, index: usize, vertex: VertexId) -> Result<bool, SsspError> {
        let bucket = self.bucket(index)?;
        let members = match bucket.members.get() {
            Some(members) => members,
            None => {
                let fresh = AtomicBitset::try_new(self.vertices).map_err(|_| {
                    SsspError::Allocation {
                        bytes: self.vertices.div_ceil(8),
                    }
                })?;
                bucket.members.get_or_init(|| fresh)
            }
        };
        let added = members.test_and_set(vertex, Ordering::AcqRel);
        if added {
            bucket.len.fetch_add(1, Ordering::AcqRel);
        }
        Ok(added)
    }

    /// Removes `vertex` from bucket `index`.
    ///
    /// Returns `true` if the vertex was a member. Erasing from a bucket that
    /// was never created is a no-op.
    pub fn erase(&self, index: usize, vertex: VertexId) -> bool {
        let Some(bucket) = self.existing(index) else {
            return false;
        };
        let Some(members) = bucket.members.get() else {
            return false;
        };
        let removed = members.test_and_clear(vertex, Ordering::AcqRel);
        if removed {
            bucket.len.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Whether bucket `index` has no members.
    ///
    /// Exact once the wave that last touched the bucket has finished.
    pub fn is_empty(&self, index: usize) -> bool {
        self.len(index) == 0
    }

    /// Smallest non-empty bucket index at or above `from`.
    ///
    /// Segments that were never allocated (or were retired) are skipped whole.
    pub fn next_non_empty(&self, from: usize) -> Option<usize> {
        let end = self.bucket_count();
        let mut index = from;
        while index < end {
            let (segment, offset) = locate(index);
            if let Some(buckets) = self.segments[segment].get() {
                let hit = buckets[offset..]
                    .iter()
                    .position(|b| b.len.load(Ordering::Acquire) != 0);
                if let Some(pos) = hit {
                    return Some(index + pos).filter(|&i| i < end);
                }
            }
            index = segment_start(segment + 1);
        }
        None
    }

    /// Member count of bucket `index`.
    pub fn len(&self, index: usize) -> usize {
        self.existing(index)
            .map_or(0, |bucket| bucket.len.load(Ordering::Acquire))
    }

    /// Whether `vertex` is currently a member of bucket `index`.
    pub fn contains(&self, index: usize, vertex: VertexId) -> bool {
        self.existing(index)
            .and_then(|bucket| bucket.members.get())
            .is_some_and(|members| members.is_set(vertex))
    }

    /// Members of bucket `index`, ascending.
    pub fn members(&self, index: usize) -> Vec<VertexId> {
        self.existing(index)
            .and_then(|bucket| bucket.members.get())
            .map_or_else(Vec::new, |members| members.iter_ones().collect())
    }

    /// ORs bucket `index`'s membership into `accumulator`.
    ///
    /// Returns how many vertices were new to the accumulator; repeating the
    /// same union returns 0.
    ///
    /// # Panics
    /// Panics if `accumulator` does not span [`vertex_count`](Self::vertex_count) bits.
    pub fn union_into(&self, accumulator: &AtomicBitset, index: usize) -> usize {
        assert_eq!(accumulator.len_bits(), self.vertices, "accumulator length mismatch");
        self.existing(index)
            .and_then(|bucket| bucket.members.get())
            .map_or(0, |members| accumulator.union_with(members))
    }

    /// Snapshots and clears bucket `index`, returning its former members ascending.
    pub fn take_members(&self, index: usize) -> Vec<VertexId> {
        let Some(bucket) = self.existing(index) else {
            return Vec::new();
        };
        let Some(members) = bucket.members.get() else {
            return Vec::new();
        };
        let taken = members.drain();
        bucket.len.fetch_sub(taken.len(), Ordering::AcqRel);
        taken
    }

    /// Clears every bucket, keeping allocated storage.
    pub fn clear(&self) {
        for buckets in self.segments.iter().filter_map(OnceLock::get) {
            for bucket in buckets.iter() {
                if let Some(members) = bucket.members.get() {
                    members.clear_all();
                }
                bucket.len.store(0, Ordering::Release);
            }
        }
    }

    /// Frees the storage of bucket `index`.
    ///
    /// Meant for buckets the driver has moved past: with non-negative weights
    /// nothing is ever inserted below the bucket being processed. Once the last
    /// bucket of a segment is retired, the whole segment is released.
    /// [`bucket_count`](Self::bucket_count) is unaffected.
    pub fn retire(&mut self, index: usize) {
        let (segment, offset) = locate(index);
        let Some(buckets) = self.segments[segment].get_mut() else {
            return;
        };
        let bucket = &mut buckets[offset];
        bucket.members.take();
        *bucket.len.get_mut() = 0;
        if offset + 1 == buckets.len() {
            self.segments[segment].take();
        }
    }

    /// Retires every bucket in `range`, skipping segments that are already gone.
    pub fn retire_range(&mut self, range: core::ops::Range<usize>) {
        let mut index = range.start;
        while index < range.end {
            let (segment, _) = locate(index);
            if self.segments[segment].get().is_none() {
                index = segment_start(segment + 1);
                continue;
            }
            self.retire(index);
            index += 1;
        }
    }

    /// Bytes currently held by allocated segments and bitsets.
    pub fn size_in_bytes(&self) -> usize {
        self.segments
            .iter()
            .filter_map(OnceLock::get)
            .map(|buckets| {
                buckets.len() * core::mem::size_of::<Bucket>()
                    + buckets
                        .iter()
                        .filter_map(|b| b.members.get())
                        .map(AtomicBitset::size_in_bytes)
                        .sum::<usize>()
            })
            .sum()
    }
}

impl core::fmt::Debug for BucketArray {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BucketArray")
            .field("vertices", &self.vertices)
            .field("bucket_count", &self.bucket_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_covers_segments_contiguously() {
        assert_eq!(locate(0), (0, 0));
        assert_eq!(locate(1), (1, 0));
        assert_eq!(locate(2), (1, 1));
        assert_eq!(locate(3), (2, 0));
        assert_eq!(locate(6), (2, 3));
        assert_eq!(locate(7), (3, 0));

        let mut expected = (0, 0);
        for i in 0..1_000 {
            let got = locate(i);
            assert_eq!(got, expected, "index {i}");
            expected = if expected.1 + 1 == 1 << expected.0 {
                (expected.0 + 1, 0)
            } else {
                (expected.0, expected.1 + 1)
            };
        }
    }

    #[test]
    fn insert_erase_track_len() {
        let b = BucketArray::new(10);
        assert!(b.is_empty(0));
        assert!(b.insert(0, 3).unwrap());
        assert!(!b.insert(0, 3).unwrap());
        assert!(b.insert(0, 7).unwrap());
        assert_eq!(b.len(0), 2);
        assert!(b.erase(0, 3));
        assert!(!b.erase(0, 3));
        assert_eq!(b.members(0), vec![7]);
        assert!(!b.is_empty(0));
    }

    #[test]
    fn insert_grows_past_reservation() {
        let b = BucketArray::with_capacity(4, 3).unwrap();
        assert_eq!(b.bucket_count(), 3);
        b.insert(40, 1).unwrap();
        assert_eq!(b.bucket_count(), 41);
        assert!(b.contains(40, 1));
        assert!(b.is_empty(20));
        // erasing from a bucket that was never touched is a no-op
        assert!(!b.erase(1_000, 1));
        assert_eq!(b.bucket_count(), 41);
    }

    #[test]
    fn indices_at_the_limit_are_refused() {
        let b = BucketArray::with_limit(4, 10);
        b.insert(9, 1).unwrap();
        assert!(matches!(
            b.insert(10, 1),
            Err(SsspError::BucketLimit { index: 10, limit: 10 })
        ));
        assert!(b.reserve(11).is_err());
        assert!(b.reserve(10).is_ok());
        assert_eq!(b.bucket_count(), 10);
    }

    #[test]
    fn unallocatable_segment_is_reported() {
        // the last segment holds 2^63 headers, which no allocator can satisfy
        let b = BucketArray::with_limit(4, usize::MAX);
        assert!(matches!(
            b.ensure(usize::MAX - 2),
            Err(SsspError::Allocation { .. })
        ));
        assert_eq!(b.bucket_count(), 0);
    }

    #[test]
    fn segment_start_matches_locate() {
        for segment in 0..20 {
            assert_eq!(locate(segment_start(segment)), (segment, 0));
        }
        assert_eq!(segment_start(64), usize::MAX);
    }

    #[test]
    fn next_non_empty_skips_missing_segments() {
        let mut b = BucketArray::new(8);
        b.insert(2, 1).unwrap();
        b.insert(500, 3).unwrap();
        assert_eq!(b.next_non_empty(0), Some(2));
        assert_eq!(b.next_non_empty(3), Some(500));
        assert_eq!(b.next_non_empty(501), None);

        b.take_members(2);
        b.retire_range(0..500);
        assert_eq!(b.next_non_empty(0), Some(500));
        assert!(b.contains(500, 3));
    }

    #[test]
    fn take_members_clears_and_resets_len() {
        let b = BucketArray::new(100);
        for v in [9, 2, 64] {
            b.insert(5, v).unwrap();
        }
        assert_eq!(b.take_members(5), vec![2, 9, 64]);
        assert!(b.is_empty(5));
        assert!(b.take_members(5).is_empty());
        assert!(b.take_members(99).is_empty());
    }

    #[test]
    fn union_into_is_idempotent() {
        let b = BucketArray::new(8);
        let acc = AtomicBitset::new(8);
        b.insert(2, 1).unwrap();
        b.insert(2, 6).unwrap();
        assert_eq!(b.union_into(&acc, 2), 2);
        assert_eq!(b.union_into(&acc, 2), 0);
        assert_eq!(b.union_into(&acc, 3), 0);
        assert_eq!(acc.iter_ones().collect::<Vec<_>>(), vec![1, 6]);
    }

    #[test]
    fn retire_releases_storage() {
        let mut b = BucketArray::new(1_024);
        b.insert(1, 5).unwrap();
        b.insert(2, 6).unwrap();
        let before = b.size_in_bytes();
        b.take_members(1);
        b.retire(1);
        assert!(b.size_in_bytes() < before);
        assert!(b.contains(2, 6));
        b.take_members(2);
        b.retire(2);
        // segment 1 (buckets 1 and 2) is gone entirely
        assert!(b.is_empty(1) && b.is_empty(2));
        assert_eq!(b.bucket_count(), 3);
    }

    #[test]
    fn clear_empties_everything() {
        let b = BucketArray::new(16);
        b.insert(0, 1).unwrap();
        b.insert(9, 2).unwrap();
        b.clear();
        assert!(b.is_empty(0) && b.is_empty(9));
        assert!(b.members(9).is_empty());
    }
}
