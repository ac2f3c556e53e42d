//! Atomic fetch-and-min on 64-bit distance slots.
//!
//! Both variants return the value observed immediately before the update and
//! never raise a slot. Concurrent callers targeting the same slot therefore
//! always converge on the minimum of every proposed value.

use core::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::Backoff;

/// Hardware fetch-min (`AtomicU64::fetch_min`).
#[inline]
pub fn fetch_min_native(slot: &AtomicU64, value: u64) -> u64 {
    slot.fetch_min(value, Ordering::AcqRel)
}

/// Fetch-min lowered to a compare-exchange loop.
///
/// This is how device compilers lower a 64-bit atomic min on targets without a
/// native instruction. The loop exits early without writing once the slot
/// already holds a value `<= value`.
#[inline]
pub fn fetch_min_cas(slot: &AtomicU64, value: u64) -> u64 {
    let backoff = Backoff::new();
    let mut current = slot.load(Ordering::Acquire);
    while value < current {
        match slot.compare_exchange_weak(current, value, Ordering::AcqRel, Ordering::Acquire) {
            Ok(prev) => return prev,
            Err(actual) => {
                current = actual;
                backoff.spin();
            }
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_variants_return_previous_and_keep_minimum() {
        for f in [fetch_min_native, fetch_min_cas] {
            let slot = AtomicU64::new(10);
            assert_eq!(f(&slot, 7), 10);
            assert_eq!(slot.load(Ordering::Relaxed), 7);
            assert_eq!(f(&slot, 9), 7);
            assert_eq!(slot.load(Ordering::Relaxed), 7);
            assert_eq!(f(&slot, 7), 7);
        }
    }

    #[test]
    fn concurrent_proposals_converge_on_minimum() {
        let slot = AtomicU64::new(u64::MAX);
        std::thread::scope(|s| {
            for t in 0..8u64 {
                let slot = &slot;
                s.spawn(move || {
                    for i in (0..1000u64).rev() {
                        fetch_min_cas(slot, i * 8 + t + 3);
                    }
                });
            }
        });
        assert_eq!(slot.load(Ordering::Relaxed), 3);
    }
}
