//! Atomic primitives.
//!
//! Atomic RMW operations have inherent hardware cost; callers batch where the
//! algorithm allows (word-wise unions, per-word drains).

/// Word-packed atomic bitsets.
pub mod bitset;
/// Atomic fetch-and-min on distance slots.
pub mod min;

pub use bitset::{AtomicBitset, Ones};
pub use min::{fetch_min_cas, fetch_min_native};
