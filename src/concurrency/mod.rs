//! Lock-free building blocks shared by the bucket structure and the backends.
//!
//! Nothing here synchronizes whole waves; the barrier between waves is the
//! backend's `parallel_for` returning. These types only make concurrent
//! updates *within* a wave well-defined.

pub mod atomic;

pub use atomic::{fetch_min_cas, fetch_min_native, AtomicBitset};
