//! Execution backends.
//!
//! The phase driver expresses every relaxation wave as a flat index range of
//! independent work items and hands it to an [`ExecutionBackend`]. A backend
//! supplies exactly two things:
//!
//! - `parallel_for`: run a kernel once per index and return only after all of
//!   them finished. Returning *is* the barrier between waves.
//! - `atomic_fetch_min`: the combinator concurrent relaxations of the same
//!   vertex race through.
//!
//! Backends are selected at run-configuration time through [`BackendKind`] and
//! owned by an [`ExecutionContext`] the caller passes in; there is no
//! process-global queue.

mod offload;
mod sequential;
mod thread_pool;

pub use offload::OffloadBackend;
pub use sequential::SequentialBackend;
pub use thread_pool::ThreadPoolBackend;

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::AtomicU64;
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{config::SsspConfig, error::SsspError, Distance};

/// A concurrency strategy the phase driver dispatches waves through.
///
/// Final distances must not depend on which implementation runs them.
pub trait ExecutionBackend: Send + Sync {
    /// Short human-readable name.
    fn name(&self) -> &'static str;

    /// Number of workers a wave may be spread over.
    fn parallelism(&self) -> usize;

    /// Runs `kernel(i)` for every `i in 0..items`.
    ///
    /// Returns only after every invocation has completed and its writes are
    /// visible to the caller. Invocations may run in any order and concurrently.
    fn parallel_for(&self, items: usize, kernel: &(dyn Fn(usize) + Sync));

    /// Atomically lowers `slot` to `value` if smaller and returns the previous value.
    fn atomic_fetch_min(&self, slot: &AtomicU64, value: Distance) -> Distance;
}

/// The built-in backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Inline, in index order.
    Sequential,
    /// Persistent CPU worker threads.
    #[default]
    ThreadPool,
    /// Accelerator-offload queue.
    Offload,
}

impl BackendKind {
    /// Every built-in backend, sequential first.
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Sequential,
        BackendKind::ThreadPool,
        BackendKind::Offload,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Sequential => "sequential",
            BackendKind::ThreadPool => "thread-pool",
            BackendKind::Offload => "offload",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "serial" | "seq" => Ok(BackendKind::Sequential),
            "thread-pool" | "thread_pool" | "threads" | "cpu" => Ok(BackendKind::ThreadPool),
            "offload" | "accelerator" | "gpu" | "device" => Ok(BackendKind::Offload),
            other => Err(format!(
                "unknown backend `{other}` (expected sequential, thread-pool or offload)"
            )),
        }
    }
}

/// Caller-owned handle to the backend a run executes on.
pub struct ExecutionContext {
    backend: Box<dyn ExecutionBackend>,
}

impl ExecutionContext {
    /// Builds a built-in backend with default chunking.
    ///
    /// `threads == 0` means the available parallelism.
    ///
    /// # Errors
    /// [`SsspError::Backend`] if the backend's threads cannot be spawned.
    pub fn new(kind: BackendKind, threads: usize) -> Result<Self, SsspError> {
        Self::from_config(&SsspConfig::default().with_backend(kind).with_threads(threads))
    }

    /// Builds the backend `config` names, with its thread and chunking settings.
    ///
    /// # Errors
    /// [`SsspError::InvalidConfig`] for zero chunk or work-group sizes,
    /// [`SsspError::Backend`] if the backend's threads cannot be spawned.
    pub fn from_config(config: &SsspConfig) -> Result<Self, SsspError> {
        if config.chunk_size == 0 {
            return Err(SsspError::InvalidConfig("chunk_size must be positive"));
        }
        if config.work_group_size == 0 {
            return Err(SsspError::InvalidConfig("work_group_size must be positive"));
        }
        let threads = resolve_threads(config.threads);
        let backend: Box<dyn ExecutionBackend> = match config.backend {
            BackendKind::Sequential => Box::new(SequentialBackend),
            BackendKind::ThreadPool => {
                Box::new(ThreadPoolBackend::new(threads, config.chunk_size)?)
            }
            BackendKind::Offload => Box::new(OffloadBackend::new(threads, config.work_group_size)?),
        };
        sssp_debug!(
            backend = backend.name(),
            threads = backend.parallelism(),
            "execution context ready"
        );
        Ok(Self { backend })
    }

    /// A context running everything inline.
    pub fn sequential() -> Self {
        Self::with_backend(Box::new(SequentialBackend))
    }

    /// Wraps a custom backend.
    pub fn with_backend(backend: Box<dyn ExecutionBackend>) -> Self {
        Self { backend }
    }

    /// The backend waves are dispatched through.
    pub fn backend(&self) -> &dyn ExecutionBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("backend", &self.backend.name())
            .field("parallelism", &self.backend.parallelism())
            .finish()
    }
}

/// `0` -> available parallelism (at least 1).
pub(crate) fn resolve_threads(threads: usize) -> usize {
    if threads != 0 {
        return threads;
    }
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
