//! Run configuration.
//!
//! Every field has a default, so a config document only needs the fields it
//! changes:
//!
//! ```rust
//! use delta_sssp::{BackendKind, SsspConfig};
//!
//! let cfg = SsspConfig::from_json_str(r#"{ "delta": 25, "backend": "offload" }"#).unwrap();
//! assert_eq!(cfg.delta, 25);
//! assert_eq!(cfg.backend, BackendKind::Offload);
//! assert_eq!(cfg.max_edge_weight, 100);
//! ```

use serde::{Deserialize, Serialize};

use crate::{
    backend::BackendKind,
    error::{ConfigError, SsspError},
    graph::EdgeDirection,
    Distance, Weight, DEFAULT_BUCKET_SAFETY_FACTOR, DEFAULT_DELTA, DEFAULT_MAX_BUCKETS,
    DEFAULT_MAX_EDGE_WEIGHT,
};

/// Upper bound on buckets reserved eagerly; anything beyond grows on demand.
const MAX_EAGER_BUCKETS: usize = 1 << 16;

/// Parameters for one delta-stepping run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SsspConfig {
    /// Bucket width and light/heavy threshold.
    pub delta: Distance,
    /// Weight bound used to size the initial bucket array.
    pub max_edge_weight: Weight,
    /// Multiplier on the initial bucket estimate.
    pub bucket_safety_factor: usize,
    /// Bucket indices at or above this fail the run with
    /// [`SsspError::BucketLimit`].
    pub max_buckets: usize,
    /// Relax stored edges one way or both ways.
    pub direction: EdgeDirection,
    /// Backend built by [`ExecutionContext::from_config`](crate::ExecutionContext::from_config).
    pub backend: BackendKind,
    /// Worker threads; `0` means the available parallelism.
    pub threads: usize,
    /// Work items claimed per step by the thread-pool backend.
    pub chunk_size: usize,
    /// Minimum work items per task on the offload backend.
    pub work_group_size: usize,
}

impl Default for SsspConfig {
    fn default() -> Self {
        Self {
            delta: DEFAULT_DELTA,
            max_edge_weight: DEFAULT_MAX_EDGE_WEIGHT,
            bucket_safety_factor: DEFAULT_BUCKET_SAFETY_FACTOR,
            max_buckets: DEFAULT_MAX_BUCKETS,
            direction: EdgeDirection::Directed,
            backend: BackendKind::ThreadPool,
            threads: 0,
            chunk_size: 256,
            work_group_size: 64,
        }
    }
}

impl SsspConfig {
    /// Default configuration with the given `delta`.
    pub fn new(delta: Distance) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Returns `self` with `backend` replaced.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Returns `self` with `direction` replaced.
    #[must_use]
    pub fn with_direction(mut self, direction: EdgeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Returns `self` with `threads` replaced.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// [`ConfigError::Json`] for malformed documents or unknown fields,
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    /// Only fails if serialization itself fails, which the schema rules out.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [`SsspError::InvalidDelta`] for a zero delta, [`SsspError::InvalidConfig`]
    /// for any other zero-valued size or count.
    pub fn validate(&self) -> Result<(), SsspError> {
        if self.delta == 0 {
            return Err(SsspError::InvalidDelta);
        }
        if self.bucket_safety_factor == 0 {
            return Err(SsspError::InvalidConfig("bucket_safety_factor must be positive"));
        }
        if self.max_buckets == 0 {
            return Err(SsspError::InvalidConfig("max_buckets must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(SsspError::InvalidConfig("chunk_size must be positive"));
        }
        if self.work_group_size == 0 {
            return Err(SsspError::InvalidConfig("work_group_size must be positive"));
        }
        Ok(())
    }

    /// Buckets reserved before the first relaxation:
    /// `(max_edge_weight / delta + 1) * bucket_safety_factor`, capped.
    pub fn initial_bucket_count(&self) -> usize {
        let per_weight = Distance::from(self.max_edge_weight) / self.delta.max(1) + 1;
        usize::try_from(per_weight)
            .unwrap_or(usize::MAX)
            .saturating_mul(self.bucket_safety_factor)
            .min(MAX_EAGER_BUCKETS)
    }
}
