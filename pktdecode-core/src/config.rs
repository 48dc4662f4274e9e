//! Runtime configuration.
//!
//! Every component takes a plain struct with a documented [`Default`].
//! Values are checked once, at construction, through `validate()`; a
//! running component never sees an invalid setting.

use std::time::Duration;

use crate::error::ConfigError;

/// Default maximum number of cached decode results.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Default lifetime of a cached decode result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default persistence queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default number of records per flush.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default maximum time between flushes.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Default bound on waiting for the consumer thread at shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Result cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum entries before LRU eviction (default 1000).
    pub capacity: usize,
    /// Age after which an entry is stale (default 300 s).
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity { component: "cache" });
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::Invalid {
                field: "cache.ttl",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Result cache; `None` decodes every frame from scratch.
    pub cache: Option<CacheConfig>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            cache: Some(CacheConfig::default()),
        }
    }
}

impl DecoderConfig {
    /// Decoder without a result cache.
    pub fn uncached() -> Self {
        Self { cache: None }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.cache {
            Some(cache) => cache.validate(),
            None => Ok(()),
        }
    }
}

/// Batch persistence pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Bound of the record queue (default 1000).
    pub queue_capacity: usize,
    /// Records per flush (default 50).
    pub batch_size: usize,
    /// Maximum time a record waits for a flush (default 2 s).
    pub batch_timeout: Duration,
    /// Bound on waiting for the consumer at shutdown (default 5 s).
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroCapacity { component: "queue" });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pipeline.batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.batch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "pipeline.batch_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// End-to-end processor settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub decoder: DecoderConfig,
    pub pipeline: PipelineConfig,
    /// Attached to every persisted record.
    pub session_id: Option<i64>,
    /// Persist the raw frame bytes alongside the summary columns.
    pub store_raw: bool,
}

impl ProcessorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.decoder.validate()?;
        self.pipeline.validate()
    }
}
