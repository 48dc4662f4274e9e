//! Command-line argument definitions.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use pktdecode_core::config::{
    CacheConfig, DecoderConfig, PipelineConfig, ProcessorConfig, DEFAULT_BATCH_SIZE,
    DEFAULT_CACHE_CAPACITY, DEFAULT_QUEUE_CAPACITY,
};

use super::OutputFormat;

/// Decode captured frames layer by layer and persist a record per frame.
#[derive(Parser, Debug)]
#[command(name = "pktdecode")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture file to decode (pcap or pcapng, optionally gzip-compressed)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Decode every frame without consulting the result cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Maximum number of cached decode results
    #[arg(long = "cache-capacity", default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: usize,

    /// Seconds a cached decode result stays valid
    #[arg(long = "cache-ttl", value_name = "SECONDS", default_value_t = 300)]
    pub cache_ttl: u64,

    /// Records buffered for persistence before the oldest are dropped
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Records written per batch
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Longest wait before a partial batch is written
    #[arg(long = "batch-timeout-ms", value_name = "MS", default_value_t = 2000)]
    pub batch_timeout_ms: u64,

    /// Session identifier stored with every record
    #[arg(long = "session-id")]
    pub session_id: Option<i64>,

    /// Store the raw frame bytes with every record
    #[arg(long = "store-raw")]
    pub store_raw: bool,

    /// SQLite database to persist records into
    #[cfg(feature = "sqlite")]
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Print every decoded field instead of a one-line summary
    #[arg(long = "details")]
    pub details: bool,

    /// Print field details followed by a hex dump of the frame
    #[arg(long = "hex")]
    pub hex: bool,

    /// Print only the final report
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// List the supported protocols and exit
    #[arg(long = "list-protocols")]
    pub list_protocols: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Per-frame output style selected by the flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.quiet {
            OutputFormat::None
        } else if self.hex {
            OutputFormat::Hex
        } else if self.details {
            OutputFormat::Details
        } else {
            OutputFormat::Summary
        }
    }

    /// Map the flags onto the library configuration. Validation happens
    /// when the processor is built.
    pub fn processor_config(&self) -> ProcessorConfig {
        let cache = (!self.no_cache).then(|| CacheConfig {
            capacity: self.cache_capacity,
            ttl: Duration::from_secs(self.cache_ttl),
        });

        ProcessorConfig {
            decoder: DecoderConfig { cache },
            pipeline: PipelineConfig {
                queue_capacity: self.queue_capacity,
                batch_size: self.batch_size,
                batch_timeout: Duration::from_millis(self.batch_timeout_ms),
                ..Default::default()
            },
            session_id: self.session_id,
            store_raw: self.store_raw,
        }
    }
}
