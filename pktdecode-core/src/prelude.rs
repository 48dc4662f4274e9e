//! Convenient re-exports for common usage.
//!
//! ```rust
//! use pktdecode_core::prelude::*;
//!
//! let decoder = Decoder::default();
//! assert!(decoder.cache().is_none());
//! ```

// Protocol types
pub use crate::protocol::{
    default_registry, FieldValue, LayerRecord, Protocol, ProtocolRegistry, ProtocolTag,
};

// Decoding
pub use crate::decoder::Decoder;
pub use crate::packet::{DecodedPacket, StopReason};

// Configuration
pub use crate::config::{CacheConfig, DecoderConfig, PipelineConfig, ProcessorConfig};

// Cache types
pub use crate::cache::{CacheStats, ResultCache};

// Persistence
pub use crate::pipeline::{BatchRecord, BatchWriter, PushOutcome};
pub use crate::processor::PacketProcessor;
pub use crate::storage::{MemorySink, PacketSink};

// Input
pub use crate::pcap::{PcapReader, RawFrame};

// Error types
pub use crate::error::{Error, Result};
