//! # pktdecode-core
//!
//! Packet decode data plane: layered protocol parsing, a content-addressed
//! result cache and a batched persistence pipeline.
//!
//! ## Features
//!
//! - **Protocol Decoding**: Ethernet, ARP, IPv4, IPv6, TCP, UDP and ICMP,
//!   chained through a lazily populated [`ProtocolRegistry`]
//! - **Fail-soft Decoding**: a malformed or truncated layer ends the chain
//!   but keeps every layer decoded before it
//! - **Result Cache**: SHA-256 keyed, TTL plus LRU bounded, shared `Arc` results
//! - **Persistence Pipeline**: drop-oldest bounded queue drained by one
//!   writer thread in size or time triggered batches
//! - **Capture Files**: pcap and pcapng input, optionally gzip-compressed
//!
//! ## Quick Start
//!
//! ```rust
//! use pktdecode_core::prelude::*;
//!
//! let decoder = Decoder::new(DecoderConfig::default()).unwrap();
//!
//! let frame: &[u8] = &[
//!     0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst mac
//!     0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src mac
//!     0x08, 0x06,                         // ARP, but no ARP body follows
//! ];
//!
//! let packet = decoder.decode(frame).unwrap();
//! assert_eq!(packet.protocol_stack(), vec!["Ethernet"]);
//! assert_eq!(packet.stop_reason(), StopReason::Exhausted);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                          pktdecode-core                             |
//! +---------------------------------------------------------------------+
//! |  protocol/   - Protocol trait, layer parsers, registry, FieldValue  |
//! |  decoder     - Decode chain over the registry, cache integration    |
//! |  packet      - DecodedPacket, StopReason                            |
//! |  cache/      - SHA-256 keyed TTL + LRU result cache                 |
//! |  pipeline/   - BatchRecord, drop-oldest queue, batch writer thread  |
//! |  storage/    - PacketSink trait, memory and SQLite sinks            |
//! |  processor   - Decode, statistics and persistence in one call       |
//! |  stats       - Running traffic statistics                           |
//! |  pcap/       - pcap/pcapng reading, gzip decompression              |
//! |  format/     - Address formatting, summaries, hex dumps             |
//! |  config      - Cache, decoder and pipeline settings                 |
//! |  error       - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Crate Features
//!
//! - `default` - Gzip decompression enabled
//! - `compress-gzip` - Gzip decompression of capture files
//! - `sqlite` - [`storage::SqliteSink`] backed by rusqlite

pub mod cache;
pub mod config;
pub mod decoder;
pub mod error;
pub mod format;
pub mod packet;
pub mod pcap;
pub mod pipeline;
pub mod prelude;
pub mod processor;
pub mod protocol;
pub mod stats;
pub mod storage;

// Main types at the crate root
pub use cache::{CacheEntryInfo, CacheKey, CacheStats, ResultCache};
pub use config::{CacheConfig, DecoderConfig, PipelineConfig, ProcessorConfig};
pub use decoder::{Decoder, LINK_LAYER};
pub use error::{ConfigError, DecodeError, Error, PcapError, Result, StorageError};
pub use format::{details, format_ipv4, format_ipv6, format_mac, hex_dump, summary};
pub use packet::{DecodedPacket, StopReason};
pub use pcap::{CaptureFormat, PcapReader, RawFrame, LINKTYPE_ETHERNET};
pub use pipeline::{BatchQueue, BatchRecord, BatchWriter, PipelineStatus, PushOutcome};
pub use processor::PacketProcessor;
pub use protocol::{
    default_registry, BuiltinProtocol, FieldValue, LayerRecord, Protocol, ProtocolRegistry,
    ProtocolTag,
};
pub use stats::{Connection, ConnectionKey, TrafficSample, TrafficStats};
#[cfg(feature = "sqlite")]
pub use storage::SqliteSink;
pub use storage::{MemorySink, NullSink, PacketSink};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
