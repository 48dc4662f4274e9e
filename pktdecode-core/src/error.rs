//! Error types for pktdecode-core.
//!
//! This module provides structured error types for all pktdecode-core operations:
//!
//! - [`enum@Error`] - Main error enum returned to callers
//! - [`DecodeError`] - Per-layer decode failures (never escape the decoder)
//! - [`ConfigError`] - Invalid configuration, rejected at construction time
//! - [`StorageError`] - Failures reported by a [`PacketSink`](crate::storage::PacketSink)
//! - [`PcapError`] - Errors from capture file reading
//!
//! Every error type converts into [`Error`], and from there into `anyhow::Error` in the binary.

use thiserror::Error;

/// Main error type for pktdecode-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// `decode` was handed an empty buffer
    #[error("cannot decode an empty buffer")]
    EmptyInput,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Error reading or parsing a capture file
    #[error("PCAP error: {0}")]
    Pcap(#[from] PcapError),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while decoding a single protocol layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the layer's minimum header
    #[error("{protocol}: insufficient data (need {needed} bytes, have {have})")]
    InsufficientData {
        protocol: &'static str,
        needed: usize,
        have: usize,
    },

    /// Header passed the shape check but failed a consistency check
    #[error("{protocol}: malformed {field}: {reason}")]
    MalformedHeader {
        protocol: &'static str,
        field: &'static str,
        reason: String,
    },
}

impl DecodeError {
    /// Shorthand for building a [`DecodeError::MalformedHeader`].
    pub fn malformed(protocol: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        DecodeError::MalformedHeader {
            protocol,
            field,
            reason: reason.into(),
        }
    }

    /// Name of the protocol that failed.
    pub fn protocol(&self) -> &'static str {
        match self {
            DecodeError::InsufficientData { protocol, .. } => protocol,
            DecodeError::MalformedHeader { protocol, .. } => protocol,
        }
    }
}

/// Configuration rejected at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A capacity that must be positive was zero
    #[error("{component} capacity must be greater than zero")]
    ZeroCapacity { component: &'static str },

    /// A setting is out of its valid range
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Failure reported by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("{backend}: {reason}")]
    Backend {
        backend: &'static str,
        reason: String,
    },

    /// SQLite failure
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors related to capture file reading.
#[derive(Error, Debug)]
pub enum PcapError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Invalid PCAP format
    #[error("Invalid PCAP format: {reason}")]
    InvalidFormat { reason: String },

    /// Compressed capture but decompression support was not compiled in
    #[error("Compressed capture {path} requires the compress-gzip feature")]
    CompressionUnsupported { path: String },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
