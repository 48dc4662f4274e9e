//! Decode orchestrator.
//!
//! Walks the layer chain from Ethernet inward. Each step looks up the
//! parser for the current protocol, checks it can decode at the current
//! offset, decodes one header, and asks the parser which protocol comes
//! next. The walk is fail-soft: a missing parser or a short buffer ends
//! the chain quietly, a malformed header ends it with an error entry, and
//! whatever bytes remain become the payload.

use std::sync::Arc;

use bytes::Bytes;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::packet::{DecodedPacket, StopReason};
use crate::protocol::{default_registry, LayerRecord, Protocol, ProtocolRegistry, ProtocolTag};

/// Protocol every frame is decoded as first.
pub const LINK_LAYER: ProtocolTag = ProtocolTag::Ethernet;

/// Turns raw frames into [`DecodedPacket`]s.
///
/// A `Decoder` owns its registry and (optional) result cache; it is
/// `Send + Sync` and meant to be shared by reference or `Arc` across
/// producer threads.
#[derive(Debug)]
pub struct Decoder {
    registry: ProtocolRegistry,
    cache: Option<ResultCache>,
}

impl Decoder {
    /// Create a decoder with all built-in parsers.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let cache = config.cache.map(ResultCache::new).transpose()?;
        Ok(Self::with_registry(default_registry(), cache))
    }

    /// Create a decoder around a custom registry and cache.
    pub fn with_registry(registry: ProtocolRegistry, cache: Option<ResultCache>) -> Self {
        Self { registry, cache }
    }

    /// Decode a frame, consulting the result cache first.
    ///
    /// Identical bytes yield the same shared result while it is cached.
    pub fn decode(&self, raw: &[u8]) -> Result<Arc<DecodedPacket>> {
        if raw.is_empty() {
            return Err(Error::EmptyInput);
        }

        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.walk(raw)));
        };

        // Hash once, use the key for both lookup and insert
        let key = CacheKey::for_bytes(raw);
        if let Some(hit) = cache.get_key(&key) {
            return Ok(hit);
        }

        let packet = Arc::new(self.walk(raw));
        cache.put_key(key, Arc::clone(&packet));
        Ok(packet)
    }

    /// Decode a frame without touching the cache.
    pub fn decode_uncached(&self, raw: &[u8]) -> Result<DecodedPacket> {
        if raw.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(self.walk(raw))
    }

    fn walk(&self, raw: &[u8]) -> DecodedPacket {
        let mut layers: SmallVec<[LayerRecord; 4]> = SmallVec::new();
        let mut errors = Vec::new();
        let mut offset = 0;
        let mut current = LINK_LAYER;

        let stop = loop {
            if offset >= raw.len() {
                break StopReason::Exhausted;
            }

            let Some(parser) = self.registry.get(current) else {
                break StopReason::Unregistered(current);
            };

            if !parser.can_decode(raw, offset) {
                break StopReason::Insufficient(current);
            }

            match parser.decode(raw, offset) {
                Ok(record) => {
                    let next = parser.next_protocol(&record);
                    // Every header consumes at least one byte, so the walk terminates
                    debug_assert!(record.end() > offset);
                    offset = record.end();
                    layers.push(record);

                    match next {
                        Some(tag) => current = tag,
                        None => break StopReason::Terminal(current),
                    }
                }
                Err(e) => {
                    warn!(protocol = %current, offset, error = %e, "malformed header");
                    errors.push(e.to_string());
                    break StopReason::Malformed(current);
                }
            }
        };

        debug!(
            layers = layers.len(),
            payload = raw.len().saturating_sub(offset),
            stop = ?stop,
            "decode chain finished"
        );

        DecodedPacket::new(Bytes::copy_from_slice(raw), layers, offset, errors, stop)
    }

    /// The result cache, if enabled.
    pub fn cache(&self) -> Option<&ResultCache> {
        self.cache.as_ref()
    }

    /// Cache statistics, if the cache is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResultCache::stats)
    }

    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }
}

impl Default for Decoder {
    /// All built-in parsers, no cache.
    fn default() -> Self {
        Self::with_registry(default_registry(), None)
    }
}
