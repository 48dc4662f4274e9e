//! pktdecode - decode captured frames into layered records.
//!
//! The binary reads a capture file, runs every frame through
//! [`pktdecode_core::PacketProcessor`], prints what it decoded and
//! persists one record per frame.

pub mod cli;
