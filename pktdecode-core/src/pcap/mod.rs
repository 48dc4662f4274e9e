//! Capture file input.
//!
//! - [`PcapReader`] reads legacy pcap and pcapng files, gzip-compressed or not
//! - [`RawFrame`] is one undecoded frame with its capture metadata

mod packet;
mod reader;

pub use packet::{RawFrame, LINKTYPE_ETHERNET};
pub use reader::{CaptureFormat, CaptureSource, PcapReader};
