//! Capture file reader.
//!
//! Wraps `pcap_parser`'s streaming readers behind a single
//! [`PcapReader::next_frame`] call. Legacy pcap (either byte order, micro or
//! nanosecond timestamps) and pcapng are detected from the magic number;
//! gzip-compressed captures are unpacked on the fly when the
//! `compress-gzip` feature is enabled.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use bytes::Bytes;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, PcapBlockOwned, PcapNGReader};
use tracing::debug;

#[cfg(feature = "compress-gzip")]
use flate2::read::GzDecoder;

use super::packet::{RawFrame, LINKTYPE_ETHERNET};
use crate::error::{Error, PcapError};

/// Buffer handed to `pcap_parser` (256 KiB).
const BUFFER_SIZE: usize = 262_144;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// On-disk layout, from the first four bytes of the (decompressed) file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    LegacyMicro,
    LegacyNano,
    PcapNg,
}

impl CaptureFormat {
    pub fn detect(magic: [u8; 4]) -> Result<Self, PcapError> {
        match magic {
            [0xd4, 0xc3, 0xb2, 0xa1] | [0xa1, 0xb2, 0xc3, 0xd4] => Ok(Self::LegacyMicro),
            [0x4d, 0x3c, 0xb2, 0xa1] | [0xa1, 0xb2, 0x3c, 0x4d] => Ok(Self::LegacyNano),
            [0x0a, 0x0d, 0x0d, 0x0a] => Ok(Self::PcapNg),
            _ => Err(PcapError::InvalidFormat {
                reason: format!("unknown capture magic: {:02x?}", magic),
            }),
        }
    }

    pub fn is_pcapng(&self) -> bool {
        matches!(self, Self::PcapNg)
    }
}

/// Byte source under the parser, plain or decompressing.
pub enum CaptureSource {
    Plain(File),
    #[cfg(feature = "compress-gzip")]
    Gzip(GzDecoder<File>),
}

impl CaptureSource {
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }
}

impl Read for CaptureSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            #[cfg(feature = "compress-gzip")]
            Self::Gzip(r) => r.read(buf),
        }
    }
}

enum ReaderInner {
    Legacy(LegacyPcapReader<CaptureSource>),
    Ng(PcapNGReader<CaptureSource>),
}

/// Sequential reader over a capture file.
///
/// ```ignore
/// let mut reader = PcapReader::open("capture.pcap.gz")?;
/// while let Some(frame) = reader.next_frame()? {
///     println!("frame {}: {} bytes", frame.frame_number, frame.data.len());
/// }
/// ```
pub struct PcapReader {
    inner: ReaderInner,
    format: CaptureFormat,
    compressed: bool,
    frame_number: u64,
    link_type: u16,
}

impl PcapReader {
    /// Open a capture file, detecting compression and format.
    ///
    /// The magic number is read from a throwaway source; the parser gets a
    /// freshly opened one so it sees the file header from the first byte.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let format = detect_format(open_source(path)?)?;

        let source = open_source(path)?;
        let compressed = source.is_compressed();
        let inner = if format.is_pcapng() {
            let reader = PcapNGReader::new(BUFFER_SIZE, source).map_err(|e| {
                PcapError::InvalidFormat {
                    reason: format!("failed to parse pcapng header: {}", e),
                }
            })?;
            ReaderInner::Ng(reader)
        } else {
            let reader = LegacyPcapReader::new(BUFFER_SIZE, source).map_err(|e| {
                PcapError::InvalidFormat {
                    reason: format!("failed to parse pcap header: {}", e),
                }
            })?;
            ReaderInner::Legacy(reader)
        };

        debug!(?format, compressed, "opened capture");

        Ok(Self {
            inner,
            format,
            compressed,
            frame_number: 0,
            link_type: LINKTYPE_ETHERNET,
        })
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Link type of the most recent header or interface block.
    pub fn link_type(&self) -> u16 {
        self.link_type
    }

    /// Frames returned so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_number
    }

    /// Read the next frame. `Ok(None)` at end of file.
    pub fn next_frame(&mut self) -> Result<Option<RawFrame>, Error> {
        let nanos = matches!(self.format, CaptureFormat::LegacyNano);
        match &mut self.inner {
            ReaderInner::Legacy(reader) => {
                next_legacy(reader, nanos, &mut self.frame_number, &mut self.link_type)
            }
            ReaderInner::Ng(reader) => {
                next_pcapng(reader, &mut self.frame_number, &mut self.link_type)
            }
        }
    }
}

impl Iterator for PcapReader {
    type Item = Result<RawFrame, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl std::fmt::Debug for PcapReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcapReader")
            .field("format", &self.format)
            .field("compressed", &self.compressed)
            .field("frame_number", &self.frame_number)
            .field("link_type", &self.link_type)
            .finish()
    }
}

fn detect_format(mut source: CaptureSource) -> Result<CaptureFormat, Error> {
    let mut magic = [0u8; 4];
    source.read_exact(&mut magic).map_err(|_| PcapError::InvalidFormat {
        reason: "file too short to hold a capture header".to_string(),
    })?;
    Ok(CaptureFormat::detect(magic)?)
}

fn open_source(path: &Path) -> Result<CaptureSource, Error> {
    let open = || {
        File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::Pcap(PcapError::FileNotFound {
                path: path.display().to_string(),
            }),
            _ => Error::Io(e),
        })
    };

    let by_extension = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    let mut head = [0u8; 2];
    let gzip = by_extension || (open()?.read_exact(&mut head).is_ok() && head == GZIP_MAGIC);
    let file = open()?;

    if gzip {
        #[cfg(feature = "compress-gzip")]
        return Ok(CaptureSource::Gzip(GzDecoder::new(file)));
        #[cfg(not(feature = "compress-gzip"))]
        return Err(Error::Pcap(PcapError::CompressionUnsupported {
            path: path.display().to_string(),
        }));
    }
    Ok(CaptureSource::Plain(file))
}

fn next_legacy(
    reader: &mut LegacyPcapReader<CaptureSource>,
    nanos: bool,
    frame_number: &mut u64,
    link_type: &mut u16,
) -> Result<Option<RawFrame>, Error> {
    use pcap_parser::PcapError as ParserError;

    loop {
        match reader.next() {
            Ok((offset, block)) => match block {
                PcapBlockOwned::Legacy(packet) => {
                    *frame_number += 1;
                    let fraction = if nanos {
                        packet.ts_usec as i64 / 1_000
                    } else {
                        packet.ts_usec as i64
                    };
                    let frame = RawFrame {
                        frame_number: *frame_number,
                        timestamp_us: packet.ts_sec as i64 * 1_000_000 + fraction,
                        captured_length: packet.caplen,
                        original_length: packet.origlen,
                        link_type: *link_type,
                        data: Bytes::copy_from_slice(packet.data),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                PcapBlockOwned::LegacyHeader(header) => {
                    *link_type = header.network.0 as u16;
                    reader.consume(offset);
                }
                _ => reader.consume(offset),
            },
            Err(ParserError::Eof) => return Ok(None),
            Err(ParserError::Incomplete(_)) => {
                reader.refill().map_err(|e| PcapError::InvalidFormat {
                    reason: format!("pcap refill error: {}", e),
                })?;
            }
            Err(e) => {
                return Err(PcapError::InvalidFormat {
                    reason: format!("pcap parse error: {}", e),
                }
                .into())
            }
        }
    }
}

fn next_pcapng(
    reader: &mut PcapNGReader<CaptureSource>,
    frame_number: &mut u64,
    link_type: &mut u16,
) -> Result<Option<RawFrame>, Error> {
    use pcap_parser::pcapng::Block;
    use pcap_parser::PcapError as ParserError;

    loop {
        match reader.next() {
            Ok((offset, PcapBlockOwned::NG(block))) => match block {
                Block::InterfaceDescription(idb) => {
                    *link_type = idb.linktype.0 as u16;
                    reader.consume(offset);
                }
                Block::EnhancedPacket(epb) => {
                    *frame_number += 1;
                    // Block data is padded to 32 bits
                    let data = &epb.data[..(epb.caplen as usize).min(epb.data.len())];
                    // Default interface resolution is microseconds
                    let frame = RawFrame {
                        frame_number: *frame_number,
                        timestamp_us: ((epb.ts_high as i64) << 32) | epb.ts_low as i64,
                        captured_length: epb.caplen,
                        original_length: epb.origlen,
                        link_type: *link_type,
                        data: Bytes::copy_from_slice(data),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                Block::SimplePacket(spb) => {
                    *frame_number += 1;
                    let frame = RawFrame {
                        frame_number: *frame_number,
                        timestamp_us: 0,
                        captured_length: spb.data.len() as u32,
                        original_length: spb.origlen,
                        link_type: *link_type,
                        data: Bytes::copy_from_slice(spb.data),
                    };
                    reader.consume(offset);
                    return Ok(Some(frame));
                }
                _ => reader.consume(offset),
            },
            Ok((offset, _)) => reader.consume(offset),
            Err(ParserError::Eof) => return Ok(None),
            Err(ParserError::Incomplete(_)) => {
                reader.refill().map_err(|e| PcapError::InvalidFormat {
                    reason: format!("pcapng refill error: {}", e),
                })?;
            }
            Err(e) => {
                return Err(PcapError::InvalidFormat {
                    reason: format!("pcapng parse error: {}", e),
                }
                .into())
            }
        }
    }
}
