//! Output formatting for decoded frames and the end-of-run report.

use std::io::Write;

use chrono::{DateTime, Utc};

use pktdecode_core::cache::CacheStats;
use pktdecode_core::format::{details, hex_dump, summary};
use pktdecode_core::pipeline::PipelineStatus;
use pktdecode_core::stats::{TrafficStats, CONNECTION_TIMEOUT};
use pktdecode_core::{DecodedPacket, RawFrame};

/// Talkers listed in the report.
const TOP_TALKERS: usize = 5;

/// Active connections listed in the report.
const TOP_CONNECTIONS: usize = 5;

/// Per-frame output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Nothing per frame
    None,
    /// One line per frame (default)
    Summary,
    /// Every decoded field
    Details,
    /// Every decoded field plus a hex dump
    Hex,
}

/// Writes decoded frames in the selected format.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write one decoded frame.
    pub fn write<W: Write>(
        &self,
        frame: &RawFrame,
        packet: &DecodedPacket,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let time = format_timestamp(frame.timestamp_us);
        match self.format {
            OutputFormat::None => Ok(()),
            OutputFormat::Summary => {
                writeln!(writer, "{:>6} {} {}", frame.frame_number, time, summary(packet))
            }
            OutputFormat::Details => {
                writeln!(writer, "Frame {} ({})", frame.frame_number, time)?;
                writeln!(writer, "{}", details(packet))
            }
            OutputFormat::Hex => {
                writeln!(writer, "Frame {} ({})", frame.frame_number, time)?;
                writeln!(writer, "{}", details(packet))?;
                writeln!(writer, "{}", hex_dump(packet.raw()))
            }
        }
    }
}

/// Write the end-of-run statistics.
pub fn write_report<W: Write>(
    writer: &mut W,
    stats: &TrafficStats,
    cache: Option<&CacheStats>,
    pipeline: &PipelineStatus,
) -> std::io::Result<()> {
    writeln!(writer, "{:-<50}", "")?;
    writeln!(
        writer,
        "Packets: {} ({} bytes, {} with errors) over {:.3}s",
        stats.total_packets,
        stats.total_bytes,
        stats.error_packets,
        stats.duration()
    )?;
    writeln!(
        writer,
        "Rate:    {:.1} pkt/s, {:.1} B/s",
        stats.packet_rate(),
        stats.byte_rate()
    )?;

    let distribution = stats.protocol_distribution();
    if !distribution.is_empty() {
        writeln!(writer, "Protocols:")?;
        for (protocol, percent) in distribution {
            let count = stats.protocol_counts.get(protocol).copied().unwrap_or(0);
            writeln!(writer, "  {:<10} {:>8} ({:.1}%)", protocol, count, percent)?;
        }
    }

    let talkers = stats.top_talkers(TOP_TALKERS);
    if !talkers.is_empty() {
        writeln!(writer, "Top talkers:")?;
        for (address, count) in talkers {
            writeln!(writer, "  {:<40} {:>8}", address, count)?;
        }
    }

    let active = stats.active_connections(CONNECTION_TIMEOUT);
    if !active.is_empty() {
        writeln!(
            writer,
            "Connections: {} tracked, {} active",
            stats.connection_count(),
            active.len()
        )?;
        for conn in active.iter().take(TOP_CONNECTIONS) {
            let key = &conn.key;
            writeln!(
                writer,
                "  {:<5} {}:{} <-> {}:{}  {} pkts, {} bytes",
                key.protocol,
                key.src_ip,
                key.src_port.map_or_else(|| "-".to_string(), |p| p.to_string()),
                key.dst_ip,
                key.dst_port.map_or_else(|| "-".to_string(), |p| p.to_string()),
                conn.packets,
                conn.bytes
            )?;
        }
    }
    if stats.anomalies > 0 {
        writeln!(writer, "Anomalies: {}", stats.anomalies)?;
    }

    if let Some(cache) = cache {
        write!(writer, "{}", cache.format_summary())?;
    }

    writeln!(
        writer,
        "Persisted: {} written, {} failed, {} dropped in {} flushes",
        pipeline.written, pipeline.failed, pipeline.dropped, pipeline.flushes
    )
}

/// RFC 3339-style UTC time with microseconds.
pub fn format_timestamp(timestamp_us: i64) -> String {
    let secs = timestamp_us.div_euclid(1_000_000);
    let nanos = (timestamp_us.rem_euclid(1_000_000) * 1_000) as u32;
    match DateTime::<Utc>::from_timestamp(secs, nanos) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => timestamp_us.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000000");
        assert_eq!(
            format_timestamp(1_000_000_000_250_000),
            "2001-09-09 01:46:40.250000"
        );
    }

    fn idle_pipeline() -> PipelineStatus {
        PipelineStatus {
            queue_len: 0,
            queue_capacity: 10,
            running: false,
            consumer_alive: false,
            enqueued: 0,
            dropped: 0,
            flushes: 0,
            written: 0,
            failed: 0,
        }
    }

    #[test]
    fn test_report_on_empty_run() {
        let mut out = Vec::new();
        write_report(&mut out, &TrafficStats::new(), None, &idle_pipeline()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Packets: 0 (0 bytes, 0 with errors)"));
        assert!(text.contains("Persisted: 0 written"));
        assert!(!text.contains("Protocols:"));
        assert!(!text.contains("Connections:"));
    }

    #[test]
    fn test_report_lists_connections() {
        #[rustfmt::skip]
        let frame = [
            // Ethernet: dst, src, IPv4
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb,
            0x08, 0x00,
            // IPv4: 20-byte header, total length 28, UDP, 10.0.0.1 -> 10.0.0.2
            0x45, 0x00, 0x00, 0x1c, 0x00, 0x00, 0x00, 0x00,
            0x40, 0x11, 0x00, 0x00,
            0x0a, 0x00, 0x00, 0x01,
            0x0a, 0x00, 0x00, 0x02,
            // UDP: 5353 -> 53, length 8
            0x14, 0xe9, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00,
        ];
        let packet = pktdecode_core::Decoder::default()
            .decode_uncached(&frame)
            .unwrap();

        let mut stats = TrafficStats::new();
        stats.record(&packet, 1.0);
        stats.record(&packet, 2.0);

        let mut out = Vec::new();
        write_report(&mut out, &stats, None, &idle_pipeline()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Connections: 1 tracked, 1 active"));
        assert!(text.contains("UDP   10.0.0.1:5353 <-> 10.0.0.2:53  2 pkts, 84 bytes"));
    }
}
