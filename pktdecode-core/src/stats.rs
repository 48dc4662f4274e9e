//! Running traffic statistics.
//!
//! Updated synchronously on the decode path; everything here is plain
//! in-memory counting and never touches storage. Address and connection
//! tables are capped so a long capture cannot grow them without bound.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use compact_str::CompactString;
use tracing::warn;

use crate::packet::DecodedPacket;
use crate::pipeline::UNKNOWN_PROTOCOL;

/// Completed per-second samples kept in [`TrafficStats::history`] (five minutes).
pub const HISTORY_SECONDS: usize = 300;

/// Distinct addresses counted in [`TrafficStats::ip_counts`].
pub const MAX_TRACKED_ADDRESSES: usize = 65_536;

/// Connections held in the connection table.
pub const MAX_TRACKED_CONNECTIONS: usize = 65_536;

/// Idle time after which a connection no longer counts as active.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(300);

/// Frames larger than this are reported as oversized.
pub const JUMBO_FRAME_BYTES: usize = 9000;

/// Ports commonly associated with backdoors and trojans.
pub const SUSPICIOUS_PORTS: [u16; 4] = [1234, 31337, 12345, 54321];

/// Traffic seen during one wall-clock second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficSample {
    /// Whole seconds since the Unix epoch.
    pub second: i64,
    pub packets: u64,
    pub bytes: u64,
}

/// Five-tuple identifying a conversation, in the direction of its first packet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    pub src_ip: CompactString,
    pub dst_ip: CompactString,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub protocol: &'static str,
}

impl ConnectionKey {
    /// The same conversation seen from the other end.
    pub fn reversed(&self) -> Self {
        Self {
            src_ip: self.dst_ip.clone(),
            dst_ip: self.src_ip.clone(),
            src_port: self.dst_port,
            dst_port: self.src_port,
            protocol: self.protocol,
        }
    }
}

/// Both directions of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub key: ConnectionKey,
    pub start_time: f64,
    pub last_seen: f64,
    pub packets: u64,
    pub bytes: u64,
}

/// Aggregate counters over every packet recorded since the last reset.
#[derive(Debug, Clone, Default)]
pub struct TrafficStats {
    pub total_packets: u64,
    pub total_bytes: u64,
    /// Packets whose decode produced at least one error.
    pub error_packets: u64,
    /// Oversized frames and frames on a suspicious port.
    pub anomalies: u64,
    pub first_timestamp: Option<f64>,
    pub last_timestamp: Option<f64>,
    /// Keyed by innermost layer name.
    pub protocol_counts: HashMap<&'static str, u64>,
    pub protocol_bytes: HashMap<&'static str, u64>,
    /// Source and destination addresses both count. Holds at most
    /// [`MAX_TRACKED_ADDRESSES`] entries; later addresses go to
    /// `untracked_addresses`.
    pub ip_counts: HashMap<CompactString, u64>,
    pub untracked_addresses: u64,
    /// One entry per port number, so never more than 65,536.
    pub port_counts: HashMap<u16, u64>,
    /// Packets that found the connection table full of active entries.
    pub untracked_connections: u64,
    connections: HashMap<ConnectionKey, Connection>,
    history: VecDeque<TrafficSample>,
    current: Option<TrafficSample>,
}

impl TrafficStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one decoded packet captured at `timestamp` (seconds since epoch).
    pub fn record(&mut self, packet: &DecodedPacket, timestamp: f64) {
        let length = packet.len() as u64;
        let protocol = packet
            .innermost()
            .map(|l| l.tag().name())
            .unwrap_or(UNKNOWN_PROTOCOL);

        self.total_packets += 1;
        self.total_bytes += length;
        if packet.has_errors() {
            self.error_packets += 1;
        }

        self.first_timestamp.get_or_insert(timestamp);
        self.last_timestamp = Some(timestamp);

        *self.protocol_counts.entry(protocol).or_default() += 1;
        *self.protocol_bytes.entry(protocol).or_default() += length;

        for ip in [packet.src_ip(), packet.dst_ip()].into_iter().flatten() {
            self.count_address(ip);
        }
        for port in [packet.src_port(), packet.dst_port()].into_iter().flatten() {
            *self.port_counts.entry(port).or_default() += 1;
        }

        self.track_connection(packet, protocol, timestamp, length);
        self.detect_anomalies(packet);
        self.record_second(timestamp.floor() as i64, length);
    }

    fn count_address(&mut self, ip: &str) {
        if let Some(count) = self.ip_counts.get_mut(ip) {
            *count += 1;
        } else if self.ip_counts.len() < MAX_TRACKED_ADDRESSES {
            self.ip_counts.insert(CompactString::from(ip), 1);
        } else {
            self.untracked_addresses += 1;
        }
    }

    fn track_connection(
        &mut self,
        packet: &DecodedPacket,
        protocol: &'static str,
        timestamp: f64,
        length: u64,
    ) {
        let (Some(src_ip), Some(dst_ip)) = (packet.src_ip(), packet.dst_ip()) else {
            return;
        };
        let forward = ConnectionKey {
            src_ip: CompactString::from(src_ip),
            dst_ip: CompactString::from(dst_ip),
            src_port: packet.src_port(),
            dst_port: packet.dst_port(),
            protocol,
        };

        let key = if self.connections.contains_key(&forward) {
            forward
        } else {
            let reverse = forward.reversed();
            if self.connections.contains_key(&reverse) {
                reverse
            } else {
                if self.connections.len() >= MAX_TRACKED_CONNECTIONS {
                    self.prune_connections(timestamp - CONNECTION_TIMEOUT.as_secs_f64());
                }
                if self.connections.len() >= MAX_TRACKED_CONNECTIONS {
                    self.untracked_connections += 1;
                    return;
                }
                self.connections.insert(
                    forward.clone(),
                    Connection {
                        key: forward.clone(),
                        start_time: timestamp,
                        last_seen: timestamp,
                        packets: 0,
                        bytes: 0,
                    },
                );
                forward
            }
        };

        if let Some(conn) = self.connections.get_mut(&key) {
            conn.last_seen = conn.last_seen.max(timestamp);
            conn.packets += 1;
            conn.bytes += length;
        }
    }

    fn prune_connections(&mut self, cutoff: f64) {
        self.connections.retain(|_, conn| conn.last_seen >= cutoff);
    }

    fn detect_anomalies(&mut self, packet: &DecodedPacket) {
        let mut anomalous = false;

        if packet.len() > JUMBO_FRAME_BYTES {
            warn!(length = packet.len(), "oversized frame");
            anomalous = true;
        }

        let (src_port, dst_port) = (packet.src_port(), packet.dst_port());
        let suspicious = |port: Option<u16>| port.is_some_and(|p| SUSPICIOUS_PORTS.contains(&p));
        if suspicious(src_port) || suspicious(dst_port) {
            warn!(?src_port, ?dst_port, "traffic on suspicious port");
            anomalous = true;
        }

        if anomalous {
            self.anomalies += 1;
        }
    }

    fn record_second(&mut self, second: i64, bytes: u64) {
        match &mut self.current {
            Some(sample) if sample.second == second => {
                sample.packets += 1;
                sample.bytes += bytes;
            }
            slot => {
                if let Some(done) = slot.replace(TrafficSample {
                    second,
                    packets: 1,
                    bytes,
                }) {
                    if self.history.len() == HISTORY_SECONDS {
                        self.history.pop_front();
                    }
                    self.history.push_back(done);
                }
            }
        }
    }

    /// Seconds between the first and last recorded packet.
    pub fn duration(&self) -> f64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => (last - first).max(0.0),
            _ => 0.0,
        }
    }

    /// Average packets per second over [`duration`](Self::duration).
    pub fn packet_rate(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.total_packets as f64 / duration
        } else {
            0.0
        }
    }

    /// Average bytes per second over [`duration`](Self::duration).
    pub fn byte_rate(&self) -> f64 {
        let duration = self.duration();
        if duration > 0.0 {
            self.total_bytes as f64 / duration
        } else {
            0.0
        }
    }

    /// Busiest addresses by packet count, highest first.
    pub fn top_talkers(&self, n: usize) -> Vec<(CompactString, u64)> {
        let mut talkers: Vec<_> = self
            .ip_counts
            .iter()
            .map(|(ip, count)| (ip.clone(), *count))
            .collect();
        talkers.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        talkers.truncate(n);
        talkers
    }

    /// Share of packets per protocol, in percent, highest first.
    pub fn protocol_distribution(&self) -> Vec<(&'static str, f64)> {
        if self.total_packets == 0 {
            return Vec::new();
        }
        let total = self.total_packets as f64;
        let mut dist: Vec<_> = self
            .protocol_counts
            .iter()
            .map(|(proto, count)| (*proto, *count as f64 / total * 100.0))
            .collect();
        dist.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        dist
    }

    /// Connections seen within `timeout` of the latest recorded packet,
    /// busiest first by bytes.
    ///
    /// Idleness is measured against capture time, not the wall clock, so
    /// replayed captures report the same result as live ones.
    pub fn active_connections(&self, timeout: Duration) -> Vec<Connection> {
        let Some(latest) = self.last_timestamp else {
            return Vec::new();
        };
        let cutoff = latest - timeout.as_secs_f64();

        let mut active: Vec<_> = self
            .connections
            .values()
            .filter(|conn| conn.last_seen >= cutoff)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.bytes
                .cmp(&a.bytes)
                .then_with(|| a.start_time.total_cmp(&b.start_time))
        });
        active
    }

    /// Connections currently held, active or not.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Per-second samples, oldest first, including the second in progress.
    pub fn history(&self) -> Vec<TrafficSample> {
        self.history.iter().copied().chain(self.current).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
