//! SQLite sink.

use std::path::Path;

use rusqlite::{params, Connection};

use super::PacketSink;
use crate::error::StorageError;
use crate::pipeline::BatchRecord;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS packets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp REAL NOT NULL,
    src_ip TEXT,
    dst_ip TEXT,
    src_port INTEGER,
    dst_port INTEGER,
    protocol TEXT NOT NULL,
    length INTEGER NOT NULL,
    raw_data BLOB,
    session_id INTEGER
);
CREATE INDEX IF NOT EXISTS idx_packets_timestamp ON packets(timestamp);
CREATE INDEX IF NOT EXISTS idx_packets_session ON packets(session_id);
"#;

const INSERT: &str = "INSERT INTO packets \
    (timestamp, src_ip, dst_ip, src_port, dst_port, protocol, length, raw_data, session_id) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

/// Writes records to a `packets` table; batches go in one transaction.
#[derive(Debug)]
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(path)?)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Number of stored rows.
    pub fn count(&self) -> Result<u64, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM packets", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Underlying connection, for ad-hoc queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert(conn: &Connection, record: &BatchRecord) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(INSERT)?;
        stmt.execute(params![
            record.timestamp,
            record.src_ip.as_deref(),
            record.dst_ip.as_deref(),
            record.src_port,
            record.dst_port,
            record.protocol,
            record.length as i64,
            record.raw_data.as_deref(),
            record.session_id,
        ])
    }
}

impl PacketSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn save_packet(&mut self, record: &BatchRecord) -> Result<(), StorageError> {
        Self::insert(&self.conn, record)?;
        Ok(())
    }

    fn supports_batch(&self) -> bool {
        true
    }

    fn save_batch(&mut self, records: &[BatchRecord]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        for record in records {
            Self::insert(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }
}
