//! # Source Adapters
//!
//! One adapter per browser family, each translating its native SQLite
//! schema into [`CanonicalVisit`] records. Adapters operate on snapshot
//! copies only (see [`snapshot`]) and never write to a source database.

pub mod chromium;
pub mod firefox;
pub mod safari;
pub mod snapshot;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

use crate::model::{BrowserFamily, BrowserKind, CanonicalVisit};

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Source file locked or unreadable after retries. Recoverable:
    /// the run continues without this source.
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// The database exists but does not have the expected tables.
    #[error("unsupported schema: {0}")]
    SchemaUnsupported(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounds pushed down into the source query for discovery-mode scans.
/// `None` in both fields means an exhaustive pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanWindow {
    pub cutoff: Option<DateTime<Utc>>,
    pub row_limit: Option<u64>,
}

impl ScanWindow {
    pub fn exhaustive() -> Self {
        Self::default()
    }

    pub(crate) fn sql_limit(&self) -> i64 {
        // SQLite treats a negative LIMIT as "no limit".
        self.row_limit.map(|n| n as i64).unwrap_or(-1)
    }
}

/// One extraction pass over one source database.
///
/// Finite and single-pass: the iterator consumes itself, so a pass can
/// never be accidentally replayed against a dropped snapshot.
#[derive(Debug)]
pub struct VisitRows {
    rows: std::vec::IntoIter<CanonicalVisit>,
    skipped: u64,
}

impl VisitRows {
    pub(crate) fn new(rows: Vec<CanonicalVisit>, skipped: u64) -> Self {
        Self {
            rows: rows.into_iter(),
            skipped,
        }
    }

    /// Rows dropped because they failed to parse into the canonical shape.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for VisitRows {
    type Item = CanonicalVisit;

    fn next(&mut self) -> Option<CanonicalVisit> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for VisitRows {}

/// Capability set every browser family implements.
pub trait SourceAdapter: Send + Sync {
    fn browser(&self) -> BrowserKind;

    /// Read visits from a snapshot copy of the source database, mapping
    /// native columns into the canonical shape exactly once.
    fn list_visits(
        &self,
        db: &Path,
        profile: &str,
        window: &ScanWindow,
    ) -> Result<VisitRows, AdapterError>;
}

/// Closed dispatch over the supported browser set. Adding a browser is a
/// new [`BrowserKind`] variant plus a family mapping, nothing more.
pub fn adapter_for(kind: BrowserKind) -> Box<dyn SourceAdapter> {
    match kind.family() {
        BrowserFamily::Chromium => Box::new(chromium::ChromiumAdapter::new(kind)),
        BrowserFamily::Firefox => Box::new(firefox::FirefoxAdapter::new(kind)),
        BrowserFamily::Safari => Box::new(safari::SafariAdapter::new(kind)),
    }
}

pub(crate) fn open_read_only(path: &Path) -> Result<Connection, AdapterError> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

pub(crate) fn has_table(conn: &Connection, name: &str) -> Result<bool, AdapterError> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let mut rows = stmt.query([name])?;
    Ok(rows.next()?.is_some())
}
