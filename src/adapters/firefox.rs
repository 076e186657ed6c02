//! Firefox-family adapter: Firefox, Tor Browser and LibreWolf all use
//! the `places.sqlite` schema with microsecond Unix timestamps.

use std::path::Path;

use rusqlite::Row;
use tracing::debug;

use super::{has_table, open_read_only, AdapterError, ScanWindow, SourceAdapter, VisitRows};
use crate::epoch;
use crate::model::{BrowserFamily, BrowserKind, CanonicalVisit};

pub struct FirefoxAdapter {
    kind: BrowserKind,
}

impl FirefoxAdapter {
    pub fn new(kind: BrowserKind) -> Self {
        debug_assert!(matches!(kind.family(), BrowserFamily::Firefox));
        Self { kind }
    }
}

impl SourceAdapter for FirefoxAdapter {
    fn browser(&self) -> BrowserKind {
        self.kind
    }

    fn list_visits(
        &self,
        db: &Path,
        profile: &str,
        window: &ScanWindow,
    ) -> Result<VisitRows, AdapterError> {
        let conn = open_read_only(db)?;
        if !has_table(&conn, "moz_places")? {
            return Err(AdapterError::SchemaUnsupported(format!(
                "{}: no moz_places table",
                db.display()
            )));
        }

        let cutoff = window.cutoff.map(epoch::utc_to_mozilla).unwrap_or(0);
        // Per-visit rows when the visits table exists; otherwise fall
        // back to the last-visit column kept on moz_places itself.
        let sql = if has_table(&conn, "moz_historyvisits")? {
            "SELECT p.url, p.title, p.visit_count, h.visit_date \
             FROM moz_places p JOIN moz_historyvisits h ON p.id = h.place_id \
             WHERE h.visit_date > ?1 ORDER BY h.visit_date DESC LIMIT ?2"
        } else {
            "SELECT url, title, visit_count, last_visit_date FROM moz_places \
             WHERE last_visit_date > ?1 ORDER BY last_visit_date DESC LIMIT ?2"
        };
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query((cutoff, window.sql_limit()))?;

        let mut out = Vec::new();
        let mut skipped = 0u64;
        while let Some(row) = rows.next()? {
            match canonical_row(row, self.kind, profile) {
                Some(visit) => out.push(visit),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!("{}: skipped {skipped} malformed rows", db.display());
        }
        Ok(VisitRows::new(out, skipped))
    }
}

fn canonical_row(row: &Row<'_>, kind: BrowserKind, profile: &str) -> Option<CanonicalVisit> {
    let url: String = row.get(0).ok()?;
    if url.is_empty() {
        return None;
    }
    let title: Option<String> = row.get(1).ok()?;
    let visit_count: Option<i64> = row.get(2).ok()?;
    let raw_time: Option<i64> = row.get(3).ok()?;
    let visited_at = epoch::mozilla_to_utc(raw_time?)?;
    Some(CanonicalVisit {
        url,
        title: title.unwrap_or_default(),
        visited_at,
        visit_count: visit_count.unwrap_or(0).max(0) as u32,
        browser: kind,
        profile: profile.to_string(),
    })
}
