//! Safari adapter. `History.db` keeps URLs in `history_items` and the
//! per-visit rows in `history_visits`, timestamped in Core Data seconds.

use std::path::Path;

use rusqlite::Row;
use tracing::debug;

use super::{has_table, open_read_only, AdapterError, ScanWindow, SourceAdapter, VisitRows};
use crate::epoch;
use crate::model::{BrowserFamily, BrowserKind, CanonicalVisit};

pub struct SafariAdapter {
    kind: BrowserKind,
}

impl SafariAdapter {
    pub fn new(kind: BrowserKind) -> Self {
        debug_assert!(matches!(kind.family(), BrowserFamily::Safari));
        Self { kind }
    }
}

impl SourceAdapter for SafariAdapter {
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
        if !has_table(&conn, "history_items")? {
            return Err(AdapterError::SchemaUnsupported(format!(
                "{}: no history_items table",
                db.display()
            )));
        }

        let cutoff = window.cutoff.map(epoch::utc_to_apple).unwrap_or(0.0);
        // Older exports carry the visit time directly on history_items.
        let sql = if has_table(&conn, "history_visits")? {
            "SELECT hi.url, hv.title, hi.visit_count, hv.visit_time \
             FROM history_items hi JOIN history_visits hv ON hi.id = hv.history_item \
             WHERE hv.visit_time > ?1 ORDER BY hv.visit_time DESC LIMIT ?2"
        } else {
            "SELECT url, title, visit_count, visit_time FROM history_items \
             WHERE visit_time > ?1 ORDER BY visit_time DESC LIMIT ?2"
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
    let raw_time: Option<f64> = row.get(3).ok()?;
    let visited_at = epoch::apple_to_utc(raw_time?)?;
    Some(CanonicalVisit {
        url,
        title: title.unwrap_or_default(),
        visited_at,
        visit_count: visit_count.unwrap_or(0).max(0) as u32,
        browser: kind,
        profile: profile.to_string(),
    })
}
