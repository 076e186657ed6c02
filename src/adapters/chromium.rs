//! Chromium-family adapter: Chrome, Brave, Edge, Vivaldi, Opera and
//! Chromium share one `History` schema and differ only by profile path.

use std::path::Path;

use rusqlite::Row;
use tracing::debug;

use super::{has_table, open_read_only, AdapterError, ScanWindow, SourceAdapter, VisitRows};
use crate::epoch;
use crate::model::{BrowserFamily, BrowserKind, CanonicalVisit};

pub struct ChromiumAdapter {
    kind: BrowserKind,
}

impl ChromiumAdapter {
    pub fn new(kind: BrowserKind) -> Self {
        debug_assert!(matches!(kind.family(), BrowserFamily::Chromium));
        Self { kind }
    }
}

impl SourceAdapter for ChromiumAdapter {
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
        if !has_table(&conn, "urls")? {
            return Err(AdapterError::SchemaUnsupported(format!(
                "{}: no urls table",
                db.display()
            )));
        }

        let cutoff = window.cutoff.map(epoch::utc_to_chromium).unwrap_or(0);
        let mut stmt = conn.prepare(
            "SELECT url, title, visit_count, last_visit_time FROM urls \
             WHERE last_visit_time > ?1 ORDER BY last_visit_time DESC LIMIT ?2",
        )?;
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
    let visited_at = epoch::chromium_to_utc(raw_time?)?;
    Some(CanonicalVisit {
        url,
        title: title.unwrap_or_default(),
        visited_at,
        visit_count: visit_count.unwrap_or(0).max(0) as u32,
        browser: kind,
        profile: profile.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rusqlite::Connection;
    use tempfile::tempdir;

    fn fixture(path: &Path, rows: &[(&str, Option<&str>, i64, i64)]) {
        let conn = Connection::open(path).expect("conn");
        conn.execute(
            "CREATE TABLE urls (id INTEGER PRIMARY KEY, url TEXT, title TEXT, \
             visit_count INTEGER, last_visit_time INTEGER)",
            [],
        )
        .expect("create");
        for (url, title, count, time) in rows {
            conn.execute(
                "INSERT INTO urls (url, title, visit_count, last_visit_time) \
                 VALUES (?1, ?2, ?3, ?4)",
                (url, title, count, time),
            )
            .expect("insert");
        }
    }

    #[test]
    fn extracts_canonical_visits() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("History");
        fixture(
            &path,
            &[(
                "https://example.com/",
                Some("Example"),
                3,
                13_385_000_000_000_000,
            )],
        );

        let adapter = ChromiumAdapter::new(BrowserKind::Chrome);
        let rows = adapter
            .list_visits(&path, "Default", &ScanWindow::exhaustive())
            .expect("visits");
        let visits: Vec<_> = rows.collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].browser, BrowserKind::Chrome);
        assert_eq!(visits[0].visit_count, 3);
        assert_eq!(
            visits[0].visited_at,
            Utc.with_ymd_and_hms(2025, 2, 25, 23, 33, 20).unwrap()
        );
    }

    #[test]
    fn skips_rows_without_valid_timestamps() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("History");
        fixture(
            &path,
            &[
                ("https://kept.example/", None, 1, 13_385_000_000_000_000),
                // Positive raw value that still lands before 1970.
                ("https://dropped.example/", None, 1, 1_000_000),
            ],
        );

        let adapter = ChromiumAdapter::new(BrowserKind::Brave);
        let rows = adapter
            .list_visits(&path, "Default", &ScanWindow::exhaustive())
            .expect("visits");
        assert_eq!(rows.skipped(), 1);
        let visits: Vec<_> = rows.collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].url, "https://kept.example/");
        assert_eq!(visits[0].title, "");
    }

    #[test]
    fn pushes_cutoff_into_the_query() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("History");
        let old = epoch::utc_to_chromium(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let new = epoch::utc_to_chromium(Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap());
        fixture(
            &path,
            &[
                ("https://old.example/", None, 1, old),
                ("https://new.example/", None, 1, new),
            ],
        );

        let window = ScanWindow {
            cutoff: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            row_limit: None,
        };
        let adapter = ChromiumAdapter::new(BrowserKind::Chrome);
        let visits: Vec<_> = adapter
            .list_visits(&path, "Default", &window)
            .expect("visits")
            .collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].url, "https://new.example/");
    }

    #[test]
    fn rejects_foreign_schema() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("History");
        let conn = Connection::open(&path).expect("conn");
        conn.execute("CREATE TABLE moz_places (id INTEGER PRIMARY KEY)", [])
            .expect("create");
        drop(conn);

        let adapter = ChromiumAdapter::new(BrowserKind::Chrome);
        let err = adapter
            .list_visits(&path, "Default", &ScanWindow::exhaustive())
            .expect_err("schema mismatch");
        assert!(matches!(err, AdapterError::SchemaUnsupported(_)));
    }
}
