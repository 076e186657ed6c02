//! Tabular export: header row plus one row per visit, stable column
//! order. Zero visits yield a header-only file.

use serde::Serialize;

use super::{iso_timestamp, ExportError, Exporter};
use crate::model::CanonicalVisit;

#[derive(Serialize)]
struct VisitRow<'a> {
    browser: &'a str,
    profile: &'a str,
    timestamp: String,
    title: &'a str,
    url: &'a str,
    domain: String,
    visit_count: u32,
}

pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record([
            "browser",
            "profile",
            "timestamp",
            "title",
            "url",
            "domain",
            "visit_count",
        ])?;

        for visit in visits {
            writer.serialize(VisitRow {
                browser: visit.browser.label(),
                profile: &visit.profile,
                timestamp: iso_timestamp(visit.visited_at),
                title: &visit.title,
                url: &visit.url,
                domain: visit.domain(),
                visit_count: visit.visit_count,
            })?;
        }

        writer
            .into_inner()
            .map_err(|err| ExportError::Other(err.to_string()))
    }
}
