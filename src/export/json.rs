//! Structured record export: one object per visit with an explicit
//! field set, rendered as a JSON array.

use serde::Serialize;

use super::{iso_timestamp, ExportError, Exporter};
use crate::model::CanonicalVisit;

#[derive(Serialize)]
struct VisitRecord<'a> {
    browser: &'a str,
    profile: &'a str,
    timestamp: String,
    title: &'a str,
    url: &'a str,
    domain: String,
    visit_count: u32,
}

pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        let records: Vec<VisitRecord<'_>> = visits
            .iter()
            .map(|visit| VisitRecord {
                browser: visit.browser.label(),
                profile: &visit.profile,
                timestamp: iso_timestamp(visit.visited_at),
                title: &visit.title,
                url: &visit.url,
                domain: visit.domain(),
                visit_count: visit.visit_count,
            })
            .collect();
        let mut out = serde_json::to_vec_pretty(&records)?;
        out.push(b'\n');
        Ok(out)
    }
}
