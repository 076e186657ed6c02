//! Log-pipeline JSON export: one JSON object per line with an
//! `@timestamp` field and an `event_type` tag, ready for bulk ingest.

use serde::Serialize;

use super::{iso_timestamp, ExportError, Exporter};
use crate::model::CanonicalVisit;

const EVENT_TYPE: &str = "browser_history";

#[derive(Serialize)]
struct ElkEvent<'a> {
    #[serde(rename = "@timestamp")]
    timestamp: String,
    event_type: &'static str,
    browser: &'a str,
    profile: &'a str,
    url: &'a str,
    title: &'a str,
    domain: String,
    visit_count: u32,
}

pub struct ElkExporter;

impl Exporter for ElkExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        for visit in visits {
            let event = ElkEvent {
                timestamp: iso_timestamp(visit.visited_at),
                event_type: EVENT_TYPE,
                browser: visit.browser.label(),
                profile: &visit.profile,
                url: &visit.url,
                title: &visit.title,
                domain: visit.domain(),
                visit_count: visit.visit_count,
            };
            serde_json::to_writer(&mut out, &event)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}
