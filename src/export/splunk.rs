//! SIEM log-line export: one self-describing key="value" line per
//! visit, fixed field order, fixed source/sourcetype tags.

use std::fmt::Write;

use super::{iso_timestamp, ExportError, Exporter};
use crate::model::CanonicalVisit;

const SOURCE: &str = "webtrail";
const SOURCETYPE: &str = "browser:history";

pub struct SplunkExporter;

impl Exporter for SplunkExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();
        for visit in visits {
            writeln!(
                out,
                "timestamp=\"{}\" source=\"{}\" sourcetype=\"{}\" browser=\"{}\" \
                 profile=\"{}\" domain=\"{}\" url=\"{}\" title=\"{}\" visit_count={}",
                iso_timestamp(visit.visited_at),
                SOURCE,
                SOURCETYPE,
                escape(visit.browser.label()),
                escape(&visit.profile),
                escape(&visit.domain()),
                escape(&visit.url),
                escape(&visit.title),
                visit.visit_count,
            )?;
        }
        Ok(out.into_bytes())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::super::test_support::scenario;
    use super::*;

    #[test]
    fn emits_one_fixed_order_line_per_visit() {
        let out = SplunkExporter.export(&scenario()).expect("export");
        let text = String::from_utf8(out).expect("utf-8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp=\"2025-06-09T14:30:15.000000Z\" "));
        assert!(lines[0].contains("source=\"webtrail\" sourcetype=\"browser:history\""));
        assert!(lines[0].contains("domain=\"github.com\""));
        assert!(lines[0].ends_with("visit_count=3"));
    }

    #[test]
    fn escapes_embedded_quotes() {
        let mut visits = scenario();
        visits[0].title = "a \"quoted\" title".to_string();
        let out = SplunkExporter.export(&visits).expect("export");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("title=\"a \\\"quoted\\\" title\""));
    }

    #[test]
    fn empty_input_is_an_empty_log() {
        let out = SplunkExporter.export(&[]).expect("export");
        assert!(out.is_empty());
    }
}
