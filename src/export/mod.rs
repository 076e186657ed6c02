//! # Export Serializers
//!
//! One implementation per output format behind a common trait. Every
//! serializer is total over any valid filtered set, including the empty
//! set: zero matches produce well-formed empty output, never an error.
//! URL anonymization happens once, upstream, on the timeline itself —
//! no format re-implements it.

pub mod csv;
pub mod elk;
pub mod graph;
pub mod json;
pub mod splunk;
pub mod timeline;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::model::CanonicalVisit;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),
    #[error("other error: {0}")]
    Other(String),
}

/// The machine-readable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Splunk,
    Elk,
    Gephi,
    TimelineJson,
}

pub trait Exporter: Send + Sync {
    /// Render the filtered visit set to bytes ready for the output sink.
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError>;
}

pub fn build_exporter(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Json => Box::new(json::JsonExporter),
        ExportFormat::Csv => Box::new(csv::CsvExporter),
        ExportFormat::Splunk => Box::new(splunk::SplunkExporter),
        ExportFormat::Elk => Box::new(elk::ElkExporter),
        ExportFormat::Gephi => Box::new(graph::GephiExporter),
        ExportFormat::TimelineJson => Box::new(timeline::TimelineJsonExporter),
    }
}

/// ISO-8601 at microsecond resolution, the model's native precision.
pub(crate) fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use crate::model::{BrowserKind, CanonicalVisit};

    /// The three-visit scenario used across serializer tests.
    pub fn scenario() -> Vec<CanonicalVisit> {
        vec![
            CanonicalVisit {
                url: "https://github.com/rust-lang/rust".to_string(),
                title: "rust-lang/rust".to_string(),
                visited_at: Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap(),
                visit_count: 3,
                browser: BrowserKind::Chrome,
                profile: "Default".to_string(),
            },
            CanonicalVisit {
                url: "https://docs.python.org/3/".to_string(),
                title: "Python Docs".to_string(),
                visited_at: Utc.with_ymd_and_hms(2025, 6, 9, 14, 25, 42).unwrap(),
                visit_count: 0,
                browser: BrowserKind::Firefox,
                profile: "default-release".to_string(),
            },
            CanonicalVisit {
                url: "https://duckduckgo.com/?q=rust".to_string(),
                title: "rust at DuckDuckGo".to_string(),
                visited_at: Utc.with_ymd_and_hms(2025, 6, 9, 14, 20, 18).unwrap(),
                visit_count: 2,
                browser: BrowserKind::Chrome,
                profile: "Default".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_format_is_total_on_empty_input() {
        for format in [
            ExportFormat::Json,
            ExportFormat::Csv,
            ExportFormat::Splunk,
            ExportFormat::Elk,
            ExportFormat::Gephi,
            ExportFormat::TimelineJson,
        ] {
            let out = build_exporter(format).export(&[]).expect("empty export");
            assert!(std::str::from_utf8(&out).is_ok(), "{format:?} not utf-8");
        }
    }

    #[test]
    fn iso_timestamps_carry_microseconds() {
        use chrono::TimeZone;
        let at = chrono::Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap();
        assert_eq!(iso_timestamp(at), "2025-06-09T14:30:15.000000Z");
    }
}
