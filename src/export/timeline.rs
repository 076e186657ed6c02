//! Timeline-tool JSON export: one event object per visit with a start
//! date, headline and text, in chronological order, in the shape
//! timeline presentation tools ingest.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use super::{ExportError, Exporter};
use crate::model::CanonicalVisit;

#[derive(Serialize)]
struct TimelineDoc {
    title: Slide,
    events: Vec<Slide>,
}

#[derive(Serialize)]
struct Slide {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<StartDate>,
    text: TextBlock,
}

#[derive(Serialize)]
struct StartDate {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
}

#[derive(Serialize)]
struct TextBlock {
    headline: String,
    text: String,
}

impl From<DateTime<Utc>> for StartDate {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
            day: at.day(),
            hour: at.hour(),
            minute: at.minute(),
            second: at.second(),
        }
    }
}

pub struct TimelineJsonExporter;

impl Exporter for TimelineJsonExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        let mut ordered: Vec<&CanonicalVisit> = visits.iter().collect();
        ordered.sort_by(|a, b| {
            a.visited_at
                .cmp(&b.visited_at)
                .then_with(|| a.url.cmp(&b.url))
        });

        let events = ordered
            .into_iter()
            .map(|visit| Slide {
                start_date: Some(visit.visited_at.into()),
                text: TextBlock {
                    headline: if visit.title.is_empty() {
                        visit.domain()
                    } else {
                        visit.title.clone()
                    },
                    text: visit.url.clone(),
                },
            })
            .collect();

        let doc = TimelineDoc {
            title: Slide {
                start_date: None,
                text: TextBlock {
                    headline: "Browser history timeline".to_string(),
                    text: format!("{} visits", visits.len()),
                },
            },
            events,
        };
        let mut out = serde_json::to_vec_pretty(&doc)?;
        out.push(b'\n');
        Ok(out)
    }
}
