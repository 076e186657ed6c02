//! # Analytics Aggregator
//!
//! Derived, read-only views over a filtered visit set. Reports are
//! recomputed from scratch per request; grouping goes through ordered
//! maps and every ranking has a full tie-break chain, so two runs over
//! the same input produce byte-identical output.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BrowserKind, CanonicalVisit};

/// Time unit for the temporal histogram. Buckets are computed from the
/// canonical UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupUnit {
    Hour,
    Day,
    Weekday,
    Month,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStat {
    pub domain: String,
    /// Number of timeline entries for the domain.
    pub entries: u64,
    /// Sum of effective visit counts for the domain.
    pub visits: u64,
    pub browsers: BTreeSet<BrowserKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowserUsage {
    pub browser: BrowserKind,
    pub entries: u64,
    pub visits: u64,
    pub unique_domains: u64,
    /// Exact share of total entries, in percent.
    pub entry_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub entries: u64,
}

/// Summary statistics over one filtered snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub total_entries: u64,
    pub total_visits: u64,
    pub unique_domains: u64,
    pub unique_urls: u64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    /// Sorted by entries descending, then browser key ascending.
    pub browser_usage: Vec<BrowserUsage>,
    /// Sorted by entries descending, then visits descending, then
    /// domain name ascending.
    pub top_domains: Vec<DomainStat>,
    pub histogram: Vec<HistogramBucket>,
}

/// Visit contribution of one entry. Firefox-family schemas report 0 for
/// rows whose counter was never incremented; each row still represents
/// at least one observed visit, so contributions are floored at 1. The
/// same floor is used everywhere visits are summed.
fn effective_visits(visit: &CanonicalVisit) -> u64 {
    u64::from(visit.visit_count.max(1))
}

pub fn aggregate(visits: &[CanonicalVisit], unit: GroupUnit, top_limit: usize) -> AggregateReport {
    let total_entries = visits.len() as u64;
    let total_visits: u64 = visits.iter().map(effective_visits).sum();

    let mut urls = BTreeSet::new();
    let mut domains: BTreeMap<String, DomainStat> = BTreeMap::new();
    let mut browsers: BTreeMap<BrowserKind, (u64, u64, BTreeSet<String>)> = BTreeMap::new();

    for visit in visits {
        urls.insert(visit.url.as_str());
        let domain = visit.domain();

        let stat = domains.entry(domain.clone()).or_insert_with(|| DomainStat {
            domain: domain.clone(),
            entries: 0,
            visits: 0,
            browsers: BTreeSet::new(),
        });
        stat.entries += 1;
        stat.visits += effective_visits(visit);
        stat.browsers.insert(visit.browser);

        let usage = browsers
            .entry(visit.browser)
            .or_insert_with(|| (0, 0, BTreeSet::new()));
        usage.0 += 1;
        usage.1 += effective_visits(visit);
        usage.2.insert(domain);
    }

    let unique_domains = domains.len() as u64;

    let mut top_domains: Vec<DomainStat> = domains.into_values().collect();
    top_domains.sort_by(|a, b| {
        b.entries
            .cmp(&a.entries)
            .then_with(|| b.visits.cmp(&a.visits))
            .then_with(|| a.domain.cmp(&b.domain))
    });
    top_domains.truncate(top_limit);

    let mut browser_usage: Vec<BrowserUsage> = browsers
        .into_iter()
        .map(|(browser, (entries, visit_sum, domain_set))| BrowserUsage {
            browser,
            entries,
            visits: visit_sum,
            unique_domains: domain_set.len() as u64,
            entry_share: if total_entries == 0 {
                0.0
            } else {
                entries as f64 * 100.0 / total_entries as f64
            },
        })
        .collect();
    browser_usage.sort_by(|a, b| {
        b.entries
            .cmp(&a.entries)
            .then_with(|| a.browser.key().cmp(b.browser.key()))
    });

    AggregateReport {
        total_entries,
        total_visits,
        unique_domains,
        unique_urls: urls.len() as u64,
        earliest: visits.iter().map(|v| v.visited_at).min(),
        latest: visits.iter().map(|v| v.visited_at).max(),
        browser_usage,
        top_domains,
        histogram: histogram(visits, unit),
    }
}

fn histogram(visits: &[CanonicalVisit], unit: GroupUnit) -> Vec<HistogramBucket> {
    match unit {
        GroupUnit::Weekday => {
            // All seven days, Monday first, zero-filled.
            let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
            for visit in visits {
                *counts
                    .entry(visit.visited_at.weekday().num_days_from_monday())
                    .or_default() += 1;
            }
            (0..7)
                .map(|day| HistogramBucket {
                    label: weekday_label(day).to_string(),
                    entries: counts.get(&day).copied().unwrap_or(0),
                })
                .collect()
        }
        _ => {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for visit in visits {
                *counts.entry(bucket_label(visit.visited_at, unit)).or_default() += 1;
            }
            counts
                .into_iter()
                .map(|(label, entries)| HistogramBucket { label, entries })
                .collect()
        }
    }
}

fn bucket_label(at: DateTime<Utc>, unit: GroupUnit) -> String {
    match unit {
        GroupUnit::Hour => format!("{:02}:00", at.hour()),
        GroupUnit::Day => at.format("%Y-%m-%d").to_string(),
        GroupUnit::Month => at.format("%Y-%m").to_string(),
        GroupUnit::Weekday => weekday_label(at.weekday().num_days_from_monday()).to_string(),
    }
}

fn weekday_label(days_from_monday: u32) -> &'static str {
    match days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}
