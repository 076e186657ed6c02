//! # Terminal Views
//!
//! Renderings of the timeline and aggregate reports as plain text.
//! Everything returns a `String`; only the binary decides where the
//! bytes go.

use std::fmt::Write;

use crate::analytics::AggregateReport;
use crate::config::DisplayConfig;
use crate::model::CanonicalVisit;

const RULE: &str =
    "================================================================================";

pub fn render_timeline(visits: &[CanonicalVisit], display: &DisplayConfig) -> String {
    let mut out = String::new();
    if visits.is_empty() {
        out.push_str("No history entries found\n");
        return out;
    }

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "BROWSER HISTORY TIMELINE ({} entries)", visits.len());
    let _ = writeln!(out, "{RULE}");

    let mut current_date = String::new();
    for visit in visits {
        let date = visit.visited_at.format("%Y-%m-%d").to_string();
        if date != current_date {
            current_date = date;
            let _ = writeln!(out, "\n{current_date}");
            let _ = writeln!(out, "----------------------------------------");
        }

        let _ = writeln!(
            out,
            "  {} [{}]",
            visit.visited_at.format("%H:%M:%S"),
            visit.browser
        );
        let title = if visit.title.is_empty() {
            "(no title)"
        } else {
            visit.title.as_str()
        };
        let _ = writeln!(out, "    {}", truncate(title, 70));
        if display.show_url {
            let _ = writeln!(out, "    {}", truncate(&visit.url, 70));
        }
        if display.show_visit_count && visit.visit_count > 1 {
            let _ = writeln!(out, "    visited {} times", visit.visit_count);
        }
    }
    out
}

pub fn render_stats(report: &AggregateReport, date_format: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "BROWSER HISTORY STATISTICS");
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "\nSummary");
    let _ = writeln!(out, "  Total entries:  {}", report.total_entries);
    let _ = writeln!(out, "  Total visits:   {}", report.total_visits);
    let _ = writeln!(out, "  Unique domains: {}", report.unique_domains);
    let _ = writeln!(out, "  Unique URLs:    {}", report.unique_urls);

    if let (Some(earliest), Some(latest)) = (report.earliest, report.latest) {
        let _ = writeln!(out, "\nTime range");
        let _ = writeln!(out, "  From: {}", earliest.format(date_format));
        let _ = writeln!(out, "  To:   {}", latest.format(date_format));
        let _ = writeln!(
            out,
            "  Span: {} days",
            (latest - earliest).num_days()
        );
    }

    if !report.browser_usage.is_empty() {
        let _ = writeln!(out, "\nBrowser usage");
        for usage in &report.browser_usage {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                usage.browser, usage.entries, usage.entry_share
            );
        }
    }

    if !report.top_domains.is_empty() {
        let _ = writeln!(out, "\nTop domains");
        for stat in report.top_domains.iter().take(10) {
            let _ = writeln!(out, "  {}: {} entries", stat.domain, stat.entries);
        }
    }
    out
}

pub fn render_top_domains(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "TOP {} DOMAINS", report.top_domains.len());
    let _ = writeln!(out, "{RULE}");
    for (rank, stat) in report.top_domains.iter().enumerate() {
        let browsers: Vec<&str> = stat.browsers.iter().map(|b| b.label()).collect();
        let _ = writeln!(out, "{:2}. {}", rank + 1, stat.domain);
        let _ = writeln!(
            out,
            "    {} entries | {} total visits | {}",
            stat.entries,
            stat.visits,
            browsers.join(", ")
        );
    }
    out
}

pub fn render_browser_usage(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "BROWSER USAGE");
    let _ = writeln!(out, "{RULE}");
    for usage in &report.browser_usage {
        let _ = writeln!(out, "\n{}", usage.browser);
        let _ = writeln!(
            out,
            "  Entries: {} ({:.1}%)",
            usage.entries, usage.entry_share
        );
        let _ = writeln!(out, "  Visits: {}", usage.visits);
        let _ = writeln!(out, "  Unique domains: {}", usage.unique_domains);
        let average = usage.visits as f64 / usage.entries.max(1) as f64;
        let _ = writeln!(out, "  Avg visits/entry: {average:.1}");
    }
    out
}

pub fn render_patterns(report: &AggregateReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "BROWSING PATTERNS");
    let _ = writeln!(out, "{RULE}");

    let max_count = report
        .histogram
        .iter()
        .map(|bucket| bucket.entries)
        .max()
        .unwrap_or(1)
        .max(1);
    for bucket in &report.histogram {
        let bar_len = (bucket.entries * 50 / max_count) as usize;
        let share = if report.total_entries == 0 {
            0.0
        } else {
            bucket.entries as f64 * 100.0 / report.total_entries as f64
        };
        let _ = writeln!(
            out,
            "{:>12} |{:<50} {:>6} ({share:4.1}%)",
            bucket.label,
            "#".repeat(bar_len),
            bucket.entries
        );
    }
    out
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
