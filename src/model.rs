//! # Unified Timeline Model
//!
//! The canonical record type shared by every adapter, filter, aggregate
//! and exporter, plus the merged timeline collection. Raw source epochs
//! never appear here; `visited_at` is always canonical UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::epoch::EpochKind;

/// Sentinel domain for URLs without a parseable host.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// The ten supported browsers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Firefox,
    Safari,
    Brave,
    Opera,
    Edge,
    Vivaldi,
    Tor,
    Chromium,
    LibreWolf,
}

/// Schema family a browser belongs to. Adding a browser means mapping it
/// onto one of these; filter, analytics and export code never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chromium,
    Firefox,
    Safari,
}

impl BrowserKind {
    pub const ALL: [BrowserKind; 10] = [
        BrowserKind::Chrome,
        BrowserKind::Firefox,
        BrowserKind::Safari,
        BrowserKind::Brave,
        BrowserKind::Opera,
        BrowserKind::Edge,
        BrowserKind::Vivaldi,
        BrowserKind::Tor,
        BrowserKind::Chromium,
        BrowserKind::LibreWolf,
    ];

    pub fn family(self) -> BrowserFamily {
        match self {
            BrowserKind::Chrome
            | BrowserKind::Brave
            | BrowserKind::Opera
            | BrowserKind::Edge
            | BrowserKind::Vivaldi
            | BrowserKind::Chromium => BrowserFamily::Chromium,
            BrowserKind::Firefox | BrowserKind::Tor | BrowserKind::LibreWolf => {
                BrowserFamily::Firefox
            }
            BrowserKind::Safari => BrowserFamily::Safari,
        }
    }

    /// Lowercase identifier used in config files and CLI flags.
    pub fn key(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Safari => "safari",
            BrowserKind::Brave => "brave",
            BrowserKind::Opera => "opera",
            BrowserKind::Edge => "edge",
            BrowserKind::Vivaldi => "vivaldi",
            BrowserKind::Tor => "tor",
            BrowserKind::Chromium => "chromium",
            BrowserKind::LibreWolf => "librewolf",
        }
    }

    /// Human-readable name used in rendered output.
    pub fn label(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "Chrome",
            BrowserKind::Firefox => "Firefox",
            BrowserKind::Safari => "Safari",
            BrowserKind::Brave => "Brave",
            BrowserKind::Opera => "Opera",
            BrowserKind::Edge => "Edge",
            BrowserKind::Vivaldi => "Vivaldi",
            BrowserKind::Tor => "Tor Browser",
            BrowserKind::Chromium => "Chromium",
            BrowserKind::LibreWolf => "LibreWolf",
        }
    }
}

impl BrowserFamily {
    pub fn epoch(self) -> EpochKind {
        match self {
            BrowserFamily::Chromium => EpochKind::Chromium,
            BrowserFamily::Firefox => EpochKind::Mozilla,
            BrowserFamily::Safari => EpochKind::AppleCoreData,
        }
    }
}

impl FromStr for BrowserKind {
    type Err = UnknownBrowser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        BrowserKind::ALL
            .into_iter()
            .find(|kind| kind.key() == needle)
            .ok_or_else(|| UnknownBrowser(s.trim().to_string()))
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBrowser(pub String);

impl fmt::Display for UnknownBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown browser: {}", self.0)
    }
}

impl std::error::Error for UnknownBrowser {}

/// One normalized browsing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVisit {
    pub url: String,
    /// May be empty; sources store NULL titles freely.
    pub title: String,
    /// Canonical UTC, microsecond resolution where the source allows.
    pub visited_at: DateTime<Utc>,
    /// Source-reported cumulative visits for the URL; 0 when unknown.
    pub visit_count: u32,
    pub browser: BrowserKind,
    /// Opaque profile identifier, kept for traceability.
    pub profile: String,
}

impl CanonicalVisit {
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }
}

/// Host name of a URL, lowercased. Pure and total: anything without a
/// parseable host collapses onto the `"unknown"` sentinel.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_ascii_lowercase()))
        .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string())
}

/// Replace the path and query of a URL with a stable hash-derived token,
/// preserving scheme and host. Pure, so the same URL always yields the
/// same token within a run and across runs.
pub fn anonymize_url(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return format!("anonymized://{UNKNOWN_DOMAIN}/");
    };
    let Some(host) = parsed.host_str() else {
        return format!("anonymized://{UNKNOWN_DOMAIN}/");
    };

    let mut tail = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        tail.push('?');
        tail.push_str(query);
    }
    let mut hasher = Sha256::new();
    hasher.update(tail.as_bytes());
    let token = hex::encode(&hasher.finalize()[..6]);

    match parsed.port() {
        Some(port) => format!("{}://{}:{}/{}", parsed.scheme(), host, port, token),
        None => format!("{}://{}/{}", parsed.scheme(), host, token),
    }
}

/// The merged, normalized collection of visits from every enabled source.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    visits: Vec<CanonicalVisit>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, visit: CanonicalVisit) {
        self.visits.push(visit);
    }

    pub fn extend<I: IntoIterator<Item = CanonicalVisit>>(&mut self, visits: I) {
        self.visits.extend(visits);
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn visits(&self) -> &[CanonicalVisit] {
        &self.visits
    }

    pub fn into_visits(self) -> Vec<CanonicalVisit> {
        self.visits
    }

    /// Timeline order: newest first, URL as a deterministic tie-break.
    pub fn sort_recent_first(&mut self) {
        self.visits.sort_by(|a, b| {
            b.visited_at
                .cmp(&a.visited_at)
                .then_with(|| a.url.cmp(&b.url))
        });
    }

    pub fn retain<F: FnMut(&CanonicalVisit) -> bool>(&mut self, keep: F) {
        self.visits.retain(keep);
    }

    /// Reduce to the display window `[offset, offset + limit)`.
    pub fn window(&mut self, offset: usize, limit: usize) {
        if offset >= self.visits.len() {
            self.visits.clear();
            return;
        }
        self.visits.drain(..offset);
        self.visits.truncate(limit);
    }

    /// Rewrite every URL through [`anonymize_url`]. Runs once, upstream
    /// of all exporters, so no format duplicates the transform.
    pub fn anonymize(&mut self) {
        for visit in &mut self.visits {
            visit.url = anonymize_url(&visit.url);
        }
    }
}

impl From<Vec<CanonicalVisit>> for Timeline {
    fn from(visits: Vec<CanonicalVisit>) -> Self {
        Self { visits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn visit(url: &str, secs: i64) -> CanonicalVisit {
        CanonicalVisit {
            url: url.to_string(),
            title: String::new(),
            visited_at: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
            visit_count: 1,
            browser: BrowserKind::Chrome,
            profile: "Default".to_string(),
        }
    }

    #[test]
    fn every_browser_maps_onto_a_family() {
        for kind in BrowserKind::ALL {
            let _ = kind.family().epoch();
        }
    }

    #[test]
    fn parses_config_keys() {
        assert_eq!("librewolf".parse::<BrowserKind>(), Ok(BrowserKind::LibreWolf));
        assert_eq!(" Chrome ".parse::<BrowserKind>(), Ok(BrowserKind::Chrome));
        assert!("netscape".parse::<BrowserKind>().is_err());
    }

    #[test]
    fn domain_is_lowercased_host() {
        assert_eq!(domain_of("https://GitHub.com/rust-lang/rust"), "github.com");
        assert_eq!(domain_of("http://localhost:8080/x"), "localhost");
    }

    #[test]
    fn malformed_urls_yield_sentinel_domain() {
        assert_eq!(domain_of("not a url"), UNKNOWN_DOMAIN);
        assert_eq!(domain_of(""), UNKNOWN_DOMAIN);
        assert_eq!(domain_of("about:blank"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn anonymization_is_stable_and_preserves_host() {
        let a = anonymize_url("https://github.com/rust-lang/rust?tab=issues");
        let b = anonymize_url("https://github.com/rust-lang/rust?tab=issues");
        assert_eq!(a, b);
        assert!(a.starts_with("https://github.com/"));
        assert!(!a.contains("rust-lang"));
    }

    #[test]
    fn distinct_paths_get_distinct_tokens() {
        let a = anonymize_url("https://github.com/rust-lang/rust");
        let b = anonymize_url("https://github.com/rust-lang/cargo");
        assert_ne!(a, b);
    }

    #[test]
    fn timeline_sorts_newest_first() {
        let mut timeline = Timeline::new();
        timeline.push(visit("https://a.example/", 100));
        timeline.push(visit("https://b.example/", 300));
        timeline.push(visit("https://c.example/", 200));
        timeline.sort_recent_first();
        let urls: Vec<&str> = timeline.visits().iter().map(|v| v.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://b.example/", "https://c.example/", "https://a.example/"]
        );
    }

    #[test]
    fn window_applies_offset_then_limit() {
        let mut timeline = Timeline::from(
            (0..10)
                .map(|i| visit(&format!("https://e{i}.example/"), 1000 - i))
                .collect::<Vec<_>>(),
        );
        timeline.window(2, 3);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.visits()[0].url, "https://e2.example/");
        let mut empty = Timeline::from(vec![visit("https://x.example/", 1)]);
        empty.window(5, 3);
        assert!(empty.is_empty());
    }

    #[test]
    fn serde_uses_lowercase_browser_names() {
        let t = Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap();
        let v = CanonicalVisit {
            url: "https://example.com/".into(),
            title: "Example".into(),
            visited_at: t,
            visit_count: 2,
            browser: BrowserKind::LibreWolf,
            profile: "default-release".into(),
        };
        let json = serde_json::to_string(&v).expect("serialize");
        assert!(json.contains("\"librewolf\""));
    }
}
