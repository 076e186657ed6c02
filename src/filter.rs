//! # Filter Evaluator
//!
//! [`FilterSpec`] is the immutable description of which visits to keep,
//! deserialized straight from the config file's `[filters]` table.
//! Compiling it validates bounds and patterns up front, so a spec that
//! can never match is rejected before any extraction starts.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{BrowserKind, CanonicalVisit};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("contradictory visit bounds: min {min} > max {max}")]
    VisitBounds { min: u32, max: u32 },
    #[error("contradictory time window: {from} is after {to}")]
    TimeWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    #[error("invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Composable filter description. Field names follow the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub browsers_allow: BTreeSet<BrowserKind>,
    pub browsers_deny: BTreeSet<BrowserKind>,
    #[serde(deserialize_with = "instant_opt")]
    pub time_from: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "instant_opt")]
    pub time_to: Option<DateTime<Utc>>,
    pub min_visit_count: u32,
    pub max_visit_count: Option<u32>,
    pub domain_whitelist: Vec<String>,
    pub domain_blacklist: Vec<String>,
    pub keywords: Vec<String>,
    pub use_regex: bool,
}

impl FilterSpec {
    /// True when a dimension is active that inspects record content;
    /// discovery mode over-fetches in that case so matches deep in the
    /// history are not cut off by the row cap.
    pub fn is_content_restricted(&self) -> bool {
        !self.domain_whitelist.is_empty()
            || !self.domain_blacklist.is_empty()
            || !self.keywords.is_empty()
            || self.min_visit_count > 0
            || self.max_visit_count.is_some()
    }

    /// Validate and compile into the matcher form. Fails fast on
    /// contradictory bounds and malformed regex patterns.
    pub fn compile(&self) -> Result<CompiledFilter, FilterError> {
        if let Some(max) = self.max_visit_count {
            if self.min_visit_count > max {
                return Err(FilterError::VisitBounds {
                    min: self.min_visit_count,
                    max,
                });
            }
        }
        if let (Some(from), Some(to)) = (self.time_from, self.time_to) {
            if from > to {
                return Err(FilterError::TimeWindow { from, to });
            }
        }
        Ok(CompiledFilter {
            browsers_allow: self.browsers_allow.clone(),
            browsers_deny: self.browsers_deny.clone(),
            time_from: self.time_from,
            time_to: self.time_to,
            min_visits: self.min_visit_count,
            max_visits: self.max_visit_count,
            domains_allow: PatternSet::compile(&self.domain_whitelist, self.use_regex)?,
            domains_deny: PatternSet::compile(&self.domain_blacklist, self.use_regex)?,
            keywords: PatternSet::compile(&self.keywords, self.use_regex)?,
        })
    }
}

/// Literal patterns match as case-insensitive substrings; regex mode
/// compiles each pattern case-insensitively instead.
enum PatternSet {
    Literal(Vec<String>),
    Regex(Vec<Regex>),
}

impl PatternSet {
    fn compile(patterns: &[String], use_regex: bool) -> Result<Self, FilterError> {
        if use_regex {
            let mut compiled = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| FilterError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })?;
                compiled.push(regex);
            }
            Ok(PatternSet::Regex(compiled))
        } else {
            Ok(PatternSet::Literal(
                patterns.iter().map(|p| p.to_lowercase()).collect(),
            ))
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            PatternSet::Literal(needles) => needles.is_empty(),
            PatternSet::Regex(patterns) => patterns.is_empty(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            PatternSet::Literal(needles) => {
                let haystack = text.to_lowercase();
                needles.iter().any(|needle| haystack.contains(needle))
            }
            PatternSet::Regex(patterns) => patterns.iter().any(|p| p.is_match(text)),
        }
    }
}

/// Validated matcher form of a [`FilterSpec`].
pub struct CompiledFilter {
    browsers_allow: BTreeSet<BrowserKind>,
    browsers_deny: BTreeSet<BrowserKind>,
    time_from: Option<DateTime<Utc>>,
    time_to: Option<DateTime<Utc>>,
    min_visits: u32,
    max_visits: Option<u32>,
    domains_allow: PatternSet,
    domains_deny: PatternSet,
    keywords: PatternSet,
}

impl CompiledFilter {
    /// Pure predicate over one visit. Dimensions are ANDed, evaluated
    /// in fixed precedence with short-circuiting; the domain deny-list
    /// runs after the allow-list and overrides it.
    pub fn matches(&self, visit: &CanonicalVisit) -> bool {
        if !self.browsers_allow.is_empty() && !self.browsers_allow.contains(&visit.browser) {
            return false;
        }
        if self.browsers_deny.contains(&visit.browser) {
            return false;
        }

        if let Some(from) = self.time_from {
            if visit.visited_at < from {
                return false;
            }
        }
        if let Some(to) = self.time_to {
            if visit.visited_at > to {
                return false;
            }
        }

        if visit.visit_count < self.min_visits {
            return false;
        }
        if let Some(max) = self.max_visits {
            if visit.visit_count > max {
                return false;
            }
        }

        let domain = visit.domain();
        if !self.domains_allow.is_empty() && !self.domains_allow.matches(&domain) {
            return false;
        }
        if self.domains_deny.matches(&domain) {
            return false;
        }

        if !self.keywords.is_empty()
            && !self.keywords.matches(&visit.title)
            && !self.keywords.matches(&visit.url)
        {
            return false;
        }

        true
    }
}

/// Parse a user-supplied instant: RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or a bare date.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

fn instant_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => parse_instant(s).map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn visit(url: &str, title: &str, count: u32, browser: BrowserKind) -> CanonicalVisit {
        CanonicalVisit {
            url: url.to_string(),
            title: title.to_string(),
            visited_at: Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap(),
            visit_count: count,
            browser,
            profile: "Default".to_string(),
        }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let filter = FilterSpec::default().compile().expect("compile");
        assert!(filter.matches(&visit(
            "https://example.com/",
            "",
            0,
            BrowserKind::Chrome
        )));
    }

    #[test]
    fn rejects_contradictory_visit_bounds() {
        let spec = FilterSpec {
            min_visit_count: 5,
            max_visit_count: Some(2),
            ..FilterSpec::default()
        };
        assert!(matches!(
            spec.compile(),
            Err(FilterError::VisitBounds { min: 5, max: 2 })
        ));
    }

    #[test]
    fn rejects_inverted_time_window() {
        let spec = FilterSpec {
            time_from: Some(Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()),
            time_to: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            ..FilterSpec::default()
        };
        assert!(matches!(spec.compile(), Err(FilterError::TimeWindow { .. })));
    }

    #[test]
    fn rejects_malformed_regex_before_extraction() {
        let spec = FilterSpec {
            keywords: vec!["[unclosed".to_string()],
            use_regex: true,
            ..FilterSpec::default()
        };
        assert!(matches!(spec.compile(), Err(FilterError::Pattern { .. })));
    }

    #[test]
    fn deny_overrides_allow() {
        let spec = FilterSpec {
            domain_whitelist: vec!["github.com".to_string()],
            domain_blacklist: vec!["github.com".to_string()],
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(!filter.matches(&visit(
            "https://github.com/rust-lang/rust",
            "GitHub",
            1,
            BrowserKind::Chrome
        )));
    }

    #[test]
    fn browser_deny_wins_over_browser_allow() {
        let spec = FilterSpec {
            browsers_allow: BTreeSet::from([BrowserKind::Chrome]),
            browsers_deny: BTreeSet::from([BrowserKind::Chrome]),
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(!filter.matches(&visit("https://a.example/", "", 1, BrowserKind::Chrome)));
    }

    #[test]
    fn keywords_match_title_or_url_case_insensitively() {
        let spec = FilterSpec {
            keywords: vec!["PYTHON".to_string()],
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(filter.matches(&visit(
            "https://docs.python.org/3/",
            "",
            1,
            BrowserKind::Firefox
        )));
        assert!(filter.matches(&visit(
            "https://example.com/",
            "Learning Python",
            1,
            BrowserKind::Firefox
        )));
        assert!(!filter.matches(&visit(
            "https://example.com/",
            "Rust book",
            1,
            BrowserKind::Firefox
        )));
    }

    #[test]
    fn regex_mode_treats_patterns_as_expressions() {
        let spec = FilterSpec {
            domain_whitelist: vec![r"^docs\..*\.org$".to_string()],
            use_regex: true,
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(filter.matches(&visit(
            "https://docs.python.org/3/",
            "",
            1,
            BrowserKind::Firefox
        )));
        assert!(!filter.matches(&visit(
            "https://python.org/",
            "",
            1,
            BrowserKind::Firefox
        )));
    }

    #[test]
    fn time_window_bounds_are_inclusive() {
        let at = Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap();
        let spec = FilterSpec {
            time_from: Some(at),
            time_to: Some(at),
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(filter.matches(&visit("https://a.example/", "", 1, BrowserKind::Chrome)));
    }

    #[test]
    fn visit_bounds_are_inclusive() {
        let spec = FilterSpec {
            min_visit_count: 2,
            max_visit_count: Some(4),
            ..FilterSpec::default()
        };
        let filter = spec.compile().expect("compile");
        assert!(!filter.matches(&visit("https://a.example/", "", 1, BrowserKind::Chrome)));
        assert!(filter.matches(&visit("https://a.example/", "", 2, BrowserKind::Chrome)));
        assert!(filter.matches(&visit("https://a.example/", "", 4, BrowserKind::Chrome)));
        assert!(!filter.matches(&visit("https://a.example/", "", 5, BrowserKind::Chrome)));
    }

    #[test]
    fn relaxing_one_dimension_only_grows_the_result_set() {
        let visits = vec![
            visit("https://github.com/a", "repo", 3, BrowserKind::Chrome),
            visit("https://docs.python.org/3/", "Python Docs", 0, BrowserKind::Firefox),
            visit("https://duckduckgo.com/?q=rust", "Search", 2, BrowserKind::Chrome),
        ];
        let strict = FilterSpec {
            keywords: vec!["python".to_string()],
            min_visit_count: 0,
            ..FilterSpec::default()
        };
        let relaxed = FilterSpec {
            keywords: Vec::new(),
            ..strict.clone()
        };

        let strict = strict.compile().expect("compile");
        let relaxed = relaxed.compile().expect("compile");
        let strict_set: Vec<&CanonicalVisit> =
            visits.iter().filter(|v| strict.matches(v)).collect();
        let relaxed_set: Vec<&CanonicalVisit> =
            visits.iter().filter(|v| relaxed.matches(v)).collect();

        assert_eq!(strict_set.len(), 1);
        assert_eq!(strict_set[0].url, "https://docs.python.org/3/");
        assert!(strict_set.iter().all(|v| relaxed_set.contains(v)));
    }

    #[test]
    fn parses_rfc3339_naive_and_date_instants() {
        let full = parse_instant("2025-06-09T14:30:15Z").expect("rfc3339");
        assert_eq!(full, Utc.with_ymd_and_hms(2025, 6, 9, 14, 30, 15).unwrap());
        let naive = parse_instant("2025-06-09T14:30:15").expect("naive");
        assert_eq!(naive, full);
        let date = parse_instant("2025-06-09").expect("date");
        assert_eq!(date, Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap());
        assert!(parse_instant("last tuesday").is_err());
    }
}
