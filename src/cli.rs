use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::warn;

use crate::analytics::GroupUnit;
use crate::config::{Config, OutputFormat};
use crate::filter::parse_instant;
use crate::model::BrowserKind;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum FormatArg {
    Timeline,
    Json,
    Csv,
    Stats,
    TopDomains,
    BrowserUsage,
    Patterns,
    Splunk,
    Elk,
    Gephi,
    TimelineJson,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum GroupByArg {
    Hour,
    Day,
    Weekday,
    Month,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Timeline => OutputFormat::Timeline,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Stats => OutputFormat::Stats,
            FormatArg::TopDomains => OutputFormat::TopDomains,
            FormatArg::BrowserUsage => OutputFormat::BrowserUsage,
            FormatArg::Patterns => OutputFormat::Patterns,
            FormatArg::Splunk => OutputFormat::Splunk,
            FormatArg::Elk => OutputFormat::Elk,
            FormatArg::Gephi => OutputFormat::Gephi,
            FormatArg::TimelineJson => OutputFormat::TimelineJson,
        }
    }
}

impl From<GroupByArg> for GroupUnit {
    fn from(arg: GroupByArg) -> Self {
        match arg {
            GroupByArg::Hour => GroupUnit::Hour,
            GroupByArg::Day => GroupUnit::Day,
            GroupByArg::Weekday => GroupUnit::Weekday,
            GroupByArg::Month => GroupUnit::Month,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Optional path to config file (TOML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Write the default config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Days back to scan in discovery mode
    #[arg(long)]
    pub days: Option<u32>,

    /// Window start (ISO format, e.g. 2025-06-01T10:00:00)
    #[arg(long)]
    pub time_from: Option<String>,

    /// Window end (ISO format)
    #[arg(long)]
    pub time_to: Option<String>,

    /// Only read these browsers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub browsers: Option<Vec<String>>,

    /// Skip these browsers (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude_browsers: Option<Vec<String>>,

    /// Only keep these domains (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub domain_include: Option<Vec<String>>,

    /// Drop these domains; overrides --domain-include
    #[arg(long, value_delimiter = ',')]
    pub domain_exclude: Option<Vec<String>>,

    /// Keywords matched against titles and URLs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub search: Option<Vec<String>>,

    /// Minimum visit count
    #[arg(long)]
    pub min_visits: Option<u32>,

    /// Maximum visit count
    #[arg(long)]
    pub max_visits: Option<u32>,

    /// Treat domain and keyword filters as regular expressions
    #[arg(long)]
    pub regex: bool,

    /// Max entries to show
    #[arg(long)]
    pub limit: Option<usize>,

    /// Entries to skip before the display window
    #[arg(long)]
    pub offset: Option<usize>,

    /// Scan entire histories and show everything (ignores limit)
    #[arg(long)]
    pub all: bool,

    /// Disable the recent-days cutoff
    #[arg(long)]
    pub no_time_filter: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Anonymize URLs before rendering
    #[arg(long)]
    pub anonymize: bool,

    /// Group the patterns histogram by this time unit
    #[arg(long, value_enum)]
    pub group_by: Option<GroupByArg>,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

/// Fold CLI flags into the loaded config. Unknown browser names warn
/// and are ignored; malformed instants are errors.
pub fn apply_overrides(cfg: &mut Config, cli: &CliOptions) -> Result<()> {
    if let Some(names) = &cli.browsers {
        for enabled in cfg.browsers.values_mut() {
            *enabled = false;
        }
        for name in names {
            match name.parse::<BrowserKind>() {
                Ok(kind) => {
                    cfg.browsers.insert(kind, true);
                }
                Err(err) => warn!("--browsers: {err}"),
            }
        }
    }
    if let Some(names) = &cli.exclude_browsers {
        for name in names {
            match name.parse::<BrowserKind>() {
                Ok(kind) => {
                    cfg.browsers.insert(kind, false);
                }
                Err(err) => warn!("--exclude-browsers: {err}"),
            }
        }
    }

    if let Some(format) = cli.format {
        cfg.output.format = format.into();
    }
    if let Some(days) = cli.days {
        cfg.output.days_back = days;
    }
    if let Some(limit) = cli.limit {
        cfg.output.limit = limit;
    }
    if let Some(offset) = cli.offset {
        cfg.output.offset = offset;
    }

    if let Some(domains) = &cli.domain_include {
        cfg.filters.domain_whitelist = trimmed(domains);
    }
    if let Some(domains) = &cli.domain_exclude {
        cfg.filters.domain_blacklist = trimmed(domains);
    }
    if let Some(keywords) = &cli.search {
        cfg.filters.keywords = trimmed(keywords);
    }
    if let Some(min) = cli.min_visits {
        cfg.filters.min_visit_count = min;
    }
    if let Some(max) = cli.max_visits {
        cfg.filters.max_visit_count = Some(max);
    }
    if let Some(s) = &cli.time_from {
        cfg.filters.time_from =
            Some(parse_instant(s).with_context(|| format!("invalid --time-from {s:?}"))?);
    }
    if let Some(s) = &cli.time_to {
        cfg.filters.time_to =
            Some(parse_instant(s).with_context(|| format!("invalid --time-to {s:?}"))?);
    }
    if cli.regex {
        cfg.filters.use_regex = true;
    }

    if let Some(unit) = cli.group_by {
        cfg.analytics.group_patterns_by = unit.into();
    }
    if cli.anonymize {
        cfg.exports.anonymize_urls = true;
    }
    Ok(())
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
