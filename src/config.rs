//! # Configuration
//!
//! TOML configuration with a compiled-in default. The loaded value is
//! immutable after CLI overrides are applied and is threaded explicitly
//! through the run — there is no ambient configuration state.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::analytics::GroupUnit;
use crate::filter::FilterSpec;
use crate::model::BrowserKind;

const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which browsers to read. A browser missing from the table counts
    /// as disabled.
    pub browsers: BTreeMap<BrowserKind, bool>,
    pub output: OutputConfig,
    pub display: DisplayConfig,
    pub filters: FilterSpec,
    pub analytics: AnalyticsConfig,
    pub exports: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browsers: BrowserKind::ALL.into_iter().map(|k| (k, true)).collect(),
            output: OutputConfig::default(),
            display: DisplayConfig::default(),
            filters: FilterSpec::default(),
            analytics: AnalyticsConfig::default(),
            exports: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Enabled browsers in declaration order.
    pub fn enabled_browsers(&self) -> Vec<BrowserKind> {
        BrowserKind::ALL
            .into_iter()
            .filter(|kind| self.browsers.get(kind).copied().unwrap_or(false))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Display cap and the basis for the discovery-mode fetch limit.
    pub limit: usize,
    pub offset: usize,
    /// Discovery-mode window: only visits from the last N days.
    pub days_back: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Timeline,
            limit: 100,
            offset: 0,
            days_back: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_url: bool,
    pub show_visit_count: bool,
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_url: true,
            show_visit_count: true,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub group_patterns_by: GroupUnit,
    pub top_domains_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            group_patterns_by: GroupUnit::Hour,
            top_domains_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub anonymize_urls: bool,
}

/// Every supported rendering of a run's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
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

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// SHA-256 of the raw config text, logged for run provenance.
    pub config_hash: String,
}

pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    let text: String = if let Some(p) = path {
        std::fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?
    } else {
        DEFAULT_CONFIG_TOML.to_string()
    };

    let config: Config = toml::from_str(&text).context("parsing config")?;
    let config_hash = hash_bytes(text.as_bytes());
    Ok(LoadedConfig {
        config,
        config_hash,
    })
}

/// Write the embedded default config for the user to edit.
pub fn write_default_config(path: &Path) -> Result<()> {
    std::fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("writing config {}", path.display()))
}

fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
