use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use webtrail::{
    adapters::ScanWindow,
    analytics, cli, collect, config,
    config::OutputFormat,
    display,
    export::{self, ExportFormat},
    locate, logging,
};

fn main() -> Result<()> {
    logging::init_logging();

    let cli_opts = cli::parse();

    if cli_opts.init_config {
        let path = cli_opts
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("webtrail.toml"));
        config::write_default_config(&path)?;
        info!("wrote default config: {}", path.display());
        return Ok(());
    }

    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    cli::apply_overrides(&mut cfg, &cli_opts)?;

    // An impossible filter can never match; reject it before touching
    // any source database.
    let filter = cfg.filters.compile()?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))?;
    }

    let enabled = cfg.enabled_browsers();
    let sources = match locate::default_home() {
        Some(home) => locate::discover(&home, &enabled),
        None => {
            warn!("no home directory in environment; nothing to discover");
            Vec::new()
        }
    };

    let exhaustive = cli_opts.all || cli_opts.no_time_filter;
    let window = if exhaustive {
        ScanWindow::exhaustive()
    } else {
        let fetch_factor = if cfg.filters.is_content_restricted() {
            10
        } else {
            1
        };
        ScanWindow {
            cutoff: Some(Utc::now() - Duration::days(i64::from(cfg.output.days_back))),
            row_limit: Some((cfg.output.limit * fetch_factor) as u64),
        }
    };

    info!(
        "starting run: {} sources, config_hash={}",
        sources.len(),
        &loaded.config_hash[..12.min(loaded.config_hash.len())]
    );

    let outcome = collect::collect(&sources, window, &cancel);
    for diag in &outcome.diagnostics {
        warn!(
            "{} [{}]: {} ({} rows skipped)",
            diag.browser, diag.profile, diag.reason, diag.rows_skipped
        );
    }
    info!(
        "collected {} visits from {} sources",
        outcome.timeline.len(),
        outcome.sources_read
    );

    let mut timeline = outcome.timeline;
    timeline.retain(|visit| filter.matches(visit));

    if cfg.exports.anonymize_urls {
        timeline.anonymize();
    }

    if !cli_opts.all {
        timeline.window(cfg.output.offset, cfg.output.limit);
    }

    let visits = timeline.visits();
    let report = || {
        analytics::aggregate(
            visits,
            cfg.analytics.group_patterns_by,
            cfg.analytics.top_domains_limit,
        )
    };

    let rendered: Vec<u8> = match cfg.output.format {
        OutputFormat::Timeline => display::render_timeline(visits, &cfg.display).into_bytes(),
        OutputFormat::Stats => {
            display::render_stats(&report(), &cfg.display.date_format).into_bytes()
        }
        OutputFormat::TopDomains => display::render_top_domains(&report()).into_bytes(),
        OutputFormat::BrowserUsage => display::render_browser_usage(&report()).into_bytes(),
        OutputFormat::Patterns => display::render_patterns(&report()).into_bytes(),
        OutputFormat::Json => export::build_exporter(ExportFormat::Json).export(visits)?,
        OutputFormat::Csv => export::build_exporter(ExportFormat::Csv).export(visits)?,
        OutputFormat::Splunk => export::build_exporter(ExportFormat::Splunk).export(visits)?,
        OutputFormat::Elk => export::build_exporter(ExportFormat::Elk).export(visits)?,
        OutputFormat::Gephi => export::build_exporter(ExportFormat::Gephi).export(visits)?,
        OutputFormat::TimelineJson => {
            export::build_exporter(ExportFormat::TimelineJson).export(visits)?
        }
    };

    match &cli_opts.output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            info!("wrote {} bytes to {}", rendered.len(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&rendered)?;
        }
    }

    info!("webtrail run finished");
    Ok(())
}
