//! # Collection Orchestration
//!
//! Fans one worker out per selected source, merges every adapter's
//! output at a single synchronization point, and keeps per-source
//! failures isolated: a locked or unreadable database becomes a
//! diagnostic, never an aborted run. Zero readable sources is a valid
//! empty result, not an error.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::unbounded;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::{self, AdapterError, ScanWindow};
use crate::model::{BrowserKind, CanonicalVisit, Timeline};

/// One source database to read, as supplied by the path resolver.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub browser: BrowserKind,
    pub profile: String,
    pub path: PathBuf,
}

/// Structured record of a recoverable per-source failure.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDiagnostic {
    pub browser: BrowserKind,
    pub profile: String,
    pub reason: String,
    pub rows_skipped: u64,
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub timeline: Timeline,
    pub diagnostics: Vec<SourceDiagnostic>,
    pub sources_read: usize,
}

enum SourceResult {
    Visits(Vec<CanonicalVisit>, u64),
    Absent,
    Failed(AdapterError),
}

/// Read every source and merge the results into one timeline, newest
/// first. Workers run concurrently; nothing downstream sees a partial
/// merge. The cancel flag is honored between units of work so snapshot
/// copies still unwind through their destructors.
pub fn collect(
    sources: &[SourceSpec],
    window: ScanWindow,
    cancel: &AtomicBool,
) -> CollectOutcome {
    let (tx, rx) = unbounded();

    let mut outcome = CollectOutcome::default();
    thread::scope(|scope| {
        for spec in sources {
            let tx = tx.clone();
            scope.spawn(move || {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let result = read_source(spec, &window);
                let _ = tx.send((spec.clone(), result));
            });
        }
        drop(tx);

        for (spec, result) in rx {
            match result {
                SourceResult::Visits(visits, skipped) => {
                    info!(
                        "{} [{}]: {} visits",
                        spec.browser,
                        spec.profile,
                        visits.len()
                    );
                    outcome.sources_read += 1;
                    outcome.timeline.extend(visits);
                    if skipped > 0 {
                        outcome.diagnostics.push(SourceDiagnostic {
                            browser: spec.browser,
                            profile: spec.profile,
                            reason: "malformed rows skipped".to_string(),
                            rows_skipped: skipped,
                        });
                    }
                }
                SourceResult::Absent => {
                    debug!("{} [{}]: history not found", spec.browser, spec.profile);
                }
                SourceResult::Failed(err) => {
                    warn!("{} [{}]: {err}", spec.browser, spec.profile);
                    outcome.diagnostics.push(SourceDiagnostic {
                        browser: spec.browser,
                        profile: spec.profile,
                        reason: err.to_string(),
                        rows_skipped: 0,
                    });
                }
            }
        }
    });

    outcome.timeline.sort_recent_first();
    outcome
}

fn read_source(spec: &SourceSpec, window: &ScanWindow) -> SourceResult {
    let snapshot = match adapters::snapshot::acquire(&spec.path) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return SourceResult::Absent,
        Err(err) => return SourceResult::Failed(err),
    };

    let adapter = adapters::adapter_for(spec.browser);
    match adapter.list_visits(snapshot.path(), &spec.profile, window) {
        Ok(rows) => {
            let skipped = rows.skipped();
            SourceResult::Visits(rows.collect(), skipped)
        }
        Err(err) => SourceResult::Failed(err),
    }
}
