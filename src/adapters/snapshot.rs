//! Read-only snapshot copies of live browser databases.
//!
//! A running browser may hold its history database open for writing, so
//! the original file is never opened directly. Each pass copies it into
//! a private temp directory first; dropping the [`Snapshot`] removes the
//! copy on every exit path, including early returns and panics.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};

use super::AdapterError;

const COPY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// A transient read-only working copy of one source database.
pub struct Snapshot {
    // Held only for its Drop: deleting the directory deletes the copy.
    _dir: TempDir,
    path: PathBuf,
}

impl Snapshot {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Copy `source` into a private temp directory.
///
/// `Ok(None)` when the source does not exist — an uninstalled browser is
/// not an error. A source that stays unreadable through the bounded
/// retry schedule surfaces as [`AdapterError::Unavailable`].
pub fn acquire(source: &Path) -> Result<Option<Snapshot>, AdapterError> {
    if !source.exists() {
        debug!("source not present: {}", source.display());
        return Ok(None);
    }

    let dir = tempfile::Builder::new().prefix("webtrail-").tempdir()?;
    let dest = dir.path().join("history.db");

    let mut last_err: Option<std::io::Error> = None;
    for attempt in 0..COPY_ATTEMPTS {
        if attempt > 0 {
            thread::sleep(RETRY_BASE_DELAY * attempt);
        }
        match fs::copy(source, &dest) {
            Ok(_) => {
                return Ok(Some(Snapshot {
                    _dir: dir,
                    path: dest,
                }));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                warn!(
                    "snapshot copy attempt {}/{} failed for {}: {}",
                    attempt + 1,
                    COPY_ATTEMPTS,
                    source.display(),
                    err
                );
                last_err = Some(err);
            }
        }
    }

    let reason = last_err
        .map(|err| err.to_string())
        .unwrap_or_else(|| "unknown error".to_string());
    Err(AdapterError::Unavailable(format!(
        "{}: {}",
        source.display(),
        reason
    )))
}
