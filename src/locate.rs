//! # Profile Path Discovery
//!
//! Default history-database locations per browser on macOS and Linux.
//! Discovery only reports paths that exist; missing browsers simply
//! contribute nothing. The extraction core never calls into this
//! module — it is the path-resolver collaborator wired up by `main`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::collect::SourceSpec;
use crate::model::BrowserKind;

/// Home directory of the current user, if the environment names one.
pub fn default_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Discover history databases for the enabled browsers on this host.
pub fn discover(home: &Path, enabled: &[BrowserKind]) -> Vec<SourceSpec> {
    discover_on(std::env::consts::OS, home, enabled)
}

/// OS-parameterized discovery, split out so tests can probe both
/// platform layouts from anywhere.
pub fn discover_on(os: &str, home: &Path, enabled: &[BrowserKind]) -> Vec<SourceSpec> {
    let mut sources = Vec::new();
    for &browser in enabled {
        match browser {
            BrowserKind::Chrome
            | BrowserKind::Brave
            | BrowserKind::Opera
            | BrowserKind::Edge
            | BrowserKind::Vivaldi
            | BrowserKind::Chromium => {
                if let Some(path) = chromium_history_path(os, home, browser) {
                    push_if_present(&mut sources, browser, "Default", path);
                }
            }
            BrowserKind::Firefox | BrowserKind::LibreWolf => {
                sources.extend(mozilla_profiles(os, home, browser));
            }
            BrowserKind::Tor => {
                sources.extend(tor_profiles(os, home));
            }
            BrowserKind::Safari => {
                if os == "macos" {
                    for candidate in safari_candidates(home) {
                        if candidate.exists() {
                            push_if_present(&mut sources, browser, "Default", candidate);
                            break;
                        }
                    }
                }
            }
        }
    }
    sources
}

fn push_if_present(
    sources: &mut Vec<SourceSpec>,
    browser: BrowserKind,
    profile: &str,
    path: PathBuf,
) {
    if path.exists() {
        sources.push(SourceSpec {
            browser,
            profile: profile.to_string(),
            path,
        });
    } else {
        debug!("{browser}: no history at {}", path.display());
    }
}

fn chromium_history_path(os: &str, home: &Path, browser: BrowserKind) -> Option<PathBuf> {
    let relative = match (browser, os) {
        (BrowserKind::Chrome, "macos") => {
            "Library/Application Support/Google/Chrome/Default/History"
        }
        (BrowserKind::Chrome, "linux") => ".config/google-chrome/Default/History",
        (BrowserKind::Brave, "macos") => {
            "Library/Application Support/BraveSoftware/Brave-Browser/Default/History"
        }
        (BrowserKind::Brave, "linux") => ".config/BraveSoftware/Brave-Browser/Default/History",
        (BrowserKind::Opera, "macos") => {
            "Library/Application Support/com.operasoftware.Opera/History"
        }
        (BrowserKind::Opera, "linux") => ".config/opera/History",
        (BrowserKind::Edge, "macos") => {
            "Library/Application Support/Microsoft Edge/Default/History"
        }
        (BrowserKind::Edge, "linux") => ".config/microsoft-edge/Default/History",
        (BrowserKind::Vivaldi, "macos") => "Library/Application Support/Vivaldi/Default/History",
        (BrowserKind::Vivaldi, "linux") => ".config/vivaldi/Default/History",
        (BrowserKind::Chromium, "macos") => "Library/Application Support/Chromium/Default/History",
        (BrowserKind::Chromium, "linux") => ".config/chromium/Default/History",
        _ => return None,
    };
    Some(home.join(relative))
}

/// Firefox and LibreWolf keep per-profile directories; any profile with
/// "default" in its name and a places database counts.
fn mozilla_profiles(os: &str, home: &Path, browser: BrowserKind) -> Vec<SourceSpec> {
    let profile_root = match (browser, os) {
        (BrowserKind::Firefox, "macos") => home.join("Library/Application Support/Firefox/Profiles"),
        (BrowserKind::Firefox, "linux") => home.join(".mozilla/firefox"),
        (BrowserKind::LibreWolf, "macos") => {
            home.join("Library/Application Support/LibreWolf/Profiles")
        }
        (BrowserKind::LibreWolf, "linux") => home.join(".librewolf"),
        _ => return Vec::new(),
    };
    scan_profiles(&profile_root, browser, |name| {
        name.to_lowercase().contains("default")
    })
}

fn tor_profiles(os: &str, home: &Path) -> Vec<SourceSpec> {
    let mut roots = Vec::new();
    match os {
        "macos" => roots.push(home.join("Library/Application Support/TorBrowser-Data/Browser")),
        "linux" => {
            roots.push(home.join(".tor-browser/app/Browser/TorBrowser/Data/Browser"));
            roots.push(home.join("Desktop/tor-browser_en-US/Browser/TorBrowser/Data/Browser"));
        }
        _ => {}
    }
    for root in roots {
        let found = scan_profiles(&root, BrowserKind::Tor, |name| name.ends_with(".default"));
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn scan_profiles(
    root: &Path,
    browser: BrowserKind,
    is_candidate: impl Fn(&str) -> bool,
) -> Vec<SourceSpec> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut sources = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_candidate(&name) {
            continue;
        }
        let places = path.join("places.sqlite");
        if places.exists() {
            sources.push(SourceSpec {
                browser,
                profile: name,
                path: places,
            });
        }
    }
    // read_dir order is filesystem-dependent.
    sources.sort_by(|a, b| a.profile.cmp(&b.profile));
    sources
}

fn safari_candidates(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join("Library/Safari/History.db"),
        home.join("Library/Safari/History.sqlite"),
        home.join("Library/Safari/UserData/History.db"),
        home.join("Library/Containers/com.apple.Safari/Data/Library/Safari/History.db"),
    ]
}
