//! Version resolution and comparison.
//!
//! The installed version comes from the local version record and the latest
//! version from the upstream releases endpoint. Neither lookup can fail the
//! check: anything that goes wrong yields the `"unknown"` sentinel, and an
//! unknown version on either side means no update is offered.

use crate::constants::UNKNOWN_VERSION;
use crate::update::record::VersionRecordStore;
use crate::update::release::{ReleaseClient, ReleaseInfo, strip_v_prefix};
use chrono::{DateTime, Local};
use std::cmp::Ordering;
use std::num::{IntErrorKind, ParseIntError};
use std::path::Path;
use tracing::{debug, info};

/// Compare two dotted version strings.
///
/// A leading `v` is ignored, missing trailing components count as `0`, and a
/// component that is not a plain number also counts as `0`. So `"12.0"`
/// equals `"12.0.0"` and `"1.2-beta"` compares like `"1.0"`. Components are
/// signed (`"-1"` sorts below `"0"`) and out-of-range numbers saturate at the
/// `i64` bounds rather than falling back to `0`.
///
/// # Examples
///
/// ```rust
/// use portable_updater::update::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.2.0", "1.10.0"), Ordering::Less);
/// assert_eq!(compare_versions("v12.0", "12.0.0"), Ordering::Equal);
/// assert_eq!(compare_versions("2", "1.9.9"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = components(a);
    let right = components(b);
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn components(version: &str) -> Vec<i64> {
    strip_v_prefix(version.trim())
        .split('.')
        .map(|part| {
            part.parse::<i64>().unwrap_or_else(|e: ParseIntError| match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => 0,
            })
        })
        .collect()
}

/// Whether a version string is a real version rather than the unknown sentinel.
#[must_use]
pub fn is_known(version: &str) -> bool {
    !version.is_empty() && version != UNKNOWN_VERSION
}

/// Outcome of a version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    /// Installed version, or `"unknown"`
    pub current: String,
    /// Latest upstream version without the `v` prefix, or `"unknown"`
    pub latest: String,
    /// The upstream release, when it could be resolved
    pub release: Option<ReleaseInfo>,
    /// `true` only if both versions are known and `current < latest`
    pub update_available: bool,
}

impl VersionCheck {
    /// Build a check result from the two resolved sides.
    #[must_use]
    pub fn new(current: String, release: Option<ReleaseInfo>) -> Self {
        let latest = release
            .as_ref()
            .map_or_else(|| UNKNOWN_VERSION.to_string(), |r| r.version().to_string());
        let update_available = is_known(&current)
            && is_known(&latest)
            && compare_versions(&current, &latest) == Ordering::Less;

        Self {
            current,
            latest,
            release,
            update_available,
        }
    }
}

/// Resolves the installed and latest versions.
///
/// Has no side effects beyond the single network read.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    record: VersionRecordStore,
    releases: ReleaseClient,
}

impl VersionResolver {
    pub const fn new(record: VersionRecordStore, releases: ReleaseClient) -> Self {
        Self { record, releases }
    }

    /// Installed version from the record, or `"unknown"`.
    #[must_use]
    pub fn current_version(&self) -> String {
        self.record.read_version().unwrap_or_else(|e| {
            debug!(error = %e, "Installed version unknown");
            UNKNOWN_VERSION.to_string()
        })
    }

    /// Resolve both versions and compare them.
    pub async fn resolve_versions(&self) -> VersionCheck {
        let current = self.current_version();

        let release = match self.releases.fetch_latest().await {
            Ok(release) => Some(release),
            Err(e) => {
                debug!(error = %e, "Latest version unknown");
                None
            }
        };

        let check = VersionCheck::new(current, release);
        if check.update_available {
            info!(current = %check.current, latest = %check.latest, "Update available");
        } else {
            debug!(current = %check.current, latest = %check.latest, "No update available");
        }
        check
    }
}

/// Version of the bundle actually on disk.
///
/// Reads the `Version=` line of `application.ini` in the bundle directory and
/// falls back to the modification date of the marker executable, formatted
/// `YYYY.MM.DD`. Returns `None` when neither is available.
#[must_use]
pub fn read_bundle_version(app_dir: &Path, marker_file: &str) -> Option<String> {
    if let Ok(content) = std::fs::read_to_string(app_dir.join("application.ini")) {
        let version = content
            .lines()
            .filter_map(|line| line.trim().strip_prefix("Version="))
            .map(str::trim)
            .find(|v| !v.is_empty());
        if let Some(version) = version {
            return Some(version.to_string());
        }
    }

    let modified = std::fs::metadata(app_dir.join(marker_file)).ok()?.modified().ok()?;
    let modified: DateTime<Local> = modified.into();
    Some(modified.format("%Y.%m.%d").to_string())
}
