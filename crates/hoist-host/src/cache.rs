//! In-process cache sweep, the same eviction the cron entry performs.

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::JanitorError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub kept: usize,
    /// Files gone before they could be inspected or removed
    pub vanished: usize,
    pub failed: usize,
}

/// Delete regular files under `dir` last modified more than `ttl` before
/// `now`. Recurses into subdirectories; symlinks are left alone.
///
/// A missing `dir` is an empty sweep.
pub fn sweep(dir: &Path, ttl: Duration, now: SystemTime) -> Result<SweepReport, JanitorError> {
    let mut report = SweepReport::default();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(report),
        Err(e) => {
            return Err(JanitorError::ReadDir {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };
    sweep_entries(entries, ttl, now, &mut report);
    tracing::debug!(dir = %dir.display(), ?report, "sweep finished");
    Ok(report)
}

fn sweep_entries(
    entries: std::fs::ReadDir,
    ttl: Duration,
    now: SystemTime,
    report: &mut SweepReport,
) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable directory entry");
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                record_error(report, &path, &e);
                continue;
            }
        };

        if file_type.is_dir() {
            match std::fs::read_dir(&path) {
                Ok(children) => sweep_entries(children, ttl, now, report),
                Err(e) => record_error(report, &path, &e),
            }
            continue;
        }
        if !file_type.is_file() {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                record_error(report, &path, &e);
                continue;
            }
        };
        // Modification times in the future count as fresh.
        let age = match now.duration_since(modified) {
            Ok(age) => age,
            Err(_) => Duration::ZERO,
        };
        if age <= ttl {
            report.kept += 1;
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(e) => record_error(report, &path, &e),
        }
    }
}

fn record_error(report: &mut SweepReport, path: &Path, error: &std::io::Error) {
    if error.kind() == ErrorKind::NotFound {
        report.vanished += 1;
    } else {
        tracing::warn!(path = %path.display(), error = %error, "could not sweep");
        report.failed += 1;
    }
}
