use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use hoist_core::HoistConfig;

use crate::output;

/// One in-process sweep with the cron entry's eviction policy.
pub fn janitor(
    config: &Path,
    dir: Option<PathBuf>,
    ttl_minutes: Option<u32>,
) -> anyhow::Result<()> {
    let config = HoistConfig::load(config)?;
    let dir = dir.unwrap_or_else(|| config.cache_dir());
    let ttl_minutes = ttl_minutes.unwrap_or(config.cache.ttl_minutes);
    anyhow::ensure!(ttl_minutes >= 1, "--ttl-minutes must be at least 1");

    let ttl = Duration::from_secs(u64::from(ttl_minutes) * 60);
    let report = hoist_host::sweep(&dir, ttl, SystemTime::now())?;

    output::info(format!(
        "swept {}: removed {}, kept {}, vanished {}",
        dir.display(),
        report.removed,
        report.kept,
        report.vanished
    ));
    if report.failed > 0 {
        output::warn(format!("{} file(s) could not be removed", report.failed));
    }
    Ok(())
}
