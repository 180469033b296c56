use crate::error::PhaseError;
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step};

const CRON_SERVICE: &str = "cron";

/// Cache directory exists, cron entry current, cron running.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    let d = ctx.deployment;
    if !ctx.fs.exists(&d.config.cache_dir()) {
        return Ok(false);
    }
    if !ctx.fs.is_current(&hoist_render::cron::cache_janitor(d)) {
        return Ok(false);
    }
    let active = Invocation::new("systemctl", ["is-active", "--quiet", CRON_SERVICE]);
    probe(ctx.exec, active).await
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    let d = ctx.deployment;
    let user = d.config.app.user.as_str();
    let dir = d.config.cache_dir().display().to_string();

    let mkdir = Invocation::new(
        "install",
        ["-d", "-o", user, "-g", user, "-m", "0755", dir.as_str()],
    );
    step(ctx.exec, "create cache directory", mkdir).await?;
    ctx.install(&hoist_render::cron::cache_janitor(d)).await?;
    step(
        ctx.exec,
        "start cron",
        Invocation::new("systemctl", ["enable", "--now", CRON_SERVICE]),
    )
    .await?;
    tracing::info!(
        dir = %dir,
        ttl_minutes = d.config.cache.ttl_minutes,
        "cache janitor registered"
    );
    Ok(())
}
