use hoist_core::{ServiceDescriptor, UnitSource};

use crate::error::PhaseError;
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step};

/// Unit file and Caddyfile current, both services enabled and running, and
/// the application restarted since its configuration last changed.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    if ctx.restart_pending() {
        return Ok(false);
    }
    let artifacts = hoist_render::services(ctx.deployment);
    if !artifacts.iter().all(|a| ctx.fs.is_current(a)) {
        return Ok(false);
    }
    for service in [ctx.deployment.app_service(), ctx.deployment.proxy_service()] {
        let unit = service.unit_name();
        for check in ["is-enabled", "is-active"] {
            if !probe(ctx.exec, systemctl([check, "--quiet", unit.as_str()])).await? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    let d = ctx.deployment;

    let app = d.app_service();
    install_unit(ctx, &app).await?;
    start(ctx, &app, "restart").await?;
    ctx.clear_restart()?;

    let caddyfile = hoist_render::caddy::caddyfile(d);
    ctx.install(&caddyfile).await?;
    let path = caddyfile.path.display().to_string();
    let validate = Invocation::new(
        "caddy",
        [
            "validate",
            "--config",
            path.as_str(),
            "--adapter",
            "caddyfile",
        ],
    );
    step(ctx.exec, "validate Caddyfile", validate).await?;
    let proxy = d.proxy_service();
    install_unit(ctx, &proxy).await?;
    start(ctx, &proxy, "reload-or-restart").await
}

/// Generated units are written and picked up; packaged ones ship with the OS.
async fn install_unit<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
    service: &ServiceDescriptor,
) -> Result<(), PhaseError> {
    if service.unit == UnitSource::Generated {
        ctx.install(&hoist_render::systemd::unit(service)).await?;
        step(ctx.exec, "systemctl daemon-reload", systemctl(["daemon-reload"])).await?;
    }
    Ok(())
}

async fn start<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
    service: &ServiceDescriptor,
    verb: &str,
) -> Result<(), PhaseError> {
    let unit = service.unit_name();
    step(ctx.exec, "enable service", systemctl(["enable", unit.as_str()])).await?;
    step(ctx.exec, "start service", systemctl([verb, unit.as_str()])).await?;
    tracing::info!(unit = %unit, "service running");
    Ok(())
}

fn systemctl<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Invocation::new("systemctl", args)
}
