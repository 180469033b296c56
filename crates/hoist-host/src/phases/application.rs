use crate::error::PhaseError;
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step, step_streaming};

/// Checkout present, generated config current, gems installed.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    if !ctx.fs.exists(&ctx.deployment.app_dir().join(".git")) {
        return Ok(false);
    }
    let artifacts = hoist_render::application(ctx.deployment)?;
    if !artifacts.iter().all(|a| ctx.fs.is_current(a)) {
        return Ok(false);
    }
    probe(ctx.exec, ctx.in_app("bundle", ["check"])).await
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    let d = ctx.deployment;
    let app = &d.config.app;
    let dir = d.app_dir().display().to_string();

    if !ctx.fs.exists(&d.app_dir().join(".git")) {
        let user = app.user.as_str();
        let mkdir = Invocation::new(
            "install",
            ["-d", "-o", user, "-g", user, "-m", "0755", dir.as_str()],
        );
        step(ctx.exec, "create application directory", mkdir).await?;
        let clone = ctx.as_service_user(
            "git",
            [
                "clone",
                "--branch",
                app.branch.as_str(),
                d.repo_url.as_str(),
                dir.as_str(),
            ],
        );
        step_streaming(ctx.exec, "clone application", clone).await?;
    }

    // The app server reads these only at startup.
    let artifacts = hoist_render::application(d)?;
    if artifacts.iter().any(|a| !ctx.fs.is_current(a)) {
        ctx.request_restart()?;
    }
    for artifact in &artifacts {
        ctx.install(artifact).await?;
    }

    step(
        ctx.exec,
        "bundle config",
        ctx.in_app("bundle", ["config", "set", "--local", "deployment", "true"]),
    )
    .await?;
    step(
        ctx.exec,
        "bundle config",
        ctx.in_app("bundle", ["config", "set", "--local", "without", "development test"]),
    )
    .await?;
    step_streaming(ctx.exec, "bundle install", ctx.in_app("bundle", ["install"])).await
}
