use secrecy::ExposeSecret;

use crate::error::PhaseError;
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step, step_streaming};

const ADMIN_EXISTS: &str =
    "exit(User.exists?(username: ENV.fetch('HOIST_ADMIN_USERNAME')) ? 0 : 1)";

const CREATE_ADMIN: &str = "\
username = ENV.fetch('HOIST_ADMIN_USERNAME')
unless User.exists?(username: username)
  User.create!(
    username: username,
    email: ENV.fetch('HOIST_ADMIN_EMAIL'),
    password: ENV.fetch('HOIST_ADMIN_PASSWORD'),
    password_confirmation: ENV.fetch('HOIST_ADMIN_PASSWORD'),
    is_admin: true,
    is_moderator: true
  )
end
";

/// Compiled assets present and the administrator account exists.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    let assets = ctx.deployment.app_dir().join("public/assets");
    if !ctx.fs.has_entries(&assets) {
        return Ok(false);
    }
    probe(ctx.exec, admin_runner(ctx, ADMIN_EXISTS)).await
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    step_streaming(ctx.exec, "rails db:prepare", ctx.rails(["db:prepare"])).await?;
    let precompile = ctx.rails(["assets:precompile"]);
    step_streaming(ctx.exec, "rails assets:precompile", precompile).await?;
    step(ctx.exec, "create administrator", admin_runner(ctx, CREATE_ADMIN)).await?;
    tracing::info!(username = %ctx.deployment.admin.username, "administrator ensured");
    Ok(())
}

/// `rails runner` with the admin account passed through the environment.
fn admin_runner<E: CommandExecutor>(ctx: &PhaseContext<'_, E>, script: &str) -> Invocation {
    let admin = &ctx.deployment.admin;
    ctx.rails(["runner", script])
        .env("HOIST_ADMIN_USERNAME", &admin.username)
        .env("HOIST_ADMIN_EMAIL", &admin.email)
        .env("HOIST_ADMIN_PASSWORD", admin.password.expose_secret())
}
