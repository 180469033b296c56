use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{ExecError, PhaseError};
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step, step_streaming};

/// Service account exists, every apt package is installed and the pinned
/// Ruby is present under rbenv.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    if !user_exists(ctx).await? {
        return Ok(false);
    }
    if !missing_packages(ctx).await?.is_empty() {
        return Ok(false);
    }
    Ok(ctx.fs.exists(&ruby_dir(ctx)))
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    let config = &ctx.deployment.config;
    let user = config.app.user.as_str();

    if !user_exists(ctx).await? {
        let home = config.home_dir().display().to_string();
        let useradd = Invocation::new(
            "useradd",
            [
                "--system",
                "--create-home",
                "--home-dir",
                home.as_str(),
                "--shell",
                "/bin/bash",
                user,
            ],
        );
        step(ctx.exec, "create service account", useradd).await?;
    }

    let missing = missing_packages(ctx).await?;
    if !missing.is_empty() {
        tracing::info!(count = missing.len(), "installing packages");
        step_streaming(ctx.exec, "apt-get update", apt(["update"])).await?;
        let mut args = vec![
            "install".to_owned(),
            "-y".to_owned(),
            "--no-install-recommends".to_owned(),
        ];
        args.extend(missing);
        step_streaming(ctx.exec, "apt-get install", apt(args)).await?;
    }

    let home = config.home_dir();
    let rbenv_root = home.join(".rbenv");
    if !ctx.fs.exists(&rbenv_root.join("bin/rbenv")) {
        let dest = rbenv_root.display().to_string();
        let clone = shallow_clone(ctx, &config.packages.rbenv_repo, &dest);
        step_streaming(ctx.exec, "clone rbenv", clone).await?;
    }
    let ruby_build = rbenv_root.join("plugins/ruby-build");
    if !ctx.fs.exists(&ruby_build) {
        let dest = ruby_build.display().to_string();
        let clone = shallow_clone(ctx, &config.packages.ruby_build_repo, &dest);
        step_streaming(ctx.exec, "clone ruby-build", clone).await?;
    }

    if !ctx.fs.exists(&ruby_dir(ctx)) {
        let version = config.app.ruby_version.as_str();
        let install = ctx.as_service_user("rbenv", ["install", "--skip-existing", version]);
        step_streaming(ctx.exec, "rbenv install", install).await?;
        step_streaming(
            ctx.exec,
            "gem install bundler",
            ctx.as_service_user("gem", ["install", "bundler", "--no-document"]),
        )
        .await?;
    }
    Ok(())
}

fn shallow_clone<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
    repo: &str,
    dest: &str,
) -> Invocation {
    ctx.as_service_user("git", ["clone", "--depth", "1", repo, dest])
}

fn apt<I, S>(args: I) -> Invocation
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Invocation::new("apt-get", args).env("DEBIAN_FRONTEND", "noninteractive")
}

fn ruby_dir<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> PathBuf {
    let config = &ctx.deployment.config;
    config
        .home_dir()
        .join(".rbenv/versions")
        .join(&config.app.ruby_version)
}

async fn user_exists<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    let user = ctx.deployment.config.app.user.as_str();
    probe(ctx.exec, Invocation::new("id", ["-u", user])).await
}

/// Packages from the configured list that dpkg does not report installed.
async fn missing_packages<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<Vec<String>, PhaseError> {
    let wanted = ctx.deployment.config.apt_packages();
    let mut args = vec!["-W".to_owned(), "-f=${Package} ${Status}\\n".to_owned()];
    args.extend(wanted.iter().cloned());

    // dpkg-query exits non-zero when any name is unknown to it.
    let output = match ctx.exec.exec(&Invocation::new("dpkg-query", args)).await {
        Ok(out) => out,
        Err(ExecError::CommandFailed { .. }) => return Ok(wanted),
        Err(e) => {
            return Err(PhaseError::Step {
                step: "dpkg-query",
                source: e,
            });
        }
    };

    let installed = installed_packages(&output);
    Ok(wanted
        .into_iter()
        .filter(|p| !installed.contains(p.as_str()))
        .collect())
}

pub(crate) fn installed_packages(dpkg_output: &str) -> HashSet<&str> {
    dpkg_output
        .lines()
        .filter(|line| line.ends_with("install ok installed"))
        .filter_map(|line| line.split_whitespace().next())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installed_packages_ignores_removed_and_half_installed() {
        let out = "git install ok installed\n\
                   caddy deinstall ok config-files\n\
                   cron install ok half-installed\n\
                   curl install ok installed\n";
        let installed = installed_packages(out);
        assert!(installed.contains("git"));
        assert!(installed.contains("curl"));
        assert!(!installed.contains("caddy"));
        assert!(!installed.contains("cron"));
    }
}
