//! Provisioning phases.
//!
//! Each phase pairs an idempotency predicate (`is_satisfied`) with an
//! action (`apply`). Predicates only read host state; actions must be safe
//! to repeat, since a failed predicate evaluation counts as "not done".

mod application;
mod build;
mod database;
mod janitor;
mod packages;
mod services;

use std::fmt;

use hoist_core::Deployment;
use hoist_render::{Artifact, Owner};

use crate::error::{ExecError, PhaseError};
use crate::executor::{CommandExecutor, Invocation};
use crate::fs::HostFs;

/// Phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Packages,
    Database,
    Application,
    Build,
    Services,
    CacheJanitor,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Packages,
        Phase::Database,
        Phase::Application,
        Phase::Build,
        Phase::Services,
        Phase::CacheJanitor,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Phase::Packages => "packages",
            Phase::Database => "database",
            Phase::Application => "application",
            Phase::Build => "build",
            Phase::Services => "services",
            Phase::CacheJanitor => "cache-janitor",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Phase::Packages => "Install OS packages and Ruby",
            Phase::Database => "Bootstrap database and credential",
            Phase::Application => "Clone and configure the application",
            Phase::Build => "Prepare database and precompile assets",
            Phase::Services => "Install application and proxy services",
            Phase::CacheJanitor => "Register the cache janitor",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Everything a phase may touch.
pub struct PhaseContext<'a, E: CommandExecutor> {
    pub exec: &'a E,
    pub fs: &'a HostFs,
    pub deployment: &'a Deployment,
}

impl<E: CommandExecutor> PhaseContext<'_, E> {
    /// A command run as the service account from its home directory, with
    /// rbenv shims on `PATH`.
    pub(crate) fn as_service_user<I, S>(&self, program: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let config = &self.deployment.config;
        let home = config.home_dir();
        Invocation::new(program, args)
            .as_user(&config.app.user)
            .in_dir(home.clone())
            .env("HOME", &home.display().to_string())
            .env("PATH", &self.deployment.ruby_path())
            .env("RBENV_VERSION", &config.app.ruby_version)
    }

    /// Like [`as_service_user`](Self::as_service_user) but inside the
    /// application checkout.
    pub(crate) fn in_app<I, S>(&self, program: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.as_service_user(program, args)
            .in_dir(self.deployment.app_dir().to_path_buf())
    }

    /// `bin/rails <args>` with the generated environment file loaded.
    pub(crate) fn rails<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let env_file = self.deployment.env_file_path().display().to_string();
        let mut argv = vec![
            "-c".to_owned(),
            r#"set -a; . "$0"; set +a; exec bin/rails "$@""#.to_owned(),
            env_file,
        ];
        argv.extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self.in_app("bash", argv)
    }

    /// Write an artifact and hand it to its owner.
    pub(crate) async fn install(&self, artifact: &Artifact) -> Result<(), PhaseError> {
        let written = self.fs.write(artifact)?;
        if let Owner::User(user) = &artifact.owner {
            let path = written.display().to_string();
            let owner = format!("{user}:{user}");
            let chown = Invocation::new("chown", [owner.as_str(), path.as_str()]);
            step(self.exec, "chown", chown).await?;
        }
        tracing::info!(path = %artifact.path.display(), "installed");
        Ok(())
    }

    /// True while the application has not been restarted since its
    /// runtime configuration last changed.
    pub(crate) fn restart_pending(&self) -> bool {
        self.fs.exists(&self.deployment.config.restart_marker_path())
    }

    /// Record that the running application holds stale configuration.
    ///
    /// The marker outlives the process, so a run that stops before the
    /// services phase still restarts the application next time.
    pub(crate) fn request_restart(&self) -> Result<(), PhaseError> {
        let marker = Artifact::new(
            self.deployment.config.restart_marker_path(),
            String::new(),
            0o600,
            Owner::Root,
        );
        self.fs.write(&marker)?;
        tracing::info!(path = %marker.path.display(), "application restart pending");
        Ok(())
    }

    pub(crate) fn clear_restart(&self) -> Result<(), PhaseError> {
        self.fs.remove(&self.deployment.config.restart_marker_path())?;
        Ok(())
    }
}

/// Evaluate a phase's idempotency predicate.
pub(crate) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
    phase: Phase,
) -> Result<bool, PhaseError> {
    match phase {
        Phase::Packages => packages::is_satisfied(ctx).await,
        Phase::Database => database::is_satisfied(ctx).await,
        Phase::Application => application::is_satisfied(ctx).await,
        Phase::Build => build::is_satisfied(ctx).await,
        Phase::Services => services::is_satisfied(ctx).await,
        Phase::CacheJanitor => janitor::is_satisfied(ctx).await,
    }
}

/// Run a phase's action.
pub(crate) async fn apply<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
    phase: Phase,
) -> Result<(), PhaseError> {
    match phase {
        Phase::Packages => packages::apply(ctx).await,
        Phase::Database => database::apply(ctx).await,
        Phase::Application => application::apply(ctx).await,
        Phase::Build => build::apply(ctx).await,
        Phase::Services => services::apply(ctx).await,
        Phase::CacheJanitor => janitor::apply(ctx).await,
    }
}

/// Run a command whose exit status answers a yes/no question.
///
/// A non-zero exit is "no"; failing to run the command at all is an error.
pub(crate) async fn probe<E: CommandExecutor>(
    exec: &E,
    cmd: Invocation,
) -> Result<bool, PhaseError> {
    match exec.exec(&cmd).await {
        Ok(_) => Ok(true),
        Err(ExecError::CommandFailed { .. }) => Ok(false),
        Err(e) => Err(PhaseError::Step {
            step: "probe",
            source: e,
        }),
    }
}

pub(crate) async fn step<E: CommandExecutor>(
    exec: &E,
    step: &'static str,
    cmd: Invocation,
) -> Result<String, PhaseError> {
    exec.exec(&cmd)
        .await
        .map_err(|e| PhaseError::Step { step, source: e })
}

pub(crate) async fn step_streaming<E: CommandExecutor>(
    exec: &E,
    step: &'static str,
    cmd: Invocation,
) -> Result<(), PhaseError> {
    tracing::info!(command = %cmd, "{step}");
    exec.exec_streaming(&cmd)
        .await
        .map_err(|e| PhaseError::Step { step, source: e })
}
