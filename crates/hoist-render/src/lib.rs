//! Configuration artifacts for a hoist run.
//!
//! Every renderer is a pure function of a [`Deployment`]: the same plan
//! always yields byte-identical files, which is what lets the host phases
//! compare on-disk content against a fresh render to decide whether work is
//! already done.
//!
//! | artifact                              | phase        | mode |
//! |---------------------------------------|--------------|------|
//! | `<app>/config/database.yml`           | application  | 0600 |
//! | `<app>/config/initializers/hoist_site.rb` | application | 0644 |
//! | `<app>/.env.production`               | application  | 0600 |
//! | `/etc/systemd/system/<app>.service`   | services     | 0644 |
//! | `/etc/caddy/Caddyfile`                | services     | 0644 |
//! | `/etc/cron.d/<app>-cache-janitor`     | cache janitor| 0644 |

pub mod artifact;
pub mod caddy;
pub mod cron;
pub mod database;
pub mod env_file;
pub mod site;
pub mod systemd;

use std::path::{Path, PathBuf};

pub use artifact::{Artifact, Owner};
use hoist_core::Deployment;

/// Files written by the application configurator.
pub fn application(d: &Deployment) -> Result<Vec<Artifact>, RenderError> {
    Ok(vec![
        database::database_yml(d)?,
        site::site_initializer(d),
        env_file::env_file(d),
    ])
}

/// Files written by the service installer.
pub fn services(d: &Deployment) -> Vec<Artifact> {
    vec![systemd::unit(&d.app_service()), caddy::caddyfile(d)]
}

/// Every artifact of a run, in phase order.
pub fn all(d: &Deployment) -> Result<Vec<Artifact>, RenderError> {
    let mut artifacts = application(d)?;
    artifacts.extend(services(d));
    artifacts.push(cron::cache_janitor(d));
    Ok(artifacts)
}

/// Write artifacts beneath `out_dir`, mirroring their host paths.
///
/// Used for reviewing a run without touching the host. Returns the written
/// paths.
pub fn write_tree(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let dest = out_dir.join(artifact.relative_path());
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RenderError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&dest, &artifact.contents).map_err(|e| RenderError::Write {
            path: dest.clone(),
            source: e,
        })?;
        set_mode(&dest, artifact.mode).map_err(|e| RenderError::Write {
            path: dest.clone(),
            source: e,
        })?;
        tracing::debug!(path = %dest.display(), "artifact written");
        written.push(dest);
    }
    Ok(written)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to serialize connection config")]
    Yaml { source: serde_yaml::Error },
    #[error("failed to create directory {path}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
