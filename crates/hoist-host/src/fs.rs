use std::path::{Path, PathBuf};

use hoist_render::Artifact;

use crate::error::FsError;

/// View of the host filesystem beneath a root.
///
/// Artifacts carry absolute host paths; `HostFs` maps them under `root`
/// (`/` on a real host, a scratch directory in tests).
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn system() -> Self {
        Self::new("/")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, host_path: &Path) -> PathBuf {
        self.root
            .join(host_path.strip_prefix("/").unwrap_or(host_path))
    }

    pub fn exists(&self, host_path: &Path) -> bool {
        self.resolve(host_path).exists()
    }

    /// True when `host_path` is a directory with at least one entry.
    pub fn has_entries(&self, host_path: &Path) -> bool {
        match std::fs::read_dir(self.resolve(host_path)) {
            Ok(mut entries) => entries.next().is_some(),
            Err(_) => false,
        }
    }

    /// True when the on-disk file already holds the artifact's contents
    /// and permission bits.
    pub fn is_current(&self, artifact: &Artifact) -> bool {
        let path = self.resolve(&artifact.path);
        match std::fs::read_to_string(&path) {
            Ok(existing) => {
                existing == artifact.contents && mode_of(&path) == Some(artifact.mode)
            }
            Err(_) => false,
        }
    }

    /// Write the artifact, creating parent directories, then apply its mode.
    pub fn write(&self, artifact: &Artifact) -> Result<PathBuf, FsError> {
        let dest = self.resolve(&artifact.path);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&dest, &artifact.contents).map_err(|e| FsError::Write {
            path: dest.clone(),
            source: e,
        })?;
        set_mode(&dest, artifact.mode).map_err(|e| FsError::Permissions {
            path: dest.clone(),
            source: e,
        })?;
        tracing::debug!(
            path = %dest.display(),
            mode = format_args!("{:o}", artifact.mode),
            "wrote"
        );
        Ok(dest)
    }

    /// Remove a file. Returns false when it was already gone.
    pub fn remove(&self, host_path: &Path) -> Result<bool, FsError> {
        let path = self.resolve(host_path);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FsError::Remove { path, source: e }),
        }
    }
}

#[cfg(unix)]
fn mode_of(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        // arch-lint: allow(no-silent-result-drop) reason="unreadable means not current"
        .ok()
        .map(|m| m.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_path: &Path) -> Option<u32> {
    None
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

#[cfg(test)]
mod tests {
    use super::*;
    use hoist_render::Owner;

    fn artifact(contents: &str, mode: u32) -> Artifact {
        Artifact::new("/etc/demo/app.conf", contents.to_owned(), mode, Owner::Root)
    }

    #[test]
    fn resolve_maps_absolute_paths_under_root() {
        let fs = HostFs::new("/tmp/scratch");
        assert_eq!(
            fs.resolve(Path::new("/etc/caddy/Caddyfile")),
            PathBuf::from("/tmp/scratch/etc/caddy/Caddyfile")
        );
        assert_eq!(
            HostFs::system().resolve(Path::new("/etc/hosts")),
            PathBuf::from("/etc/hosts")
        );
    }

    #[test]
    fn write_then_is_current() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = HostFs::new(tmp.path());
        let a = artifact("listen 80\n", 0o600);

        assert!(!fs.is_current(&a));
        let written = fs.write(&a).unwrap();
        assert!(written.starts_with(tmp.path()));
        assert!(fs.is_current(&a));
        assert!(!fs.is_current(&artifact("listen 81\n", 0o600)));
    }

    #[cfg(unix)]
    #[test]
    fn mode_drift_is_not_current() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = HostFs::new(tmp.path());
        fs.write(&artifact("x\n", 0o644)).unwrap();
        assert!(!fs.is_current(&artifact("x\n", 0o600)));
    }

    #[test]
    fn has_entries_requires_a_populated_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = HostFs::new(tmp.path());
        std::fs::create_dir_all(tmp.path().join("srv/assets")).unwrap();

        assert!(!fs.has_entries(Path::new("/srv/assets")));
        assert!(!fs.has_entries(Path::new("/srv/missing")));
        std::fs::write(tmp.path().join("srv/assets/app.css"), "").unwrap();
        assert!(fs.has_entries(Path::new("/srv/assets")));
    }

    #[test]
    fn remove_reports_whether_a_file_was_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        let fs = HostFs::new(tmp.path());
        let a = artifact("x\n", 0o600);
        fs.write(&a).unwrap();

        assert!(fs.remove(&a.path).unwrap());
        assert!(!fs.exists(&a.path));
        assert!(!fs.remove(&a.path).unwrap());
    }
}
