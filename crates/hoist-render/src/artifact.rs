use std::fmt;
use std::path::{Path, PathBuf};

/// A file the provisioning run places on the host.
///
/// `Debug` omits the contents: several artifacts carry secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path on the host
    pub path: PathBuf,
    pub contents: String,
    /// Unix permission bits
    pub mode: u32,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Root,
    /// Owned by the given account and its primary group
    User(String),
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: String, mode: u32, owner: Owner) -> Self {
        Self {
            path: path.into(),
            contents,
            mode,
            owner,
        }
    }

    /// Path relative to the filesystem root, for placing under another root.
    pub fn relative_path(&self) -> &Path {
        self.path.strip_prefix("/").unwrap_or(&self.path)
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("path", &self.path)
            .field("mode", &format_args!("{:o}", self.mode))
            .field("owner", &self.owner)
            .field("bytes", &self.contents.len())
            .finish()
    }
}

/// Quote a value for `sh` and systemd `EnvironmentFile=` when it needs it.
pub(crate) fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-.,:/@+=%".contains(c));
    if safe {
        value.to_owned()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
