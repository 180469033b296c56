use std::path::PathBuf;

use hoist_render::RenderError;

use crate::phases::Phase;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to start `{program}` (is it installed?)")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("output of `{command}` is not valid UTF-8")]
    InvalidUtf8 {
        command: String,
        source: std::string::FromUtf8Error,
    },
    #[error("failed to write to stdin of `{command}`")]
    StdinWrite {
        command: String,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to set permissions on {path}")]
    Permissions {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove {path}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PhaseError {
    #[error("{step} failed")]
    Step {
        step: &'static str,
        source: ExecError,
    },
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("failed to render configuration")]
    Render {
        #[from]
        source: RenderError,
    },
    #[error("action finished but the completion check still fails")]
    Incomplete,
}

#[derive(Debug, thiserror::Error)]
#[error("phase `{phase}` failed")]
pub struct RunError {
    pub phase: Phase,
    pub source: PhaseError,
}

#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    #[error("hoist must run as root (current uid {uid}); retry with sudo")]
    NotRoot { uid: String },
    #[error("could not determine the current user")]
    Identity { source: ExecError },
    #[error("apt-get not found: hoist supports Debian and Ubuntu hosts only")]
    UnsupportedHost { source: ExecError },
}

#[derive(Debug, thiserror::Error)]
pub enum JanitorError {
    #[error("failed to read cache directory {path}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}
