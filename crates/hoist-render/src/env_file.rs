use hoist_core::Deployment;

use crate::artifact::{Artifact, Owner, shell_quote};

/// Renders the runtime environment file read by systemd and by the build
/// commands. Readable only by the service account.
pub fn env_file(d: &Deployment) -> Artifact {
    let mut contents = String::from("# Generated by hoist; rewritten on every run.\n");
    for (key, value) in d.runtime_env() {
        contents.push_str(key);
        contents.push('=');
        contents.push_str(&shell_quote(value.expose()));
        contents.push('\n');
    }

    Artifact::new(
        d.env_file_path(),
        contents,
        0o600,
        Owner::User(d.config.app.user.clone()),
    )
}
