use std::path::PathBuf;

use hoist_core::Deployment;

use crate::artifact::{Artifact, Owner, shell_quote};

/// Renders the `/etc/cron.d` entry for the cache janitor.
///
/// Runs every minute as the service account and deletes cached pages older
/// than `cache.ttl_minutes`. `find -mmin +N` matches files whose age,
/// rounded up to whole minutes, exceeds N. Deletion errors (files removed by
/// the application between listing and unlinking) are discarded.
pub fn cache_janitor(d: &Deployment) -> Artifact {
    let contents = format!(
        "# Generated by hoist; rewritten on every run.\n\
         SHELL=/bin/sh\n\
         PATH=/usr/sbin:/usr/bin:/sbin:/bin\n\
         * * * * * {user} find {dir} -type f -mmin +{ttl} -delete 2>/dev/null || true\n",
        user = d.config.app.user,
        dir = cron_escape(&shell_quote(&d.config.cache_dir().display().to_string())),
        ttl = d.config.cache.ttl_minutes,
    );

    Artifact::new(cron_path(d), contents, 0o644, Owner::Root)
}

/// cron turns an unescaped `%` into a newline, even inside shell quotes.
fn cron_escape(command: &str) -> String {
    command.replace('%', r"\%")
}

/// cron.d ignores files with dots in their names.
fn cron_path(d: &Deployment) -> PathBuf {
    PathBuf::from("/etc/cron.d").join(format!("{}-cache-janitor", d.config.app.name))
}
