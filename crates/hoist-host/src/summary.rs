use std::fmt;
use std::path::PathBuf;

use hoist_core::Deployment;
use secrecy::{ExposeSecret, SecretString};

/// Final report of a successful run.
///
/// The only place secrets are surfaced in full; `Debug` redacts them.
pub struct Summary {
    pub url: String,
    pub admin_username: String,
    admin_password: SecretString,
    master_key: SecretString,
    pub default_password: bool,
    pub secrets_path: PathBuf,
    pub app_dir: PathBuf,
    pub service: String,
}

impl Summary {
    pub fn new(d: &Deployment) -> Self {
        Self {
            url: d.site.host.url(),
            admin_username: d.admin.username.clone(),
            admin_password: d.admin.password.clone(),
            master_key: d.secrets.master_key.clone(),
            default_password: d.admin.default_password,
            secrets_path: d.config.secrets_path(),
            app_dir: d.app_dir().to_path_buf(),
            service: d.app_service().unit_name(),
        }
    }

    /// Plain-text summary including credentials.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Site:            {}", self.url),
            format!("Admin username:  {}", self.admin_username),
            format!("Admin password:  {}", self.admin_password.expose_secret()),
            format!("Master key:      {}", self.master_key.expose_secret()),
            format!("Secrets file:    {}", self.secrets_path.display()),
            String::new(),
            "Next steps:".to_owned(),
        ];
        if self.default_password {
            lines.push(
                "  - The admin password is the documented default: \
                 log in and change it immediately."
                    .to_owned(),
            );
        } else {
            lines.push("  - Log in and change the admin password.".to_owned());
        }
        lines.push(
            "  - Store the master key somewhere safe; it decrypts the app credentials.".to_owned(),
        );
        lines.push(format!(
            "  - Follow logs with: journalctl -u {} -f",
            self.service
        ));
        lines.push(format!(
            "  - Rerun hoist after editing anything under {}; completed phases are skipped.",
            self.app_dir.display()
        ));
        lines.join("\n")
    }
}

impl fmt::Debug for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summary")
            .field("url", &self.url)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("master_key", &"[REDACTED]")
            .field("default_password", &self.default_password)
            .finish()
    }
}
