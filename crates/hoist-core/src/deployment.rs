use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::config::HoistConfig;
use crate::host::{HostIdentity, SslFlags, TlsMode};
use crate::secrets::Secrets;
use crate::variables::{self, Inputs};

/// Password given to the first administrator when `ADMIN_PASSWORD` is unset.
/// Publicly known; the run summary tells the operator to change it.
pub const DEFAULT_ADMIN_PASSWORD: &str = "test";

/// Everything a provisioning run needs, assembled once before any phase.
///
/// Phases and renderers take `&Deployment`; nothing in it changes during a run.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub config: HoistConfig,
    pub site: SiteSettings,
    pub admin: AdminAccount,
    pub smtp: SmtpSettings,
    pub repo_url: String,
    pub acme_email: String,
    pub secrets: Secrets,
}

/// Site identity regenerated wholesale into the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub host: HostIdentity,
    pub name: String,
    pub ssl: SslFlags,
}

#[derive(Clone)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    /// True when the documented default password is in use
    pub default_password: bool,
}

impl fmt::Debug for AdminAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("default_password", &self.default_password)
            .finish()
    }
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Deployment {
    pub fn assemble(config: HoistConfig, inputs: &Inputs, secrets: Secrets) -> crate::Result<Self> {
        let host = HostIdentity::parse(inputs.required(variables::DOMAIN)?)?;
        let ssl = SslFlags::for_mode(host.tls());

        let site = SiteSettings {
            name: inputs.required(variables::SITE_NAME)?.to_owned(),
            host,
            ssl,
        };

        let mail_domain = match &site.host {
            HostIdentity::Domain(d) => d.clone(),
            HostIdentity::Address(_) => "localhost".to_owned(),
        };

        let admin_username = inputs.required(variables::ADMIN_USERNAME)?.to_owned();
        if !admin_username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(crate::Error::InvalidInput {
                key: variables::ADMIN_USERNAME,
                reason: "only letters, digits, '_' and '-' are allowed".to_owned(),
            });
        }

        let admin = AdminAccount {
            email: inputs
                .get(variables::ADMIN_EMAIL)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("{admin_username}@{mail_domain}")),
            password: SecretString::from(
                inputs
                    .get(variables::ADMIN_PASSWORD)
                    .unwrap_or(DEFAULT_ADMIN_PASSWORD)
                    .to_owned(),
            ),
            default_password: inputs.get(variables::ADMIN_PASSWORD).is_none(),
            username: admin_username,
        };

        let port_raw = inputs.required(variables::SMTP_PORT)?;
        let smtp = SmtpSettings {
            host: inputs.required(variables::SMTP_HOST)?.to_owned(),
            port: port_raw.parse().map_err(|_| crate::Error::InvalidInput {
                key: variables::SMTP_PORT,
                reason: format!("'{port_raw}' is not a port number"),
            })?,
            username: inputs.get(variables::SMTP_USERNAME).map(str::to_owned),
            password: inputs
                .get(variables::SMTP_PASSWORD)
                .map(|p| SecretString::from(p.to_owned())),
        };

        let acme_email = inputs
            .get(variables::ACME_EMAIL)
            .map(str::to_owned)
            .unwrap_or_else(|| admin.email.clone());

        Ok(Self {
            repo_url: inputs.required(variables::REPO_URL)?.to_owned(),
            config,
            site,
            admin,
            smtp,
            acme_email,
            secrets,
        })
    }

    pub fn tls(&self) -> TlsMode {
        self.site.host.tls()
    }

    pub fn app_dir(&self) -> &std::path::Path {
        &self.config.app.dir
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.config.app.dir.join(".env.production")
    }

    /// `PATH` that resolves rbenv shims before system binaries.
    pub fn ruby_path(&self) -> String {
        let home = self.config.home_dir();
        format!(
            "{shims}:{bin}:/usr/local/bin:/usr/bin:/bin",
            shims = home.join(".rbenv/shims").display(),
            bin = home.join(".rbenv/bin").display(),
        )
    }

    /// Descriptor of the supervised application process.
    pub fn app_service(&self) -> ServiceDescriptor {
        let app = &self.config.app;
        let home = self.config.home_dir();
        ServiceDescriptor {
            name: app.name.clone(),
            description: format!("{} Rails application", self.site.name),
            unit: UnitSource::Generated,
            exec_start: format!(
                "{} exec puma --bind tcp://127.0.0.1:{} --environment {}",
                home.join(".rbenv/shims/bundle").display(),
                app.port,
                app.rails_env,
            ),
            working_dir: app.dir.clone(),
            environment_file: Some(self.env_file_path()),
            environment: vec![
                ("PATH".to_owned(), self.ruby_path()),
                ("RBENV_VERSION".to_owned(), app.ruby_version.clone()),
            ],
            user: app.user.clone(),
            after: vec![
                "network.target".to_owned(),
                format!("{}.service", self.config.database.service),
            ],
            requires: vec![format!("{}.service", self.config.database.service)],
            restart: RestartPolicy::OnFailure { delay_secs: 5 },
            hardening: Hardening::default(),
        }
    }

    /// Descriptor of the reverse proxy; its unit ships with the package.
    pub fn proxy_service(&self) -> ServiceDescriptor {
        ServiceDescriptor {
            name: "caddy".to_owned(),
            description: "Caddy reverse proxy".to_owned(),
            unit: UnitSource::Packaged,
            exec_start: format!(
                "/usr/bin/caddy run --environ --config {}",
                self.config.proxy.caddyfile.display()
            ),
            working_dir: PathBuf::from("/"),
            environment_file: None,
            environment: Vec::new(),
            user: "caddy".to_owned(),
            after: vec![format!("{}.service", self.config.app.name)],
            requires: Vec::new(),
            restart: RestartPolicy::OnFailure { delay_secs: 5 },
            hardening: Hardening::default(),
        }
    }

    /// Environment-file entries, in output order.
    ///
    /// Secrets stay wrapped; only the renderer exposes them.
    pub fn runtime_env(&self) -> Vec<(&'static str, EnvValue)> {
        let mut env = vec![
            ("RAILS_ENV", EnvValue::plain(&self.config.app.rails_env)),
            (
                "RAILS_MASTER_KEY",
                EnvValue::Secret(self.secrets.master_key.clone()),
            ),
            (
                "SECRET_KEY_BASE",
                EnvValue::Secret(self.secrets.secret_key_base.clone()),
            ),
            ("RAILS_SERVE_STATIC_FILES", EnvValue::plain("true")),
            ("SOLID_QUEUE_IN_PUMA", EnvValue::plain("true")),
            ("PORT", EnvValue::plain(&self.config.app.port.to_string())),
            ("SMTP_HOST", EnvValue::plain(&self.smtp.host)),
            ("SMTP_PORT", EnvValue::plain(&self.smtp.port.to_string())),
        ];
        if let Some(user) = &self.smtp.username {
            env.push(("SMTP_USERNAME", EnvValue::plain(user)));
        }
        if let Some(password) = &self.smtp.password {
            env.push(("SMTP_PASSWORD", EnvValue::Secret(password.clone())));
        }
        env.push(("BANNED_DOMAINS_ADMIN", EnvValue::plain(&self.admin.username)));
        env
    }
}

#[derive(Clone)]
pub enum EnvValue {
    Plain(String),
    Secret(SecretString),
}

impl EnvValue {
    fn plain(v: &str) -> Self {
        Self::Plain(v.to_owned())
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Secret(_))
    }

    /// Raw value for writing into a root-owned file.
    pub fn expose(&self) -> &str {
        match self {
            Self::Plain(v) => v,
            Self::Secret(s) => s.expose_secret(),
        }
    }
}

impl fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(v) => write!(f, "{v:?}"),
            Self::Secret(_) => f.write_str("[REDACTED]"),
        }
    }
}

/// A supervised long-running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub description: String,
    pub unit: UnitSource,
    pub exec_start: String,
    pub working_dir: PathBuf,
    pub environment_file: Option<PathBuf>,
    pub environment: Vec<(String, String)>,
    pub user: String,
    pub after: Vec<String>,
    pub requires: Vec<String>,
    pub restart: RestartPolicy,
    pub hardening: Hardening,
}

impl ServiceDescriptor {
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.name)
    }

    pub fn unit_path(&self) -> PathBuf {
        PathBuf::from("/etc/systemd/system").join(self.unit_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSource {
    /// Unit file written by hoist
    Generated,
    /// Unit file installed by the OS package
    Packaged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    OnFailure { delay_secs: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hardening {
    pub no_new_privileges: bool,
    pub private_tmp: bool,
}

impl Default for Hardening {
    fn default() -> Self {
        Self {
            no_new_privileges: true,
            private_tmp: true,
        }
    }
}
