use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "hoist.toml";

/// hoist.toml configuration
///
/// Holds the host-independent tunables of a provisioning run. Per-run inputs
/// (domain, credentials) are not stored here; they come from the
/// [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoistConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Service name, also used for the systemd unit and cron file
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Unprivileged runtime identity
    #[serde(default = "default_app_user")]
    pub user: String,
    /// Checkout directory
    #[serde(default = "default_app_dir")]
    pub dir: PathBuf,
    /// Local port the application server binds
    #[serde(default = "default_app_port")]
    pub port: u16,
    /// Ruby version installed through rbenv
    #[serde(default = "default_ruby_version")]
    pub ruby_version: String,
    /// Git branch checked out on first clone
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_rails_env")]
    pub rails_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Least-privilege account scoped to `name`
    #[serde(default = "default_app_user")]
    pub user: String,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_collation")]
    pub collation: String,
    #[serde(default = "default_pool")]
    pub pool: u32,
    /// systemd unit of the database server
    #[serde(default = "default_db_service")]
    pub service: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// OS packages installed via apt-get
    #[serde(default = "default_apt_packages")]
    pub apt: Vec<String>,
    /// Additional packages appended to `apt`
    #[serde(default)]
    pub extra: Vec<String>,
    #[serde(default = "default_rbenv_repo")]
    pub rbenv_repo: String,
    #[serde(default = "default_ruby_build_repo")]
    pub ruby_build_repo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Page cache directory (defaults to `<app.dir>/public/cache`)
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Maximum artifact age before the janitor deletes it
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_caddyfile")]
    pub caddyfile: PathBuf,
    #[serde(default = "default_access_log")]
    pub access_log: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding the persisted secret store
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            user: default_app_user(),
            dir: default_app_dir(),
            port: default_app_port(),
            ruby_version: default_ruby_version(),
            branch: default_branch(),
            rails_env: default_rails_env(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            user: default_app_user(),
            host: default_db_host(),
            port: default_db_port(),
            encoding: default_encoding(),
            collation: default_collation(),
            pool: default_pool(),
            service: default_db_service(),
        }
    }
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            apt: default_apt_packages(),
            extra: Vec::new(),
            rbenv_repo: default_rbenv_repo(),
            ruby_build_repo: default_ruby_build_repo(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            caddyfile: default_caddyfile(),
            access_log: default_access_log(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

impl HoistConfig {
    /// Load from the given file, or return defaults if it does not exist.
    pub fn load(config_path: &Path) -> crate::Result<Self> {
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.to_path_buf(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that end up unquoted in SQL, unit files, or cron lines.
    pub fn validate(&self) -> crate::Result<()> {
        check_identifier("app.name", &self.app.name)?;
        check_identifier("app.user", &self.app.user)?;
        check_identifier("database.name", &self.database.name)?;
        check_identifier("database.user", &self.database.user)?;
        check_identifier("database.encoding", &self.database.encoding)?;
        check_identifier("database.collation", &self.database.collation)?;

        if !self.app.dir.is_absolute() {
            return Err(crate::Error::InvalidSetting {
                key: "app.dir",
                reason: "must be an absolute path".to_owned(),
            });
        }
        if !is_loopback(&self.database.host) {
            return Err(crate::Error::InvalidSetting {
                key: "database.host",
                reason: format!(
                    "`{}` is not loopback; the schema is created over the local socket",
                    self.database.host
                ),
            });
        }
        if self.cache.ttl_minutes == 0 {
            return Err(crate::Error::InvalidSetting {
                key: "cache.ttl_minutes",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// All apt packages, base list followed by extras, without duplicates.
    pub fn apt_packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for pkg in self.packages.apt.iter().chain(&self.packages.extra) {
            if !packages.contains(pkg) {
                packages.push(pkg.clone());
            }
        }
        packages
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| self.app.dir.join("public").join("cache"))
    }

    pub fn home_dir(&self) -> PathBuf {
        PathBuf::from("/home").join(&self.app.user)
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.state
            .dir
            .join(format!("{}.secrets.toml", self.app.name))
    }

    /// Present while the application has configuration it has not yet
    /// been restarted with.
    pub fn restart_marker_path(&self) -> PathBuf {
        self.state
            .dir
            .join(format!("{}.restart-pending", self.app.name))
    }
}

/// Hosts on which the database server is the local one.
fn is_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

fn check_identifier(key: &'static str, value: &str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(crate::Error::InvalidSetting {
            key,
            reason: "must not be empty".to_owned(),
        });
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(crate::Error::InvalidSetting {
            key,
            reason: format!("contains '{c}'; only ASCII letters, digits and '_' are allowed"),
        });
    }
    Ok(())
}

fn default_app_name() -> String {
    "lobsters".to_owned()
}

fn default_app_user() -> String {
    "lobsters".to_owned()
}

fn default_app_dir() -> PathBuf {
    PathBuf::from("/srv/lobsters")
}

fn default_app_port() -> u16 {
    3000
}

fn default_ruby_version() -> String {
    "3.4.2".to_owned()
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_rails_env() -> String {
    "production".to_owned()
}

fn default_db_host() -> String {
    "localhost".to_owned()
}

fn default_db_port() -> u16 {
    3306
}

fn default_encoding() -> String {
    "utf8mb4".to_owned()
}

fn default_collation() -> String {
    "utf8mb4_unicode_ci".to_owned()
}

fn default_pool() -> u32 {
    5
}

fn default_db_service() -> String {
    "mariadb".to_owned()
}

fn default_apt_packages() -> Vec<String> {
    [
        "build-essential",
        "git",
        "curl",
        "pkg-config",
        "libssl-dev",
        "libreadline-dev",
        "zlib1g-dev",
        "libyaml-dev",
        "libffi-dev",
        "mariadb-server",
        "libmariadb-dev",
        "sqlite3",
        "libsqlite3-dev",
        "caddy",
        "cron",
    ]
    .iter()
    .map(|s| (*s).to_owned())
    .collect()
}

fn default_rbenv_repo() -> String {
    "https://github.com/rbenv/rbenv.git".to_owned()
}

fn default_ruby_build_repo() -> String {
    "https://github.com/rbenv/ruby-build.git".to_owned()
}

fn default_ttl_minutes() -> u32 {
    5
}

fn default_caddyfile() -> PathBuf {
    PathBuf::from("/etc/caddy/Caddyfile")
}

fn default_access_log() -> PathBuf {
    PathBuf::from("/var/log/caddy/lobsters.log")
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("/etc/hoist")
}
