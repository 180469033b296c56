use std::path::PathBuf;

use hoist_core::HoistConfig;
use tempfile::TempDir;

#[test]
fn load_returns_defaults_when_no_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = HoistConfig::load(&tmp.path().join("hoist.toml")).unwrap();

    assert_eq!(config.app.name, "lobsters");
    assert_eq!(config.app.user, "lobsters");
    assert_eq!(config.app.dir, PathBuf::from("/srv/lobsters"));
    assert_eq!(config.app.port, 3000);
    assert_eq!(config.app.rails_env, "production");
    assert_eq!(config.database.name, "lobsters");
    assert_eq!(config.database.encoding, "utf8mb4");
    assert_eq!(config.database.collation, "utf8mb4_unicode_ci");
    assert_eq!(config.database.service, "mariadb");
    assert_eq!(config.cache.ttl_minutes, 5);
    assert_eq!(config.proxy.caddyfile, PathBuf::from("/etc/caddy/Caddyfile"));
    assert!(config.packages.apt.iter().any(|p| p == "caddy"));
    assert!(config.packages.apt.iter().any(|p| p == "mariadb-server"));
}

#[test]
fn load_parses_full_config() {
    let tmp = TempDir::new().unwrap();
    let toml = r#"
[app]
name = "news"
user = "news"
dir = "/opt/news"
port = 4000
ruby_version = "3.3.6"
branch = "stable"

[database]
name = "news_production"
user = "news_app"
port = 3307
pool = 10

[packages]
extra = ["htop"]

[cache]
dir = "/var/cache/news"
ttl_minutes = 10

[state]
dir = "/var/lib/hoist"
"#;
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, toml).unwrap();

    let config = HoistConfig::load(&path).unwrap();

    assert_eq!(config.app.name, "news");
    assert_eq!(config.app.dir, PathBuf::from("/opt/news"));
    assert_eq!(config.app.port, 4000);
    assert_eq!(config.app.ruby_version, "3.3.6");
    assert_eq!(config.app.branch, "stable");
    assert_eq!(config.database.name, "news_production");
    assert_eq!(config.database.user, "news_app");
    assert_eq!(config.database.port, 3307);
    assert_eq!(config.database.pool, 10);
    assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/news"));
    assert_eq!(config.cache.ttl_minutes, 10);
    assert_eq!(
        config.secrets_path(),
        PathBuf::from("/var/lib/hoist/news.secrets.toml")
    );
    assert_eq!(
        config.restart_marker_path(),
        PathBuf::from("/var/lib/hoist/news.restart-pending")
    );
    assert_eq!(config.home_dir(), PathBuf::from("/home/news"));
    assert!(config.apt_packages().ends_with(&["htop".to_owned()]));
}

#[test]
fn load_partial_config_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "[app]\nport = 8080\n").unwrap();

    let config = HoistConfig::load(&path).unwrap();

    assert_eq!(config.app.port, 8080);
    assert_eq!(config.app.name, "lobsters");
    assert_eq!(config.database.host, "localhost");
    assert_eq!(
        config.cache_dir(),
        PathBuf::from("/srv/lobsters/public/cache")
    );
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "not valid {{{{ toml").unwrap();

    let err = HoistConfig::load(&path).unwrap_err().to_string();
    assert!(err.contains("parse"));
}

#[test]
fn load_empty_config_returns_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "").unwrap();

    let config = HoistConfig::load(&path).unwrap();
    assert_eq!(config.app.name, "lobsters");
}

#[test]
fn rejects_database_name_with_quote() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "[database]\nname = \"lob`sters\"\n").unwrap();

    let err = HoistConfig::load(&path).unwrap_err().to_string();
    assert!(err.contains("database.name"), "{err}");
}

#[test]
fn rejects_relative_app_dir() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "[app]\ndir = \"srv/lobsters\"\n").unwrap();

    let err = HoistConfig::load(&path).unwrap_err().to_string();
    assert!(err.contains("app.dir"), "{err}");
}

#[test]
fn rejects_zero_ttl() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "[cache]\nttl_minutes = 0\n").unwrap();

    assert!(HoistConfig::load(&path).is_err());
}

#[test]
fn rejects_remote_database_host() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.toml");
    std::fs::write(&path, "[database]\nhost = \"db.internal\"\n").unwrap();

    let err = HoistConfig::load(&path).unwrap_err().to_string();
    assert!(err.contains("database.host"), "{err}");
}

#[test]
fn accepts_loopback_database_hosts() {
    for host in ["localhost", "127.0.0.1", "::1"] {
        let mut config = HoistConfig::default();
        config.database.host = host.to_owned();
        assert!(config.validate().is_ok(), "{host}");
    }
}

#[test]
fn apt_packages_deduplicates_extras() {
    let mut config = HoistConfig::default();
    config.packages.extra = vec!["git".to_owned(), "htop".to_owned()];

    let packages = config.apt_packages();
    assert_eq!(packages.iter().filter(|p| *p == "git").count(), 1);
    assert_eq!(packages.last().map(String::as_str), Some("htop"));
}
