use hoist_core::{EnvSource, SecretStore, SecretsOrigin, VariableSource};
use secrecy::ExposeSecret;
use tempfile::TempDir;

#[test]
fn first_load_creates_store() {
    let tmp = TempDir::new().unwrap();
    let store = SecretStore::new(tmp.path().join("state/lobsters.secrets.toml"));

    let (secrets, origin) = store.load_or_create(None).unwrap();

    assert_eq!(origin, SecretsOrigin::Created);
    assert!(store.path().exists());
    let content = std::fs::read_to_string(store.path()).unwrap();
    assert!(content.contains(secrets.master_key.expose_secret()));
}

#[cfg(unix)]
#[test]
fn store_is_root_only() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let store = SecretStore::new(tmp.path().join("s.toml"));
    store.load_or_create(None).unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn second_load_returns_same_secrets() {
    let tmp = TempDir::new().unwrap();
    let store = SecretStore::new(tmp.path().join("s.toml"));

    let (first, _) = store.load_or_create(None).unwrap();
    let (second, origin) = store.load_or_create(None).unwrap();

    assert_eq!(origin, SecretsOrigin::Loaded);
    assert_eq!(
        first.master_key.expose_secret(),
        second.master_key.expose_secret()
    );
    assert_eq!(
        first.database_password.expose_secret(),
        second.database_password.expose_secret()
    );
}

#[test]
fn supplied_database_password_is_used_and_persisted() {
    let tmp = TempDir::new().unwrap();
    let store = SecretStore::new(tmp.path().join("s.toml"));
    let (original, _) = store.load_or_create(None).unwrap();

    let (updated, origin) = store.load_or_create(Some("correct-horse")).unwrap();
    assert_eq!(origin, SecretsOrigin::Updated);
    assert_eq!(updated.database_password.expose_secret(), "correct-horse");
    assert_eq!(
        updated.master_key.expose_secret(),
        original.master_key.expose_secret()
    );

    let (reloaded, origin) = store.load_or_create(Some("correct-horse")).unwrap();
    assert_eq!(origin, SecretsOrigin::Loaded);
    assert_eq!(reloaded.database_password.expose_secret(), "correct-horse");
}

#[test]
fn corrupt_store_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.toml");
    std::fs::write(&path, "master_key = 1").unwrap();

    let err = SecretStore::new(&path).load_or_create(None).unwrap_err();
    assert!(err.to_string().contains("parse"));
}

#[test]
fn env_file_values_are_visible() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("hoist.env");
    std::fs::write(
        &path,
        "HOIST_TEST_ONLY_IN_FILE=from-file\nSITE_NAME_FOR_TEST=\"My Site\"\n",
    )
    .unwrap();

    let source = EnvSource::with_env_file(&path).unwrap();
    assert_eq!(
        source.get("HOIST_TEST_ONLY_IN_FILE").as_deref(),
        Some("from-file")
    );
    assert_eq!(source.get("SITE_NAME_FOR_TEST").as_deref(), Some("My Site"));
    assert_eq!(source.get("HOIST_TEST_NOT_ANYWHERE"), None);
}

#[test]
fn missing_env_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    assert!(EnvSource::with_env_file(&tmp.path().join("absent.env")).is_err());
}

#[test]
fn load_is_read_only() {
    let tmp = TempDir::new().unwrap();
    let store = SecretStore::new(tmp.path().join("lobsters.secrets.toml"));

    assert!(store.load().unwrap().is_none());
    assert!(!store.path().exists());

    let (created, _) = store.load_or_create(None).unwrap();
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(
        loaded.master_key.expose_secret(),
        created.master_key.expose_secret()
    );
}
