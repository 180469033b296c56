use std::fmt;
use std::path::{Path, PathBuf};

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Secrets generated once and reused by every later run on the host.
#[derive(Clone)]
pub struct Secrets {
    /// Rails credentials decryption key (`RAILS_MASTER_KEY`)
    pub master_key: SecretString,
    pub secret_key_base: SecretString,
    pub database_password: SecretString,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("master_key", &"[REDACTED]")
            .field("secret_key_base", &"[REDACTED]")
            .field("database_password", &"[REDACTED]")
            .finish()
    }
}

impl Secrets {
    /// Fresh random secrets; nothing is persisted.
    pub fn generate() -> Self {
        Self {
            master_key: random_hex(16),
            secret_key_base: random_hex(64),
            database_password: random_hex(24),
        }
    }

    fn from_stored(stored: StoredSecrets) -> Self {
        Self {
            master_key: SecretString::from(stored.master_key),
            secret_key_base: SecretString::from(stored.secret_key_base),
            database_password: SecretString::from(stored.database_password),
        }
    }

    fn to_stored(&self) -> StoredSecrets {
        StoredSecrets {
            master_key: self.master_key.expose_secret().to_owned(),
            secret_key_base: self.secret_key_base.expose_secret().to_owned(),
            database_password: self.database_password.expose_secret().to_owned(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredSecrets {
    master_key: String,
    secret_key_base: String,
    database_password: String,
}

/// How [`SecretStore::load_or_create`] obtained its secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsOrigin {
    Created,
    Loaded,
    /// Loaded, with the database password replaced by a supplied value
    Updated,
}

/// Root-only TOML file holding generated secrets between runs.
#[derive(Debug, Clone)]
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored secrets without creating anything.
    pub fn load(&self) -> crate::Result<Option<Secrets>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| crate::Error::SecretsRead {
            path: self.path.clone(),
            source: e,
        })?;
        let stored: StoredSecrets =
            toml::from_str(&content).map_err(|e| crate::Error::SecretsParse {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(Some(Secrets::from_stored(stored)))
    }

    /// Load the stored secrets, generating and persisting them on first use.
    ///
    /// A supplied database password replaces the stored one and is written
    /// back, so the credential and the connection config stay in step.
    pub fn load_or_create(
        &self,
        database_password: Option<&str>,
    ) -> crate::Result<(Secrets, SecretsOrigin)> {
        let (mut secrets, mut origin) = match self.load()? {
            Some(secrets) => (secrets, SecretsOrigin::Loaded),
            None => (Secrets::generate(), SecretsOrigin::Created),
        };

        let replaced = database_password
            .filter(|supplied| *supplied != secrets.database_password.expose_secret());
        if let Some(supplied) = replaced {
            secrets.database_password = SecretString::from(supplied.to_owned());
            if origin == SecretsOrigin::Loaded {
                origin = SecretsOrigin::Updated;
            }
        }

        if origin != SecretsOrigin::Loaded {
            self.persist(&secrets)?;
        }

        tracing::info!(path = %self.path.display(), ?origin, "secret store ready");
        Ok((secrets, origin))
    }

    fn persist(&self, secrets: &Secrets) -> crate::Result<()> {
        let content = toml::to_string(&secrets.to_stored())
            .map_err(|e| crate::Error::SecretsEncode { source: e })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::Error::SecretsWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        write_private(&self.path, &content).map_err(|e| crate::Error::SecretsWrite {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(content.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)
}

fn random_hex(bytes: usize) -> SecretString {
    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);
    SecretString::from(hex::encode(buf))
}
