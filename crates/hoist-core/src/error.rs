use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    // ── Input resolution ──
    #[error("failed to read env file {path}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("{key} is required ({description}); set it in the environment or run interactively")]
    MissingInput {
        key: &'static str,
        description: &'static str,
    },

    #[error("{key} is required ({description}); an empty answer is not accepted")]
    EmptyInput {
        key: &'static str,
        description: &'static str,
    },

    #[error("failed to read {key} from the terminal")]
    Prompt {
        key: &'static str,
        source: std::io::Error,
    },

    #[error("invalid value for {key}: {reason}")]
    InvalidInput { key: &'static str, reason: String },

    // ── Secret store ──
    #[error("failed to read secret store {path}")]
    SecretsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse secret store {path}")]
    SecretsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to write secret store {path}")]
    SecretsWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode secret store")]
    SecretsEncode { source: toml::ser::Error },
}
