//! Core types and configuration for hoist.
//!
//! This crate defines the `hoist.toml` schema ([`HoistConfig`]), per-run
//! input resolution ([`Resolver`]), host identity and the TLS branch
//! ([`HostIdentity`]), the persisted secret store ([`SecretStore`]), and the
//! immutable plan every phase reads from ([`Deployment`]).

pub mod config;
pub mod deployment;
pub mod error;
pub mod host;
pub mod secrets;
pub mod variables;

pub use config::{
    AppConfig, CONFIG_FILE_NAME, CacheConfig, DatabaseConfig, HoistConfig, PackagesConfig,
    ProxyConfig, StateConfig,
};
pub use deployment::{
    AdminAccount, DEFAULT_ADMIN_PASSWORD, Deployment, EnvValue, Hardening, RestartPolicy,
    ServiceDescriptor, SiteSettings, SmtpSettings, UnitSource,
};
pub use error::{Error, Result};
pub use host::{HostIdentity, SslFlags, TlsMode};
pub use secrets::{SecretStore, Secrets, SecretsOrigin};
pub use variables::{
    EnvSource, Inputs, NoPrompt, Origin, Prompter, Resolver, TerminalPrompter, VARIABLES, Variable,
    VariableSource,
};
