mod janitor;
mod plan;
mod render;
mod run;

use std::path::PathBuf;

use hoist_core::{
    Deployment, EnvSource, HoistConfig, Inputs, NoPrompt, Resolver, Secrets, TerminalPrompter,
    TlsMode, variables,
};
use secrecy::SecretString;

pub use janitor::janitor;
pub use plan::plan;
pub use render::render;
pub use run::run;

/// Where configuration and per-run inputs come from.
#[derive(clap::Args)]
pub struct InputArgs {
    /// Path to hoist.toml (defaults apply when it does not exist)
    #[arg(long, default_value = hoist_core::CONFIG_FILE_NAME)]
    pub config: PathBuf,
    /// Read inputs from a dotenv file; the process environment wins
    #[arg(long)]
    pub env_file: Option<PathBuf>,
    /// Fail on missing inputs instead of prompting
    #[arg(long)]
    pub no_prompt: bool,
}

impl InputArgs {
    pub(crate) fn load_config(&self) -> anyhow::Result<HoistConfig> {
        Ok(HoistConfig::load(&self.config)?)
    }

    /// Resolve every input once, before any host work starts.
    pub(crate) fn resolve(&self) -> anyhow::Result<Inputs> {
        let source = match &self.env_file {
            Some(path) => EnvSource::with_env_file(path)?,
            None => EnvSource::new(),
        };
        let resolver = Resolver::default();
        let inputs = if self.no_prompt {
            resolver.resolve(&source, &mut NoPrompt)?
        } else {
            resolver.resolve(&source, &mut TerminalPrompter)?
        };
        tracing::debug!(?inputs, "inputs resolved");
        Ok(inputs)
    }
}

/// Plan built from secrets held in memory only.
///
/// A stored secret file is read when present; nothing is written.
pub(crate) fn dry_deployment(
    config: HoistConfig,
    inputs: &Inputs,
    stored: Option<Secrets>,
) -> anyhow::Result<Deployment> {
    let mut secrets = stored.unwrap_or_else(Secrets::generate);
    if let Some(password) = inputs.get(variables::DB_PASSWORD) {
        secrets.database_password = SecretString::from(password.to_owned());
    }
    Ok(Deployment::assemble(config, inputs, secrets)?)
}

pub(crate) fn tls_label(mode: TlsMode) -> &'static str {
    match mode {
        TlsMode::Acme => "TLS via ACME",
        TlsMode::Plaintext => "plain HTTP",
    }
}
