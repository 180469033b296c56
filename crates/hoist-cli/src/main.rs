mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::InputArgs;

#[derive(Parser)]
#[command(name = "hoist", about = "Provision a single host to run the Lobsters Rails app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision this host: packages, database, application, services
    Run {
        #[command(flatten)]
        inputs: InputArgs,
    },
    /// Show which phases are already complete, without changing anything
    Plan {
        #[command(flatten)]
        inputs: InputArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write every generated file under DIR without touching the host
    Render {
        #[command(flatten)]
        inputs: InputArgs,
        /// Output directory (host paths are mirrored beneath it)
        #[arg(long)]
        out: PathBuf,
    },
    /// Delete cached pages older than the TTL, once
    Janitor {
        /// Path to hoist.toml
        #[arg(long, default_value = hoist_core::CONFIG_FILE_NAME)]
        config: PathBuf,
        /// Cache directory (default: from hoist.toml)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Maximum age in minutes (default: from hoist.toml)
        #[arg(long)]
        ttl_minutes: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { inputs } => commands::run(&inputs).await,
        Commands::Plan { inputs, json } => commands::plan(&inputs, json).await,
        Commands::Render { inputs, out } => commands::render(&inputs, &out),
        Commands::Janitor {
            config,
            dir,
            ttl_minutes,
        } => commands::janitor(&config, dir, ttl_minutes),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::fatal(&e);
            ExitCode::FAILURE
        }
    }
}
