use colored::Colorize;
use hoist_core::SecretStore;
use hoist_host::{HostFs, Provisioner, RealExecutor};
use serde::Serialize;

use super::{InputArgs, dry_deployment, tls_label};

#[derive(Serialize)]
struct PlanReport {
    url: String,
    tls: &'static str,
    phases: Vec<PhaseState>,
}

#[derive(Serialize)]
struct PhaseState {
    id: &'static str,
    title: &'static str,
    complete: bool,
}

/// Evaluate every phase's completion check without acting.
pub async fn plan(args: &InputArgs, json: bool) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let inputs = args.resolve()?;
    let stored = SecretStore::new(config.secrets_path()).load()?;
    let deployment = dry_deployment(config, &inputs, stored)?;

    let fs = HostFs::system();
    let states = Provisioner::new(&RealExecutor, &fs, &deployment)
        .survey()
        .await;

    let report = PlanReport {
        url: deployment.site.host.url(),
        tls: tls_label(deployment.tls()),
        phases: states
            .into_iter()
            .map(|(phase, complete)| PhaseState {
                id: phase.id(),
                title: phase.title(),
                complete,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} ({})", report.url.bold(), report.tls);
    for phase in &report.phases {
        let status = if phase.complete {
            format!("{:<9}", "complete").green()
        } else {
            format!("{:<9}", "pending").yellow()
        };
        println!("  {:<14} {status} {}", phase.id, phase.title);
    }
    Ok(())
}
