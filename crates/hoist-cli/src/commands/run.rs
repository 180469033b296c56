use hoist_core::{Deployment, SecretStore, SecretsOrigin, variables};
use hoist_host::{HostFs, Phase, Provisioner, RealExecutor, Summary, check_host};

use super::{InputArgs, dry_deployment, tls_label};
use crate::output::{self, Progress};

/// Provision the host end to end, then print the summary.
pub async fn run(args: &InputArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let inputs = args.resolve()?;

    // Reject bad inputs before anything is written to the host.
    dry_deployment(config.clone(), &inputs, None)?;

    let exec = RealExecutor;
    check_host(&exec).await?;

    let fs = HostFs::system();
    let store = SecretStore::new(config.secrets_path());
    let (secrets, origin) = store.load_or_create(inputs.get(variables::DB_PASSWORD))?;
    match origin {
        SecretsOrigin::Created => {
            output::info(format!("generated secrets in {}", store.path().display()));
        }
        SecretsOrigin::Updated => output::info("database password replaced from DB_PASSWORD"),
        SecretsOrigin::Loaded => {
            output::info(format!("reusing secrets from {}", store.path().display()));
        }
    }

    let deployment = Deployment::assemble(config, &inputs, secrets)?;
    output::info(format!(
        "provisioning {} ({})",
        deployment.site.host.url(),
        tls_label(deployment.tls())
    ));

    let mut progress = Progress::new(Phase::ALL.len());
    let report = Provisioner::new(&exec, &fs, &deployment)
        .run(&Phase::ALL, &mut progress)
        .await?;

    output::ok(format!(
        "{} phase(s) applied, {} already complete",
        report.applied().count(),
        report.skipped().count()
    ));
    println!();
    println!("{}", Summary::new(&deployment).render());
    Ok(())
}
