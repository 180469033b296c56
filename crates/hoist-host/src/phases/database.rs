use hoist_core::Deployment;
use secrecy::ExposeSecret;

use crate::error::PhaseError;
use crate::executor::{CommandExecutor, Invocation};

use super::{PhaseContext, probe, step};

/// Database server is active and the application credential can log in
/// to its schema.
pub(super) async fn is_satisfied<E: CommandExecutor>(
    ctx: &PhaseContext<'_, E>,
) -> Result<bool, PhaseError> {
    let db = &ctx.deployment.config.database;
    let active = Invocation::new("systemctl", ["is-active", "--quiet", db.service.as_str()]);
    if !probe(ctx.exec, active).await? {
        return Ok(false);
    }
    probe(ctx.exec, login_check(ctx.deployment)).await
}

pub(super) async fn apply<E: CommandExecutor>(ctx: &PhaseContext<'_, E>) -> Result<(), PhaseError> {
    let db = &ctx.deployment.config.database;
    step(
        ctx.exec,
        "start database server",
        Invocation::new("systemctl", ["enable", "--now", db.service.as_str()]),
    )
    .await?;

    // Root authenticates over the unix socket; the password only travels on stdin.
    let sql = bootstrap_sql(ctx.deployment);
    let root = Invocation::new("mysql", ["--user=root", "--batch"]);
    ctx.exec
        .exec_with_stdin(&root, sql.as_bytes())
        .await
        .map_err(|e| PhaseError::Step {
            step: "create schema and credential",
            source: e,
        })?;
    tracing::info!(database = %db.name, user = %db.user, "schema and credential ensured");
    Ok(())
}

/// Statements creating the schema and a credential scoped to it.
///
/// Every statement is safe to repeat; `ALTER USER` rebinds the password so
/// the credential always matches the connection config.
fn bootstrap_sql(d: &Deployment) -> String {
    let db = &d.config.database;
    let account = format!("'{}'@'{ACCOUNT_HOST}'", db.user);
    let password = sql_string(d.secrets.database_password.expose_secret());
    format!(
        "CREATE DATABASE IF NOT EXISTS `{name}` CHARACTER SET {enc} COLLATE {coll};\n\
         CREATE USER IF NOT EXISTS {account} IDENTIFIED BY '{password}';\n\
         ALTER USER {account} IDENTIFIED BY '{password}';\n\
         GRANT ALL PRIVILEGES ON `{name}`.* TO {account};\n\
         FLUSH PRIVILEGES;\n",
        name = db.name,
        enc = db.encoding,
        coll = db.collation,
    )
}

fn login_check(d: &Deployment) -> Invocation {
    let db = &d.config.database;
    Invocation::new(
        "mysql",
        [
            format!("--user={}", db.user),
            format!("--host={}", db.host),
            format!("--port={}", db.port),
            format!("--database={}", db.name),
            "--batch".to_owned(),
            "--skip-column-names".to_owned(),
            "--execute=SELECT 1".to_owned(),
        ],
    )
    .env("MYSQL_PWD", d.secrets.database_password.expose_secret())
}

/// Host part of the application account. `database.host` is always a
/// loopback address, and loopback clients authenticate as `localhost`.
const ACCOUNT_HOST: &str = "localhost";

fn sql_string(value: &str) -> String {
    value.replace('\\', r"\\").replace('\'', "''")
}
