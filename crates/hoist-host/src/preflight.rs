use crate::error::{ExecError, PreflightError};
use crate::executor::{CommandExecutor, Invocation};

/// Fail unless running as root on an apt-based host.
pub async fn check_host<E: CommandExecutor>(exec: &E) -> Result<(), PreflightError> {
    let uid = exec
        .exec(&Invocation::new("id", ["-u"]))
        .await
        .map_err(|e| PreflightError::Identity { source: e })?;
    let uid = uid.trim();
    if uid != "0" {
        return Err(PreflightError::NotRoot {
            uid: uid.to_owned(),
        });
    }

    match exec.exec(&Invocation::new("apt-get", ["--version"])).await {
        Ok(_) => Ok(()),
        Err(e @ ExecError::Spawn { .. }) => Err(PreflightError::UnsupportedHost { source: e }),
        Err(e) => {
            tracing::warn!(error = %e, "apt-get --version failed; continuing");
            Ok(())
        }
    }
}
