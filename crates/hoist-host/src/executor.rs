use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use crate::error::ExecError;

/// A command to run on the host.
///
/// Secrets never go into `args`: they travel through `env` or stdin, and
/// `Debug` prints environment keys only.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Run as this account via `runuser -u <user> -m --`
    pub user: Option<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            program: program.to_owned(),
            args: args.into_iter().map(|a| a.as_ref().to_owned()).collect(),
            user: None,
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn as_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_owned());
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Full argv, including the `runuser` prefix when a user is set.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 6);
        if let Some(user) = &self.user {
            argv.extend(["runuser", "-u", user.as_str(), "-m", "--"].map(str::to_owned));
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// True when the program or any argument equals `word`.
    pub fn mentions(&self, word: &str) -> bool {
        self.program == word || self.args.iter().any(|a| a == word)
    }

    fn to_command(&self) -> tokio::process::Command {
        let argv = self.command_line();
        let mut cmd = tokio::process::Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line().join(" "))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("user", &self.user)
            .field("cwd", &self.cwd)
            .field(
                "env",
                &self.env.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Abstraction over host command execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture stdout.
    async fn exec(&self, cmd: &Invocation) -> Result<String, ExecError>;

    /// Run a command, streaming output to the terminal.
    async fn exec_streaming(&self, cmd: &Invocation) -> Result<(), ExecError>;

    /// Run a command with data piped to stdin.
    async fn exec_with_stdin(&self, cmd: &Invocation, stdin_data: &[u8])
    -> Result<String, ExecError>;
}

/// Runs commands with `tokio::process`, one at a time.
pub struct RealExecutor;

impl CommandExecutor for RealExecutor {
    async fn exec(&self, cmd: &Invocation) -> Result<String, ExecError> {
        tracing::debug!(command = %cmd, "exec");

        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: cmd.program.clone(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ExecError::InvalidUtf8 {
                command: cmd.to_string(),
                source: e,
            })
        } else {
            Err(ExecError::CommandFailed {
                command: cmd.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }

    async fn exec_streaming(&self, cmd: &Invocation) -> Result<(), ExecError> {
        tracing::debug!(command = %cmd, "exec (streaming)");

        let status = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| ExecError::Spawn {
                program: cmd.program.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecError::CommandFailed {
                command: cmd.to_string(),
                status: status.to_string(),
                stderr: "see output above".to_owned(),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        cmd: &Invocation,
        stdin_data: &[u8],
    ) -> Result<String, ExecError> {
        use tokio::io::AsyncWriteExt;

        tracing::debug!(command = %cmd, bytes = stdin_data.len(), "exec (stdin)");

        let mut child = cmd
            .to_command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecError::Spawn {
                program: cmd.program.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| ExecError::StdinWrite {
                    command: cmd.to_string(),
                    source: e,
                })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| ExecError::StdinWrite {
                    command: cmd.to_string(),
                    source: e,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: cmd.program.clone(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| ExecError::InvalidUtf8 {
                command: cmd.to_string(),
                source: e,
            })
        } else {
            Err(ExecError::CommandFailed {
                command: cmd.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_prefixes_runuser() {
        let inv = Invocation::new("bundle", ["install"])
            .as_user("lobsters")
            .in_dir("/srv/lobsters");
        assert_eq!(
            inv.command_line(),
            vec!["runuser", "-u", "lobsters", "-m", "--", "bundle", "install"]
        );
        assert_eq!(inv.to_string(), "runuser -u lobsters -m -- bundle install");
    }

    #[test]
    fn debug_hides_env_values() {
        let inv = Invocation::new("mysql", ["--batch"]).env("MYSQL_PWD", "hunter2");
        let out = format!("{inv:?}");
        assert!(out.contains("MYSQL_PWD"));
        assert!(!out.contains("hunter2"));
        assert!(!inv.to_string().contains("hunter2"));
    }

    #[test]
    fn mentions_matches_whole_words() {
        let inv = Invocation::new("systemctl", ["is-active", "--quiet", "mariadb"]);
        assert!(inv.mentions("systemctl"));
        assert!(inv.mentions("mariadb"));
        assert!(!inv.mentions("maria"));
    }

    #[tokio::test]
    async fn real_executor_captures_stdout_and_failures() {
        let out = RealExecutor
            .exec(&Invocation::new("sh", ["-c", "printf hello"]))
            .await
            .unwrap();
        assert_eq!(out, "hello");

        let err = RealExecutor
            .exec(&Invocation::new("sh", ["-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::CommandFailed { ref stderr, .. } if stderr == "boom"));
    }

    #[tokio::test]
    async fn real_executor_pipes_stdin() {
        let out = RealExecutor
            .exec_with_stdin(&Invocation::new("cat", Vec::<String>::new()), b"piped")
            .await
            .unwrap();
        assert_eq!(out, "piped");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = RealExecutor
            .exec(&Invocation::new("hoist-definitely-not-installed", ["x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
