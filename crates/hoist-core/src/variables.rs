//! Per-run inputs: declaration, sources, and one-shot resolution.
//!
//! Resolution order for each [`Variable`]: source value, then default, then
//! an interactive prompt for required values. The result is an immutable
//! [`Inputs`] map that every later step reads from; nothing re-reads the
//! process environment after this point.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

/// A declared configuration value.
#[derive(Debug, Clone, Copy)]
pub struct Variable {
    pub key: &'static str,
    pub description: &'static str,
    pub default: Option<&'static str>,
    pub required: bool,
    /// Masked in debug output and never echoed back
    pub secret: bool,
}

pub const DOMAIN: &str = "DOMAIN";
pub const SITE_NAME: &str = "SITE_NAME";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const ADMIN_USERNAME: &str = "ADMIN_USERNAME";
pub const ADMIN_EMAIL: &str = "ADMIN_EMAIL";
pub const ADMIN_PASSWORD: &str = "ADMIN_PASSWORD";
pub const ACME_EMAIL: &str = "ACME_EMAIL";
pub const SMTP_HOST: &str = "SMTP_HOST";
pub const SMTP_PORT: &str = "SMTP_PORT";
pub const SMTP_USERNAME: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const REPO_URL: &str = "REPO_URL";

/// Every input a provisioning run understands.
pub const VARIABLES: &[Variable] = &[
    Variable {
        key: DOMAIN,
        description: "domain name or IP address the site is served on",
        default: None,
        required: true,
        secret: false,
    },
    Variable {
        key: SITE_NAME,
        description: "site display name",
        default: Some("Lobsters"),
        required: true,
        secret: false,
    },
    Variable {
        key: DB_PASSWORD,
        description: "database password for the application account",
        default: None,
        required: false,
        secret: true,
    },
    Variable {
        key: ADMIN_USERNAME,
        description: "administrator username",
        default: None,
        required: true,
        secret: false,
    },
    Variable {
        key: ADMIN_EMAIL,
        description: "administrator email address",
        default: None,
        required: false,
        secret: false,
    },
    Variable {
        key: ADMIN_PASSWORD,
        description: "administrator initial password",
        default: None,
        required: false,
        secret: true,
    },
    Variable {
        key: ACME_EMAIL,
        description: "contact address for certificate registration",
        default: None,
        required: false,
        secret: false,
    },
    Variable {
        key: SMTP_HOST,
        description: "mail relay host",
        default: Some("127.0.0.1"),
        required: true,
        secret: false,
    },
    Variable {
        key: SMTP_PORT,
        description: "mail relay port",
        default: Some("25"),
        required: true,
        secret: false,
    },
    Variable {
        key: SMTP_USERNAME,
        description: "mail relay username",
        default: None,
        required: false,
        secret: false,
    },
    Variable {
        key: SMTP_PASSWORD,
        description: "mail relay password",
        default: None,
        required: false,
        secret: true,
    },
    Variable {
        key: REPO_URL,
        description: "application source repository",
        default: Some("https://github.com/lobsters/lobsters.git"),
        required: true,
        secret: false,
    },
];

/// Key/value lookup the resolver reads from.
pub trait VariableSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl VariableSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Process environment, optionally layered over an env file.
///
/// Values from the process environment win over the file.
#[derive(Debug, Default)]
pub struct EnvSource {
    file: HashMap<String, String>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_file(path: &Path) -> crate::Result<Self> {
        let iter = dotenvy::from_path_iter(path).map_err(|e| crate::Error::EnvFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut file = HashMap::new();
        for item in iter {
            let (k, v) = item.map_err(|e| crate::Error::EnvFile {
                path: path.to_path_buf(),
                source: e,
            })?;
            file.insert(k, v);
        }
        Ok(Self { file })
    }
}

impl VariableSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            // arch-lint: allow(no-silent-result-drop) reason="unset falls back to the env file"
            .ok()
            .or_else(|| self.file.get(key).cloned())
    }
}

/// Interactive fallback for required values.
pub trait Prompter {
    fn is_interactive(&self) -> bool;

    fn prompt(&mut self, variable: &Variable) -> std::io::Result<String>;
}

/// Reads single lines from stdin when it is attached to a terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn prompt(&mut self, variable: &Variable) -> std::io::Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{} ({}): ", variable.key, variable.description)?;
        stdout.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_owned())
    }
}

/// Never prompts; used for `--no-prompt` and unattended runs.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn is_interactive(&self) -> bool {
        false
    }

    fn prompt(&mut self, _variable: &Variable) -> std::io::Result<String> {
        Err(std::io::Error::other("prompting disabled"))
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Source,
    Default,
    Prompt,
}

#[derive(Clone)]
struct Resolved {
    value: String,
    origin: Origin,
    secret: bool,
}

/// Resolved inputs for one run.
#[derive(Clone, Default)]
pub struct Inputs {
    values: BTreeMap<&'static str, Resolved>,
}

impl Inputs {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|r| r.value.as_str())
    }

    pub fn origin(&self, key: &str) -> Option<Origin> {
        self.values.get(key).map(|r| r.origin)
    }

    /// Value of a variable that resolution guarantees to be present.
    pub(crate) fn required(&self, key: &'static str) -> crate::Result<&str> {
        self.get(key).ok_or(crate::Error::MissingInput {
            key,
            description: VARIABLES
                .iter()
                .find(|v| v.key == key)
                .map(|v| v.description)
                .unwrap_or("undeclared input"),
        })
    }
}

impl fmt::Debug for Inputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, r) in &self.values {
            if r.secret {
                map.entry(key, &"[REDACTED]");
            } else {
                map.entry(key, &r.value);
            }
        }
        map.finish()
    }
}

/// Resolves declared variables against a source and a prompter.
pub struct Resolver<'a> {
    variables: &'a [Variable],
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self::new(VARIABLES)
    }
}

impl<'a> Resolver<'a> {
    pub fn new(variables: &'a [Variable]) -> Self {
        Self { variables }
    }

    /// Resolve every variable or fail on the first required one that cannot
    /// be satisfied. Empty source values count as absent.
    pub fn resolve(
        &self,
        source: &dyn VariableSource,
        prompter: &mut dyn Prompter,
    ) -> crate::Result<Inputs> {
        let mut inputs = Inputs::default();

        for var in self.variables {
            let from_source = source
                .get(var.key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty());

            let resolved = match (from_source, var.default) {
                (Some(value), _) => Some((value, Origin::Source)),
                (None, Some(default)) => Some((default.to_owned(), Origin::Default)),
                (None, None) if var.required => {
                    if !prompter.is_interactive() {
                        return Err(crate::Error::MissingInput {
                            key: var.key,
                            description: var.description,
                        });
                    }
                    let answer = prompter.prompt(var).map_err(|e| crate::Error::Prompt {
                        key: var.key,
                        source: e,
                    })?;
                    let answer = answer.trim().to_owned();
                    if answer.is_empty() {
                        return Err(crate::Error::EmptyInput {
                            key: var.key,
                            description: var.description,
                        });
                    }
                    Some((answer, Origin::Prompt))
                }
                (None, None) => None,
            };

            if let Some((value, origin)) = resolved {
                tracing::debug!(key = var.key, ?origin, "input resolved");
                inputs.values.insert(
                    var.key,
                    Resolved {
                        value,
                        origin,
                        secret: var.secret,
                    },
                );
            }
        }

        Ok(inputs)
    }
}
