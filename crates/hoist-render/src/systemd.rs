use std::fmt::Write;

use hoist_core::{RestartPolicy, ServiceDescriptor};

use crate::artifact::{Artifact, Owner};

/// Renders a systemd unit for a generated [`ServiceDescriptor`].
pub fn unit(service: &ServiceDescriptor) -> Artifact {
    let mut out = String::new();

    // arch-lint: allow(no-silent-result-drop) reason="fmt::Write into a String is infallible"
    let _ = render_into(&mut out, service);

    Artifact::new(service.unit_path(), out, 0o644, Owner::Root)
}

fn render_into(out: &mut String, s: &ServiceDescriptor) -> std::fmt::Result {
    writeln!(out, "# Generated by hoist; rewritten on every run.")?;
    writeln!(out, "[Unit]")?;
    writeln!(out, "Description={}", s.description)?;
    if !s.after.is_empty() {
        writeln!(out, "After={}", s.after.join(" "))?;
    }
    if !s.requires.is_empty() {
        writeln!(out, "Requires={}", s.requires.join(" "))?;
    }
    writeln!(out)?;

    writeln!(out, "[Service]")?;
    writeln!(out, "Type=simple")?;
    writeln!(out, "User={}", s.user)?;
    writeln!(out, "Group={}", s.user)?;
    writeln!(out, "WorkingDirectory={}", s.working_dir.display())?;
    if let Some(env_file) = &s.environment_file {
        writeln!(out, "EnvironmentFile={}", env_file.display())?;
    }
    for (key, value) in &s.environment {
        writeln!(out, "Environment=\"{key}={value}\"")?;
    }
    writeln!(out, "ExecStart={}", s.exec_start)?;
    match s.restart {
        RestartPolicy::OnFailure { delay_secs } => {
            writeln!(out, "Restart=on-failure")?;
            writeln!(out, "RestartSec={delay_secs}")?;
        }
    }
    if s.hardening.no_new_privileges {
        writeln!(out, "NoNewPrivileges=true")?;
    }
    if s.hardening.private_tmp {
        writeln!(out, "PrivateTmp=true")?;
    }
    writeln!(out)?;

    writeln!(out, "[Install]")?;
    writeln!(out, "WantedBy=multi-user.target")
}
