use std::fmt::Write;

use hoist_core::{Deployment, HostIdentity};

use crate::artifact::{Artifact, Owner};

/// Response headers applied on both branches.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "SAMEORIGIN"),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
];

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Renders the Caddyfile fronting the application.
///
/// - Domain: a block keyed by the domain with an explicit `tls` directive
///   (ACME issuance and renewal) and HSTS; Caddy redirects HTTP itself.
/// - Address: a plaintext `:80` block with automatic HTTPS turned off.
pub fn caddyfile(d: &Deployment) -> Artifact {
    let mut out = String::from("# Generated by hoist; rewritten on every run.\n");

    // arch-lint: allow(no-silent-result-drop) reason="fmt::Write into a String is infallible"
    let _ = match &d.site.host {
        HostIdentity::Domain(domain) => domain_block(&mut out, d, domain),
        HostIdentity::Address(_) => address_block(&mut out, d),
    };

    Artifact::new(d.config.proxy.caddyfile.clone(), out, 0o644, Owner::Root)
}

fn domain_block(out: &mut String, d: &Deployment, domain: &str) -> std::fmt::Result {
    writeln!(out, "{domain} {{")?;
    writeln!(out, "\ttls {}", d.acme_email)?;
    common_directives(out, d, true)?;
    writeln!(out, "}}")
}

fn address_block(out: &mut String, d: &Deployment) -> std::fmt::Result {
    writeln!(out, "{{")?;
    writeln!(out, "\tauto_https off")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, ":80 {{")?;
    common_directives(out, d, false)?;
    writeln!(out, "}}")
}

fn common_directives(out: &mut String, d: &Deployment, hsts: bool) -> std::fmt::Result {
    writeln!(out, "\tencode zstd gzip")?;
    writeln!(out, "\treverse_proxy 127.0.0.1:{}", d.config.app.port)?;
    writeln!(out, "\theader {{")?;
    if hsts {
        writeln!(out, "\t\tStrict-Transport-Security \"{HSTS}\"")?;
    }
    for (name, value) in SECURITY_HEADERS {
        writeln!(out, "\t\t{name} \"{value}\"")?;
    }
    writeln!(out, "\t\t-Server")?;
    writeln!(out, "\t}}")?;
    writeln!(out, "\tlog {{")?;
    writeln!(
        out,
        "\t\toutput file {}",
        d.config.proxy.access_log.display()
    )?;
    writeln!(out, "\t}}")
}
