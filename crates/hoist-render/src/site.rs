use hoist_core::Deployment;

use crate::artifact::{Artifact, Owner};

/// Renders the site identity initializer.
///
/// The file is regenerated whole from [`SiteSettings`](hoist_core::SiteSettings)
/// rather than patched, and the three SSL settings all come from one
/// [`SslFlags`](hoist_core::SslFlags) value.
pub fn site_initializer(d: &Deployment) -> Artifact {
    let site = &d.site;
    let contents = format!(
        r#"# Generated by hoist; rewritten on every run.
Rails.application.configure do
  config.force_ssl = {force_ssl}
  config.assume_ssl = {assume_ssl}
end

class << Rails.application
  def domain
    {domain}
  end

  def name
    {name}
  end

  def ssl?
    {ssl}
  end
end
"#,
        force_ssl = site.ssl.force_ssl(),
        assume_ssl = site.ssl.assume_ssl(),
        ssl = site.ssl.available(),
        domain = ruby_string(&site.host.to_string()),
        name = ruby_string(&site.name),
    );

    Artifact::new(
        d.app_dir().join("config/initializers/hoist_site.rb"),
        contents,
        0o644,
        Owner::User(d.config.app.user.clone()),
    )
}

/// Double-quoted Ruby literal with interpolation disabled.
fn ruby_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '#' => out.push_str("\\#"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
