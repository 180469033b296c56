use std::collections::HashMap;
use std::path::PathBuf;

use hoist_core::{
    Deployment, HoistConfig, HostIdentity, NoPrompt, Resolver, RestartPolicy, Secrets, TlsMode,
    UnitSource,
};
use secrecy::ExposeSecret;

fn deployment(pairs: &[(&str, &str)]) -> hoist_core::Result<Deployment> {
    let src: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    let inputs = Resolver::default().resolve(&src, &mut NoPrompt)?;
    Deployment::assemble(HoistConfig::default(), &inputs, Secrets::generate())
}

#[test]
fn domain_input_selects_acme_and_all_ssl_flags() {
    let d = deployment(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "alice")]).unwrap();

    assert_eq!(d.tls(), TlsMode::Acme);
    assert!(d.site.ssl.available() && d.site.ssl.force_ssl() && d.site.ssl.assume_ssl());
    assert_eq!(d.acme_email, "alice@news.example.com");
}

#[test]
fn address_input_turns_every_ssl_flag_off() {
    let d = deployment(&[("DOMAIN", "54.123.45.67"), ("ADMIN_USERNAME", "alice")]).unwrap();

    assert_eq!(
        d.site.host,
        HostIdentity::Address("54.123.45.67".parse().unwrap())
    );
    assert!(!d.site.ssl.available());
    assert!(!d.site.ssl.force_ssl());
    assert!(!d.site.ssl.assume_ssl());
}

#[test]
fn admin_gets_documented_default_password() {
    let d = deployment(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "alice")]).unwrap();

    assert!(d.admin.default_password);
    assert_eq!(d.admin.password.expose_secret(), "test");
}

#[test]
fn admin_password_input_overrides_default() {
    let d = deployment(&[
        ("DOMAIN", "news.example.com"),
        ("ADMIN_USERNAME", "alice"),
        ("ADMIN_PASSWORD", "s3cret"),
    ])
    .unwrap();

    assert!(!d.admin.default_password);
    assert_eq!(d.admin.password.expose_secret(), "s3cret");
}

#[test]
fn bad_smtp_port_is_rejected() {
    let err = deployment(&[
        ("DOMAIN", "news.example.com"),
        ("ADMIN_USERNAME", "alice"),
        ("SMTP_PORT", "twenty-five"),
    ])
    .unwrap_err();

    assert!(err.to_string().contains("SMTP_PORT"));
}

#[test]
fn admin_username_with_quote_is_rejected() {
    assert!(deployment(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "al'ice")]).is_err());
}

#[test]
fn app_service_restarts_on_failure_after_database() {
    let d = deployment(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "alice")]).unwrap();
    let svc = d.app_service();

    assert_eq!(svc.unit, UnitSource::Generated);
    assert_eq!(svc.unit_path(), PathBuf::from("/etc/systemd/system/lobsters.service"));
    assert_eq!(svc.restart, RestartPolicy::OnFailure { delay_secs: 5 });
    assert!(svc.requires.contains(&"mariadb.service".to_owned()));
    assert!(svc.after.contains(&"mariadb.service".to_owned()));
    assert!(svc.hardening.no_new_privileges);
    assert!(svc.hardening.private_tmp);
    assert_eq!(
        svc.environment_file,
        Some(PathBuf::from("/srv/lobsters/.env.production"))
    );
    assert!(svc.exec_start.contains("127.0.0.1:3000"));
}

#[test]
fn runtime_env_marks_secrets() {
    let d = deployment(&[
        ("DOMAIN", "news.example.com"),
        ("ADMIN_USERNAME", "alice"),
        ("SMTP_PASSWORD", "relay-pass"),
    ])
    .unwrap();

    let env = d.runtime_env();
    let get = |k: &str| env.iter().find(|(key, _)| *key == k).map(|(_, v)| v);

    assert_eq!(get("RAILS_ENV").unwrap().expose(), "production");
    assert!(get("RAILS_MASTER_KEY").unwrap().is_secret());
    assert!(get("SMTP_PASSWORD").unwrap().is_secret());
    assert_eq!(get("SOLID_QUEUE_IN_PUMA").unwrap().expose(), "true");
    assert_eq!(get("RAILS_SERVE_STATIC_FILES").unwrap().expose(), "true");
    assert_eq!(get("BANNED_DOMAINS_ADMIN").unwrap().expose(), "alice");
    assert!(get("SMTP_USERNAME").is_none());

    let debug = format!("{env:?}");
    assert!(!debug.contains("relay-pass"));
}
