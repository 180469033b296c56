use std::collections::HashMap;

use hoist_core::{Deployment, HoistConfig, NoPrompt, Resolver, Secrets};
use hoist_host::Summary;
use secrecy::ExposeSecret;

fn deployment_with(pairs: &[(&str, &str)]) -> Deployment {
    let src: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    let inputs = Resolver::default().resolve(&src, &mut NoPrompt).unwrap();
    Deployment::assemble(HoistConfig::default(), &inputs, Secrets::generate()).unwrap()
}

#[test]
fn summary_carries_url_credentials_and_master_key() {
    let d = deployment_with(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "alice")]);
    let out = Summary::new(&d).render();

    assert!(out.contains("https://news.example.com"));
    assert!(out.contains("Admin username:  alice"));
    assert!(out.contains("Admin password:  test"));
    assert!(out.contains(d.secrets.master_key.expose_secret()));
    assert!(out.contains("change it immediately"));
    assert!(out.contains("journalctl -u lobsters.service"));
}

#[test]
fn address_host_gets_plain_http_url() {
    let d = deployment_with(&[("DOMAIN", "54.123.45.67"), ("ADMIN_USERNAME", "alice")]);
    assert!(Summary::new(&d).render().contains("Site:            http://54.123.45.67"));
}

#[test]
fn supplied_admin_password_drops_default_warning() {
    let d = deployment_with(&[
        ("DOMAIN", "news.example.com"),
        ("ADMIN_USERNAME", "alice"),
        ("ADMIN_PASSWORD", "correct horse"),
    ]);
    let out = Summary::new(&d).render();
    assert!(out.contains("Admin password:  correct horse"));
    assert!(!out.contains("documented default"));
}

#[test]
fn debug_never_shows_secrets() {
    let d = deployment_with(&[("DOMAIN", "news.example.com"), ("ADMIN_USERNAME", "alice")]);
    let debug = format!("{:?}", Summary::new(&d));
    assert!(!debug.contains(d.secrets.master_key.expose_secret()));
    assert!(debug.contains("[REDACTED]"));
}
