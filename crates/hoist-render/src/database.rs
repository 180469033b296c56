use std::collections::BTreeMap;

use hoist_core::Deployment;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::artifact::{Artifact, Owner};

/// Connection config: environment → datastore role → parameters.
#[derive(Debug, Serialize)]
struct Roles {
    primary: Connection,
    cache: Connection,
    queue: Connection,
}

#[derive(Debug, Default, Serialize)]
struct Connection {
    adapter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    pool: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations_paths: Option<String>,
}

/// Renders `config/database.yml` with the primary relational store and the
/// two file-backed stores (cache, job queue).
pub fn database_yml(d: &Deployment) -> Result<Artifact, crate::RenderError> {
    let db = &d.config.database;
    let env = &d.config.app.rails_env;

    let primary = Connection {
        adapter: "trilogy".to_owned(),
        encoding: Some(db.encoding.clone()),
        collation: Some(db.collation.clone()),
        host: Some(db.host.clone()),
        port: Some(db.port),
        database: db.name.clone(),
        username: Some(db.user.clone()),
        password: Some(d.secrets.database_password.expose_secret().to_owned()),
        pool: db.pool,
        migrations_paths: None,
    };

    let sqlite = |role: &str| Connection {
        adapter: "sqlite3".to_owned(),
        database: format!("storage/{env}_{role}.sqlite3"),
        pool: db.pool,
        migrations_paths: Some(format!("db/{role}_migrate")),
        ..Default::default()
    };

    let mut doc = BTreeMap::new();
    doc.insert(
        env.clone(),
        Roles {
            primary,
            cache: sqlite("cache"),
            queue: sqlite("queue"),
        },
    );

    let yaml =
        serde_yaml::to_string(&doc).map_err(|e| crate::RenderError::Yaml { source: e })?;
    let contents = format!("# Generated by hoist; rewritten on every run.\n{yaml}");

    Ok(Artifact::new(
        d.app_dir().join("config/database.yml"),
        contents,
        0o600,
        Owner::User(d.config.app.user.clone()),
    ))
}
