//! Backend settings resolution.
//!
//! Each setting is taken from the first source that has it: command-line
//! flag, then environment variable, then the local `app_config` table.

use crate::backend::BackendConfig;
use crate::error::{Error, Result};
use crate::storage::{repository, Database};

pub const KEY_BACKEND_URL: &str = "backend_url";
pub const KEY_ANON_KEY: &str = "anon_key";

pub const ENV_BACKEND_URL: &str = "TASKDASH_URL";
pub const ENV_ANON_KEY: &str = "TASKDASH_ANON_KEY";

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// Resolve backend settings from flags, the process environment and the store.
pub async fn resolve(db: &Database, overrides: &Overrides) -> Result<BackendConfig> {
    resolve_with(db, overrides, |name| std::env::var(name).ok()).await
}

pub async fn resolve_with(
    db: &Database,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<BackendConfig> {
    let stored: Vec<(String, String)> = db
        .reader()
        .call(|conn| repository::list_config(conn))
        .await?;
    let from_store = |key: &str| {
        stored
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };
    let present = |v: &String| !v.trim().is_empty();
    let pick = |flag: &Option<String>, env_name: &str, key: &str| {
        flag.clone()
            .filter(present)
            .or_else(|| env(env_name).filter(present))
            .or_else(|| from_store(key))
    };

    let url = pick(&overrides.url, ENV_BACKEND_URL, KEY_BACKEND_URL).ok_or_else(|| {
        Error::Config(format!(
            "backend URL not set. Pass --url, set {ENV_BACKEND_URL}, or run: taskdash config set {KEY_BACKEND_URL} <URL>"
        ))
    })?;
    let anon_key = pick(&overrides.anon_key, ENV_ANON_KEY, KEY_ANON_KEY).ok_or_else(|| {
        Error::Config(format!(
            "anon key not set. Pass --anon-key, set {ENV_ANON_KEY}, or run: taskdash config set {KEY_ANON_KEY} <KEY>"
        ))
    })?;

    BackendConfig::new(&url, &anon_key)
}
