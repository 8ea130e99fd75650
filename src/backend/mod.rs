//! The hosted data backend: a PostgREST-style REST API for rows and a
//! GoTrue-style API for sessions.

pub mod auth;
pub mod client;
#[cfg(test)]
pub(crate) mod memory;

pub use auth::{AuthUser, Session, SignUpOutcome, UserMetadata};
pub use client::BackendClient;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};
use crate::model::{NewProject, NewTask, Project, ProjectUpdate, Task, TaskUpdate};
use crate::query::TaskQuery;

/// Row storage for tasks and projects, scoped to the signed-in user.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All projects, newest first.
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn get_project(&self, id: &str) -> Result<Project>;
    async fn create_project(&self, project: &NewProject) -> Result<Project>;
    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Project>;
    async fn delete_project(&self, id: &str) -> Result<()>;

    /// Tasks matching `query`, each with its project embedded.
    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>>;
    async fn get_task(&self, id: &str) -> Result<Task>;
    async fn create_task(&self, task: &NewTask) -> Result<Task>;
    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task>;
    async fn delete_task(&self, id: &str) -> Result<()>;
}

/// Where the backend lives and the public key that identifies the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    url: Url,
    anon_key: String,
}

impl BackendConfig {
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let mut url = Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("invalid backend URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "backend URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(Error::Config("anon key is empty".into()));
        }
        // Relative joins replace the last path segment unless it ends in '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Absolute URL for a path below the base, e.g. `rest/v1/tasks`.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("invalid endpoint '{path}': {e}")))
    }
}
