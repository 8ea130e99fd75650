use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Request, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::{BackendConfig, DataStore};
use crate::error::{Error, Result};
use crate::model::{
    validate_id, NewProject, NewTask, Project, ProjectUpdate, Task, TaskUpdate,
};
use crate::query::builder::TASK_SELECT;
use crate::query::TaskQuery;

const PROJECTS: &str = "projects";
const TASKS: &str = "tasks";

/// HTTP client for the backend.
///
/// Requests are authorized with the session's access token when one is set,
/// otherwise with the anon key.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendConfig,
    access_token: Option<String>,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("taskdash/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            access_token: None,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(self.config.anon_key());
        self.http
            .request(method, url)
            .header("apikey", self.config.anon_key())
            .bearer_auth(bearer)
    }

    fn table_url(&self, table: &str, params: &[(String, String)]) -> Result<Url> {
        let mut url = self.config.endpoint(&format!("rest/v1/{table}"))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    fn row_url(&self, table: &str, id: &str, select: &str) -> Result<Url> {
        validate_id(id)?;
        self.table_url(
            table,
            &[
                ("id".to_string(), format!("eq.{id}")),
                ("select".to_string(), select.to_string()),
            ],
        )
    }

    // ── Request construction ───────────────────────────────────────

    pub fn list_projects_request(&self) -> Result<Request> {
        let url = self.table_url(
            PROJECTS,
            &[
                ("select".into(), "*".into()),
                ("order".into(), "created_at.desc".into()),
            ],
        )?;
        Ok(self.request(Method::GET, url).build()?)
    }

    pub fn list_tasks_request(&self, query: &TaskQuery) -> Result<Request> {
        let url = self.table_url(TASKS, &query.build_params())?;
        Ok(self.request(Method::GET, url).build()?)
    }

    fn get_request(&self, table: &str, id: &str, select: &str) -> Result<Request> {
        let url = self.row_url(table, id, select)?;
        Ok(self.request(Method::GET, url).build()?)
    }

    fn insert_request<T: Serialize + ?Sized>(
        &self,
        table: &str,
        select: &str,
        body: &T,
    ) -> Result<Request> {
        let url = self.table_url(table, &[("select".into(), select.into())])?;
        Ok(self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body)
            .build()?)
    }

    fn update_request<T: Serialize + ?Sized>(
        &self,
        table: &str,
        id: &str,
        select: &str,
        body: &T,
    ) -> Result<Request> {
        let url = self.row_url(table, id, select)?;
        Ok(self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .build()?)
    }

    fn delete_request(&self, table: &str, id: &str) -> Result<Request> {
        validate_id(id)?;
        let url = self.table_url(table, &[("id".to_string(), format!("eq.{id}"))])?;
        Ok(self.request(Method::DELETE, url).build()?)
    }

    // ── Execution ──────────────────────────────────────────────────

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        log::debug!("{method} {path}");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            log::debug!("{method} {path} failed with {status}");
            return Err(api_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn send_empty(&self, request: Request) -> Result<()> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        log::debug!("{method} {path}");

        let response = self.http.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!("{method} {path} failed with {status}");
            return Err(api_error(status, &body));
        }
        Ok(())
    }

    /// Run a request that returns a row array and take its single row.
    async fn send_single<T: DeserializeOwned>(
        &self,
        request: Request,
        what: &str,
        id: &str,
    ) -> Result<T> {
        let rows: Vec<T> = self.send_json(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("{what} {id}")))
    }
}

#[async_trait]
impl DataStore for BackendClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let projects: Vec<Project> = self.send_json(self.list_projects_request()?).await?;
        log::info!("Fetched {} projects", projects.len());
        Ok(projects)
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        let request = self.get_request(PROJECTS, id, "*")?;
        self.send_single(request, "project", id).await
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let request = self.insert_request(PROJECTS, "*", project)?;
        let created: Project = self.send_single(request, "project", "(new)").await?;
        log::info!("Created project {}", created.id);
        Ok(created)
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Project> {
        let request = self.update_request(PROJECTS, id, "*", update)?;
        self.send_single(request, "project", id).await
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.send_empty(self.delete_request(PROJECTS, id)?).await?;
        log::info!("Deleted project {id}");
        Ok(())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self.send_json(self.list_tasks_request(query)?).await?;
        log::info!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        let request = self.get_request(TASKS, id, TASK_SELECT)?;
        self.send_single(request, "task", id).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        let request = self.insert_request(TASKS, TASK_SELECT, task)?;
        let created: Task = self.send_single(request, "task", "(new)").await?;
        log::info!("Created task {}", created.id);
        Ok(created)
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        let request = self.update_request(TASKS, id, TASK_SELECT, update)?;
        self.send_single(request, "task", id).await
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.send_empty(self.delete_request(TASKS, id)?).await?;
        log::info!("Deleted task {id}");
        Ok(())
    }
}

/// Build an error from a non-2xx response, preferring the message the
/// backend put in its JSON body.
pub(crate) fn api_error(status: StatusCode, body: &str) -> Error {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        });

    let message = match from_json {
        Some(m) => m,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    Error::Api {
        status: status.as_u16(),
        message,
    }
}
