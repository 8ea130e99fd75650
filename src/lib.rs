pub mod backend;
pub mod config;
pub mod date_util;
pub mod error;
pub mod model;
pub mod query;
pub mod session;
pub mod stats;
pub mod storage;

pub use backend::{BackendClient, BackendConfig, DataStore, Session, SignUpOutcome};
pub use error::{Error, Result};
pub use model::{
    NewProject, NewTask, Priority, Project, ProjectStatus, ProjectUpdate, Task, TaskStatus,
    TaskUpdate,
};
pub use query::{DueWindow, ProjectFilters, ProjectSortKey, SortOrder, TaskFilters, TaskSortKey};
pub use stats::{compute_stats, DashboardState, DashboardStats, LoadState};
pub use storage::Database;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use query::TaskQuery;
use storage::repository;

fn lock_state(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Main entry point: the local store plus a backend for task and project rows.
pub struct TaskDash {
    db: Database,
    store: Box<dyn DataStore>,
}

impl TaskDash {
    pub fn new(db: Database, store: impl DataStore + 'static) -> Self {
        Self {
            db,
            store: Box::new(store),
        }
    }

    /// Access the local store (for config and session commands in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Dashboard ──────────────────────────────────────────────────

    /// Fetch every task and project concurrently and aggregate them.
    ///
    /// Either fetch failing aborts the whole load with `Error::Fetch`; no
    /// partial statistics are produced.
    pub async fn load_dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let all = TaskQuery::new();
        let (tasks, projects) = tokio::try_join!(
            async { self.store.list_tasks(&all).await.map_err(Error::into_fetch) },
            async { self.store.list_projects().await.map_err(Error::into_fetch) },
        )?;
        log::debug!(
            "Aggregating {} tasks across {} projects",
            tasks.len(),
            projects.len()
        );
        Ok(compute_stats(&tasks, &projects, now))
    }

    /// Run one dashboard load against the shared `state`. The lock is held
    /// only to start and to apply the load, so loads may overlap. Returns
    /// false if a newer load started while this one was in flight.
    pub async fn refresh(&self, state: &Mutex<DashboardState>, now: DateTime<Utc>) -> bool {
        let ticket = lock_state(state).begin();
        let result = self.load_dashboard(now).await;
        if let Err(ref e) = result {
            log::warn!("Dashboard load failed: {e}");
        }
        lock_state(state).finish(ticket, result)
    }

    // ── Tasks ──────────────────────────────────────────────────────

    pub async fn list_tasks(&self, filters: &TaskFilters, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let tasks = self.store.list_tasks(&filters.to_query()).await?;
        Ok(filters.apply(tasks, now))
    }

    pub async fn create_task(&self, task: NewTask, now: DateTime<Utc>) -> Result<Task> {
        let task = task.prepare(now)?;
        self.store.create_task(&task).await
    }

    pub async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        update.validate()?;
        self.store.update_task(id, update).await
    }

    /// Move a task one step along todo → in progress → completed → todo.
    pub async fn advance_task(&self, id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self.store.get_task(id).await?;
        let next = task.status.next();
        log::info!("Task {id}: {} -> {next}", task.status);
        self.store
            .update_task(id, &TaskUpdate::new().status(next, now))
            .await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.store.delete_task(id).await
    }

    // ── Projects ───────────────────────────────────────────────────

    pub async fn list_projects(&self, filters: &ProjectFilters) -> Result<Vec<Project>> {
        let projects = self.store.list_projects().await?;
        Ok(filters.apply(projects))
    }

    pub async fn create_project(&self, project: NewProject) -> Result<Project> {
        let project = project.prepare()?;
        self.store.create_project(&project).await
    }

    pub async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Project> {
        update.validate()?;
        self.store.update_project(id, update).await
    }

    /// Completed ↔ active. An archived project becomes completed.
    pub async fn toggle_project_completed(&self, id: &str) -> Result<Project> {
        let project = self.store.get_project(id).await?;
        let update = ProjectUpdate::status(project.status.toggle_completed());
        self.store.update_project(id, &update).await
    }

    /// Archived ↔ active. A completed project becomes archived.
    pub async fn toggle_project_archived(&self, id: &str) -> Result<Project> {
        let project = self.store.get_project(id).await?;
        let update = ProjectUpdate::status(project.status.toggle_archived());
        self.store.update_project(id, &update).await
    }

    /// Delete a project. Its tasks stay, detached from any project.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.store.delete_project(id).await
    }

    // ── Config commands ────────────────────────────────────────────

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        config_get(&self.db, key).await
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        config_set(&self.db, key, value).await
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        config_list(&self.db).await
    }
}

// Config access that does not need a backend, so it works before one is
// configured.

pub async fn config_get(db: &Database, key: &str) -> Result<Option<String>> {
    db.reader()
        .call({
            let key = key.to_string();
            move |conn| repository::get_config(conn, &key)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

pub async fn config_set(db: &Database, key: &str, value: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Validation("config key must not be empty".into()));
    }
    db.writer()
        .call({
            let key = key.to_string();
            let value = value.to_string();
            move |conn| repository::set_config(conn, &key, &value)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

pub async fn config_unset(db: &Database, key: &str) -> Result<bool> {
    db.writer()
        .call({
            let key = key.to_string();
            move |conn| repository::delete_config(conn, &key)
        })
        .await
        .map_err(|e| Error::Database(e.to_string()))
}

pub async fn config_list(db: &Database) -> Result<Vec<(String, String)>> {
    db.reader()
        .call(|conn| repository::list_config(conn))
        .await
        .map_err(|e| Error::Database(e.to_string()))
}
