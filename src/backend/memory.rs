//! In-memory `DataStore` for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use super::DataStore;
use crate::error::{Error, Result};
use crate::model::{NewProject, NewTask, Project, ProjectUpdate, Task, TaskUpdate};
use crate::query::TaskQuery;

#[derive(Default)]
pub struct MemoryStore {
    pub tasks: Mutex<Vec<Task>>,
    pub projects: Mutex<Vec<Project>>,
    /// When set, `list_tasks` fails with this backend message.
    pub fail_tasks: Mutex<Option<String>>,
    /// When set, `list_projects` fails with this backend message.
    pub fail_projects: Mutex<Option<String>>,
    pub clock: Mutex<Option<DateTime<Utc>>>,
    /// Each `list_tasks` call takes the next gate, if any, and waits on it.
    /// A message sent through the gate fails that call.
    pub gates: Mutex<VecDeque<oneshot::Receiver<Option<String>>>>,
}

impl MemoryStore {
    pub fn with(tasks: Vec<Task>, projects: Vec<Project>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            projects: Mutex::new(projects),
            ..Default::default()
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.lock().unwrap().unwrap_or_else(Utc::now)
    }

    fn denied(message: &Option<String>) -> Result<()> {
        match message {
            Some(m) => Err(Error::Api {
                status: 403,
                message: m.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        Self::denied(&self.fail_projects.lock().unwrap())?;
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn get_project(&self, id: &str) -> Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("project {id}")))
    }

    async fn create_project(&self, project: &NewProject) -> Result<Project> {
        let now = self.now();
        let mut projects = self.projects.lock().unwrap();
        let created = Project {
            id: format!("p{}", projects.len() + 1),
            name: project.name.clone(),
            description: Some(project.description.clone()),
            color: project.color.clone(),
            status: project.status,
            user_id: Some("u1".into()),
            created_at: now,
            updated_at: now,
            task_count: None,
            completed_tasks: None,
        };
        projects.insert(0, created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Project> {
        let now = self.now();
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("project {id}")))?;
        if let Some(ref name) = update.name {
            project.name = name.clone();
        }
        if let Some(ref description) = update.description {
            project.description = Some(description.clone());
        }
        if let Some(ref color) = update.color {
            project.color = color.clone();
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        project.updated_at = now;
        Ok(project.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<()> {
        self.projects.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            if let Ok(message) = gate.await {
                Self::denied(&message)?;
            }
        }
        Self::denied(&self.fail_tasks.lock().unwrap())?;
        let tasks = self.tasks.lock().unwrap();
        Ok(match query.project_id() {
            Some(pid) => tasks
                .iter()
                .filter(|t| t.project_id.as_deref() == Some(pid))
                .cloned()
                .collect(),
            None => tasks.clone(),
        })
    }

    async fn get_task(&self, id: &str) -> Result<Task> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("task {id}")))
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        let now = self.now();
        let mut tasks = self.tasks.lock().unwrap();
        let created = Task {
            id: format!("t{}", tasks.len() + 1),
            title: task.title.clone(),
            description: Some(task.description.clone()),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            completed_at: task.completed_at,
            project_id: task.project_id.clone(),
            user_id: Some("u1".into()),
            created_at: now,
            updated_at: now,
            project: None,
        };
        tasks.insert(0, created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        let now = self.now();
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
        if let Some(ref title) = update.title {
            task.title = title.clone();
        }
        if let Some(ref description) = update.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due) = update.due_date {
            task.due_date = due;
        }
        if let Some(ref pid) = update.project_id {
            task.project_id = pid.clone();
        }
        if let Some(completed_at) = update.completed_at {
            task.completed_at = completed_at;
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<()> {
        self.tasks.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}
