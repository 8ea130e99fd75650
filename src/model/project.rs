use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_text, validate_color};
use crate::date_util::deserialize_timestamp;
use crate::error::{Error, Result};

pub const DEFAULT_PROJECT_COLOR: &str = "#3B82F6";

/// Palette offered when creating a project.
pub const PROJECT_COLORS: [&str; 10] = [
    "#3B82F6", "#EF4444", "#10B981", "#F59E0B", "#8B5CF6", "#06B6D4", "#EC4899", "#84CC16",
    "#F97316", "#6366F1",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        }
    }

    /// Completed ↔ active; archived projects become completed.
    pub fn toggle_completed(&self) -> ProjectStatus {
        match self {
            ProjectStatus::Completed => ProjectStatus::Active,
            _ => ProjectStatus::Completed,
        }
    }

    /// Archived ↔ active; completed projects become archived.
    pub fn toggle_archived(&self) -> ProjectStatus {
        match self {
            ProjectStatus::Archived => ProjectStatus::Active,
            _ => ProjectStatus::Archived,
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            other => Err(Error::Parse(format!(
                "unknown project status '{other}' (expected active, completed, archived)"
            ))),
        }
    }
}

/// A project row as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Set by the stats aggregator; never sent to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_tasks: Option<u64>,
}

fn default_color() -> String {
    DEFAULT_PROJECT_COLOR.to_string()
}

/// Insert payload for a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub color: String,
    pub status: ProjectStatus,
}

impl NewProject {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            color: default_color(),
            status: ProjectStatus::Active,
        }
    }

    pub fn prepare(mut self) -> Result<Self> {
        self.name = require_text("name", &self.name)?;
        self.description = self.description.trim().to_string();
        validate_color(&self.color)?;
        Ok(self)
    }
}

/// Partial update for a project; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

impl ProjectUpdate {
    pub fn status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("nothing to update".into()));
        }
        if let Some(ref name) = self.name {
            require_text("name", name)?;
        }
        if let Some(ref color) = self.color {
            validate_color(color)?;
        }
        Ok(())
    }
}
