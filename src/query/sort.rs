//! Closed sort keys for task and project listings.
//!
//! Each key maps to exactly one comparator; there is no lookup by field name.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::model::{Project, Task};

pub type Comparator<T> = fn(&T, &T) -> Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::Parse(format!("unknown sort order '{other}' (expected asc, desc)"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
}

impl TaskSortKey {
    pub fn comparator(self) -> Comparator<Task> {
        match self {
            TaskSortKey::CreatedAt => |a: &Task, b: &Task| a.created_at.cmp(&b.created_at),
            TaskSortKey::UpdatedAt => |a: &Task, b: &Task| a.updated_at.cmp(&b.updated_at),
            TaskSortKey::DueDate => |a: &Task, b: &Task| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            TaskSortKey::Priority => |a: &Task, b: &Task| a.priority.cmp(&b.priority),
            TaskSortKey::Title => {
                |a: &Task, b: &Task| a.title.to_lowercase().cmp(&b.title.to_lowercase())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskSortKey::CreatedAt => "created_at",
            TaskSortKey::UpdatedAt => "updated_at",
            TaskSortKey::DueDate => "due_date",
            TaskSortKey::Priority => "priority",
            TaskSortKey::Title => "title",
        }
    }
}

impl fmt::Display for TaskSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "created_at" | "created" => Ok(TaskSortKey::CreatedAt),
            "updated_at" | "updated" => Ok(TaskSortKey::UpdatedAt),
            "due_date" | "due" => Ok(TaskSortKey::DueDate),
            "priority" => Ok(TaskSortKey::Priority),
            "title" => Ok(TaskSortKey::Title),
            other => Err(Error::Parse(format!(
                "unknown task sort key '{other}' (expected created_at, updated_at, due_date, priority, title)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSortKey {
    CreatedAt,
    UpdatedAt,
    Name,
}

impl ProjectSortKey {
    pub fn comparator(self) -> Comparator<Project> {
        match self {
            ProjectSortKey::CreatedAt => {
                |a: &Project, b: &Project| a.created_at.cmp(&b.created_at)
            }
            ProjectSortKey::UpdatedAt => {
                |a: &Project, b: &Project| a.updated_at.cmp(&b.updated_at)
            }
            ProjectSortKey::Name => {
                |a: &Project, b: &Project| a.name.to_lowercase().cmp(&b.name.to_lowercase())
            }
        }
    }
}

impl FromStr for ProjectSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "created_at" | "created" => Ok(ProjectSortKey::CreatedAt),
            "updated_at" | "updated" => Ok(ProjectSortKey::UpdatedAt),
            "name" => Ok(ProjectSortKey::Name),
            other => Err(Error::Parse(format!(
                "unknown project sort key '{other}' (expected created_at, updated_at, name)"
            ))),
        }
    }
}

/// Stable sort of `items` by `cmp`, reversed for descending order.
pub fn sort_by<T>(items: &mut [T], cmp: Comparator<T>, order: SortOrder) {
    match order {
        SortOrder::Asc => items.sort_by(cmp),
        SortOrder::Desc => items.sort_by(|a, b| cmp(b, a)),
    }
}
