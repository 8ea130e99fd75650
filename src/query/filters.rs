use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};

use super::builder::TaskQuery;
use super::sort::{sort_by, ProjectSortKey, SortOrder, TaskSortKey};
use crate::date_util::{date_only, last_day_of_month, start_of_week};
use crate::error::{Error, Result};
use crate::model::{Priority, Project, ProjectStatus, Task, TaskStatus};

/// Due-date window evaluated against `now` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    Overdue,
    Today,
    ThisWeek,
    ThisMonth,
}

impl DueWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueWindow::Overdue => "overdue",
            DueWindow::Today => "today",
            DueWindow::ThisWeek => "this_week",
            DueWindow::ThisMonth => "this_month",
        }
    }

    /// Tasks without a due date never match.
    pub fn matches(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let Some(due) = task.due_date else {
            return false;
        };
        let today = date_only(now);
        let due_day = date_only(due);
        match self {
            DueWindow::Overdue => task.is_overdue(now),
            DueWindow::Today => due_day == today,
            DueWindow::ThisWeek => {
                let monday = start_of_week(today);
                due_day >= monday && due_day <= monday + Duration::days(6)
            }
            DueWindow::ThisMonth => {
                let first = today - Duration::days(today.day0() as i64);
                due_day >= first && due_day <= last_day_of_month(today.year(), today.month())
            }
        }
    }
}

impl fmt::Display for DueWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DueWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "overdue" => Ok(DueWindow::Overdue),
            "today" => Ok(DueWindow::Today),
            "this_week" | "week" => Ok(DueWindow::ThisWeek),
            "this_month" | "month" => Ok(DueWindow::ThisMonth),
            other => Err(Error::Parse(format!(
                "unknown due window '{other}' (expected overdue, today, this_week, this_month)"
            ))),
        }
    }
}

/// Filters for a task listing. The first four are evaluated by the backend,
/// the due window and ordering on the fetched rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<String>,
    pub search: Option<String>,
    pub due: Option<DueWindow>,
    pub sort_by: Option<TaskSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl TaskFilters {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.project_id.is_none()
            && self.search.as_deref().is_none_or(|s| s.trim().is_empty())
            && self.due.is_none()
    }

    pub fn to_query(&self) -> TaskQuery {
        let mut query = TaskQuery::new();
        if let Some(status) = self.status {
            query = query.status(status);
        }
        if let Some(priority) = self.priority {
            query = query.priority(priority);
        }
        if let Some(ref pid) = self.project_id {
            query = query.project(pid);
        }
        if let Some(ref text) = self.search {
            query = query.search(text);
        }
        query
    }

    /// Apply the client-side part of the filter to rows fetched with
    /// [`TaskFilters::to_query`].
    pub fn apply(&self, tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
        let mut tasks: Vec<Task> = match self.due {
            Some(window) => tasks.into_iter().filter(|t| window.matches(t, now)).collect(),
            None => tasks,
        };
        if let Some(key) = self.sort_by {
            sort_by(&mut tasks, key.comparator(), self.sort_order.unwrap_or_default());
        } else if self.sort_order == Some(SortOrder::Asc) {
            sort_by(&mut tasks, TaskSortKey::CreatedAt.comparator(), SortOrder::Asc);
        }
        tasks
    }
}

/// Filters for a project listing, all evaluated on the fetched rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilters {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub sort_by: Option<ProjectSortKey>,
    pub sort_order: Option<SortOrder>,
}

impl ProjectFilters {
    pub fn apply(&self, projects: Vec<Project>) -> Vec<Project> {
        let needle = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut projects: Vec<Project> = projects
            .into_iter()
            .filter(|p| self.status.is_none_or(|s| p.status == s))
            .filter(|p| match needle {
                Some(ref n) => {
                    p.name.to_lowercase().contains(n)
                        || p.description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(n))
                }
                None => true,
            })
            .collect();

        let key = self.sort_by.unwrap_or(ProjectSortKey::UpdatedAt);
        sort_by(&mut projects, key.comparator(), self.sort_order.unwrap_or_default());
        projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::fixtures::{now, project, task};

    fn due_in(id: &str, status: TaskStatus, days: i64) -> Task {
        let mut t = task(id, status, Priority::Medium);
        t.due_date = Some(now() + Duration::days(days));
        t
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_due_window_overdue_excludes_completed() {
        let open = due_in("a", TaskStatus::Todo, -2);
        let done = due_in("b", TaskStatus::Completed, -2);
        let later = due_in("c", TaskStatus::Todo, 2);
        let none = task("d", TaskStatus::Todo, Priority::Low);
        let w = DueWindow::Overdue;
        assert!(w.matches(&open, now()));
        assert!(!w.matches(&done, now()));
        assert!(!w.matches(&later, now()));
        assert!(!w.matches(&none, now()));

        let mut due_now = task("e", TaskStatus::Todo, Priority::Low);
        due_now.due_date = Some(now());
        assert!(!w.matches(&due_now, now()));
        due_now.due_date = Some(now() - Duration::seconds(1));
        assert!(w.matches(&due_now, now()));
    }

    #[test]
    fn test_due_window_today_and_week() {
        // now() is Saturday 2025-03-15; the week runs Mon 10th to Sun 16th.
        let today = due_in("a", TaskStatus::Todo, 0);
        let sunday = due_in("b", TaskStatus::Todo, 1);
        let next_monday = due_in("c", TaskStatus::Todo, 2);
        let this_monday = due_in("d", TaskStatus::Todo, -5);
        let last_sunday = due_in("e", TaskStatus::Todo, -6);

        assert!(DueWindow::Today.matches(&today, now()));
        assert!(!DueWindow::Today.matches(&sunday, now()));

        let w = DueWindow::ThisWeek;
        assert!(w.matches(&today, now()));
        assert!(w.matches(&sunday, now()));
        assert!(w.matches(&this_monday, now()));
        assert!(!w.matches(&next_monday, now()));
        assert!(!w.matches(&last_sunday, now()));
    }

    #[test]
    fn test_due_window_this_month() {
        let w = DueWindow::ThisMonth;
        assert!(w.matches(&due_in("a", TaskStatus::Completed, -14), now()));
        assert!(w.matches(&due_in("b", TaskStatus::Todo, 16), now()));
        assert!(!w.matches(&due_in("c", TaskStatus::Todo, 17), now()));
        assert!(!w.matches(&due_in("d", TaskStatus::Todo, -15), now()));
    }

    #[test]
    fn test_parse_due_window() {
        assert_eq!("this-week".parse::<DueWindow>().unwrap(), DueWindow::ThisWeek);
        assert_eq!("Today".parse::<DueWindow>().unwrap(), DueWindow::Today);
        assert!("tomorrow".parse::<DueWindow>().is_err());
    }

    #[test]
    fn test_task_filters_to_query() {
        let filters = TaskFilters {
            status: Some(TaskStatus::Todo),
            project_id: Some("p1".into()),
            search: Some("report".into()),
            due: Some(DueWindow::Today),
            ..Default::default()
        };
        let expected = TaskQuery::new()
            .status(TaskStatus::Todo)
            .project("p1")
            .search("report");
        assert_eq!(filters.to_query(), expected);
        assert!(!filters.is_empty());
        assert!(TaskFilters::default().is_empty());
    }

    #[test]
    fn test_task_filters_apply_due_and_sort() {
        let mut high = due_in("h", TaskStatus::Todo, 1);
        high.priority = Priority::High;
        let low = {
            let mut t = due_in("l", TaskStatus::Todo, 0);
            t.priority = Priority::Low;
            t
        };
        let outside = due_in("x", TaskStatus::Todo, 40);

        let filters = TaskFilters {
            due: Some(DueWindow::ThisWeek),
            sort_by: Some(TaskSortKey::Priority),
            ..Default::default()
        };
        let out = filters.apply(vec![low, outside, high], now());
        assert_eq!(ids(&out), vec!["h", "l"]);
    }

    #[test]
    fn test_task_filters_apply_keeps_backend_order_by_default() {
        let tasks = vec![
            task("b", TaskStatus::Todo, Priority::Low),
            task("a", TaskStatus::Todo, Priority::Low),
        ];
        let out = TaskFilters::default().apply(tasks, now());
        assert_eq!(ids(&out), vec!["b", "a"]);
    }

    #[test]
    fn test_project_filters() {
        let mut a = project("a", ProjectStatus::Active);
        a.name = "Website".into();
        a.updated_at = now() - Duration::days(3);
        let mut b = project("b", ProjectStatus::Active);
        b.description = Some("Redesign the WEBSITE header".into());
        b.updated_at = now() - Duration::days(1);
        let mut c = project("c", ProjectStatus::Archived);
        c.name = "Old website".into();
        let d = project("d", ProjectStatus::Active);

        let filters = ProjectFilters {
            search: Some("website".into()),
            ..Default::default()
        };
        let out = filters.apply(vec![a.clone(), b.clone(), c.clone(), d.clone()]);
        let got: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, vec!["b", "a", "c"]);

        let filters = ProjectFilters {
            status: Some(ProjectStatus::Active),
            search: Some("web".into()),
            sort_by: Some(ProjectSortKey::Name),
            sort_order: Some(SortOrder::Asc),
        };
        let out = filters.apply(vec![a, b, c, d]);
        let got: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(got, vec!["b", "a"]);
    }
}
