use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Priority, Project};

/// Tasks created and completed on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub created: u64,
    pub completed: u64,
}

/// Open (non-completed) tasks by priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl PriorityBreakdown {
    pub fn total(&self) -> u64 {
        self.high + self.medium + self.low
    }

    pub fn get(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Percentage of open tasks at `priority`; 0 when there are none.
    pub fn share(&self, priority: Priority) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.get(priority) as f64 / total as f64 * 100.0
        }
    }

    pub(crate) fn increment(&mut self, priority: Priority) {
        match priority {
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

/// Completion of a single project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectProgress {
    /// The project, annotated with `task_count` and `completed_tasks`.
    pub project: Project,
    pub completion_percentage: u32,
    pub task_count: u64,
    pub completed_tasks: u64,
}

/// Everything the dashboard shows, derived from one snapshot of tasks and projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub in_progress_tasks: u64,
    pub pending_tasks: u64,
    /// Open tasks past due. Overlaps the pending and in-progress counts.
    pub overdue_tasks: u64,
    pub total_projects: u64,
    pub active_projects: u64,
    pub completed_projects: u64,
    pub completion_rate: u32,
    /// 30 buckets, oldest first, ending today.
    pub productivity_trend: Vec<DailyActivity>,
    pub priority_breakdown: PriorityBreakdown,
    /// One entry per project, in the order the backend returned them.
    pub project_progress: Vec<ProjectProgress>,
}
