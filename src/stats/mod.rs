pub mod state;
pub mod trend;
pub mod types;

pub use state::{DashboardState, FetchTicket, LoadState};
pub use trend::{day_over_day, top_active_projects, trend_peak, weekly_change, DayOverDay, WeeklyChange};
pub use types::*;

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::date_util::date_only;
use crate::model::{Project, ProjectStatus, Task, TaskStatus};

/// Number of daily buckets in the productivity trend.
pub const TREND_DAYS: i64 = 30;

/// Compute dashboard statistics from a snapshot of tasks and projects.
///
/// Pure and deterministic for a given `now`. Day buckets use UTC calendar
/// dates for both the bucket boundaries and the task timestamps.
pub fn compute_stats(tasks: &[Task], projects: &[Project], now: DateTime<Utc>) -> DashboardStats {
    let total_tasks = tasks.len() as u64;
    let mut completed_tasks = 0u64;
    let mut in_progress_tasks = 0u64;
    let mut pending_tasks = 0u64;
    for task in tasks {
        match task.status {
            TaskStatus::Completed => completed_tasks += 1,
            TaskStatus::InProgress => in_progress_tasks += 1,
            TaskStatus::Todo => pending_tasks += 1,
        }
    }
    let overdue_tasks = tasks.iter().filter(|t| t.is_overdue(now)).count() as u64;

    let total_projects = projects.len() as u64;
    let active_projects = count_projects(projects, ProjectStatus::Active);
    let completed_projects = count_projects(projects, ProjectStatus::Completed);

    DashboardStats {
        total_tasks,
        completed_tasks,
        in_progress_tasks,
        pending_tasks,
        overdue_tasks,
        total_projects,
        active_projects,
        completed_projects,
        completion_rate: percent(completed_tasks, total_tasks),
        productivity_trend: productivity_trend(tasks, now),
        priority_breakdown: priority_breakdown(tasks),
        project_progress: project_progress(tasks, projects),
    }
}

/// Integer percentage rounded half up; 0 when `whole` is 0.
pub fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (whole * 2)) as u32
}

fn count_projects(projects: &[Project], status: ProjectStatus) -> u64 {
    projects.iter().filter(|p| p.status == status).count() as u64
}

fn productivity_trend(tasks: &[Task], now: DateTime<Utc>) -> Vec<DailyActivity> {
    let mut created: HashMap<NaiveDate, u64> = HashMap::new();
    let mut completed: HashMap<NaiveDate, u64> = HashMap::new();
    for task in tasks {
        *created.entry(date_only(task.created_at)).or_default() += 1;
        if let Some(done) = task.completed_at {
            *completed.entry(date_only(done)).or_default() += 1;
        }
    }

    let today = date_only(now);
    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            DailyActivity {
                date,
                created: created.get(&date).copied().unwrap_or(0),
                completed: completed.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

fn priority_breakdown(tasks: &[Task]) -> PriorityBreakdown {
    let mut breakdown = PriorityBreakdown::default();
    for task in tasks.iter().filter(|t| !t.is_completed()) {
        breakdown.increment(task.priority);
    }
    breakdown
}

fn project_progress(tasks: &[Task], projects: &[Project]) -> Vec<ProjectProgress> {
    // project_id -> (total, completed)
    let mut counts: HashMap<&str, (u64, u64)> = HashMap::new();
    for task in tasks {
        if let Some(ref pid) = task.project_id {
            let entry = counts.entry(pid.as_str()).or_default();
            entry.0 += 1;
            if task.is_completed() {
                entry.1 += 1;
            }
        }
    }

    projects
        .iter()
        .map(|project| {
            let (task_count, completed_tasks) =
                counts.get(project.id.as_str()).copied().unwrap_or((0, 0));
            let mut annotated = project.clone();
            annotated.task_count = Some(task_count);
            annotated.completed_tasks = Some(completed_tasks);
            ProjectProgress {
                project: annotated,
                completion_percentage: percent(completed_tasks, task_count),
                task_count,
                completed_tasks,
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::{now, project, task};
    use super::*;
    use crate::model::Priority;
    use chrono::TimeZone;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(6, 10), 60);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(percent(5, 5), 100);
    }

    #[test]
    fn test_empty_inputs() {
        let stats = compute_stats(&[], &[], now());
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completed_tasks, 0);
        assert_eq!(stats.in_progress_tasks, 0);
        assert_eq!(stats.pending_tasks, 0);
        assert_eq!(stats.overdue_tasks, 0);
        assert_eq!(stats.total_projects, 0);
        assert_eq!(stats.active_projects, 0);
        assert_eq!(stats.completed_projects, 0);
        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.productivity_trend.len(), 30);
        assert!(stats
            .productivity_trend
            .iter()
            .all(|d| d.created == 0 && d.completed == 0));
        assert_eq!(stats.priority_breakdown, PriorityBreakdown::default());
        assert!(stats.project_progress.is_empty());
    }

    #[test]
    fn test_ten_tasks_two_projects() {
        let mut tasks = Vec::new();
        for i in 0..6 {
            let mut t = task(&format!("c{i}"), TaskStatus::Completed, Priority::High);
            t.project_id = Some("p1".into());
            tasks.push(t);
        }
        for i in 0..3 {
            let mut t = task(&format!("i{i}"), TaskStatus::InProgress, Priority::Medium);
            t.project_id = Some("p2".into());
            tasks.push(t);
        }
        tasks.push(task("t0", TaskStatus::Todo, Priority::Low));
        let projects = vec![
            project("p1", ProjectStatus::Active),
            project("p2", ProjectStatus::Completed),
        ];

        let stats = compute_stats(&tasks, &projects, now());
        assert_eq!(stats.total_tasks, 10);
        assert_eq!(stats.completion_rate, 60);
        assert_eq!(stats.pending_tasks, 1);
        assert_eq!(stats.in_progress_tasks, 3);
        assert_eq!(
            stats.total_tasks,
            stats.completed_tasks + stats.in_progress_tasks + stats.pending_tasks
        );
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 1);

        // Completed tasks are excluded from the priority breakdown
        assert_eq!(stats.priority_breakdown.high, 0);
        assert_eq!(stats.priority_breakdown.medium, 3);
        assert_eq!(stats.priority_breakdown.low, 1);
        assert_eq!(stats.priority_breakdown.total(), 4);
    }

    #[test]
    fn test_overdue_overlaps_pending() {
        let mut t = task("late", TaskStatus::Todo, Priority::Medium);
        t.due_date = Some(now() - Duration::days(1));
        let stats = compute_stats(&[t], &[], now());
        assert_eq!(stats.overdue_tasks, 1);
        assert_eq!(stats.pending_tasks, 1);
    }

    #[test]
    fn test_overdue_skips_completed_and_future() {
        let mut done = task("done", TaskStatus::Completed, Priority::Low);
        done.due_date = Some(now() - Duration::days(3));
        let mut future = task("future", TaskStatus::InProgress, Priority::Low);
        future.due_date = Some(now() + Duration::hours(1));
        let no_due = task("none", TaskStatus::Todo, Priority::Low);
        let mut due_now = task("now", TaskStatus::Todo, Priority::Low);
        due_now.due_date = Some(now());
        let stats = compute_stats(&[done, future, no_due, due_now.clone()], &[], now());
        assert_eq!(stats.overdue_tasks, 0);

        let mut just_past = due_now;
        just_past.due_date = Some(now() - Duration::seconds(1));
        let stats = compute_stats(&[just_past], &[], now());
        assert_eq!(stats.overdue_tasks, 1);
    }

    #[test]
    fn test_trend_shape() {
        let stats = compute_stats(&[], &[], now());
        let trend = &stats.productivity_trend;
        assert_eq!(trend.len(), 30);
        assert_eq!(trend.last().unwrap().date, now().date_naive());
        assert_eq!(trend[0].date, now().date_naive() - Duration::days(29));
        for pair in trend.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn test_trend_oldest_bucket_inclusive() {
        let mut oldest = task("old", TaskStatus::Todo, Priority::Low);
        // Date component is now - 29 days; time of day earlier than now
        oldest.created_at = Utc.with_ymd_and_hms(2025, 2, 14, 0, 5, 0).unwrap();
        let mut too_old = task("older", TaskStatus::Todo, Priority::Low);
        too_old.created_at = Utc.with_ymd_and_hms(2025, 2, 13, 23, 59, 59).unwrap();

        let stats = compute_stats(&[oldest, too_old], &[], now());
        assert_eq!(stats.productivity_trend[0].date.to_string(), "2025-02-14");
        assert_eq!(stats.productivity_trend[0].created, 1);
        let total_created: u64 = stats.productivity_trend.iter().map(|d| d.created).sum();
        assert_eq!(total_created, 1);
        assert!(total_created <= stats.total_tasks);
    }

    #[test]
    fn test_trend_counts_created_and_completed_by_day() {
        let mut a = task("a", TaskStatus::Completed, Priority::Low);
        a.created_at = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        a.completed_at = Some(Utc.with_ymd_and_hms(2025, 3, 15, 1, 0, 0).unwrap());
        let mut b = task("b", TaskStatus::Todo, Priority::Low);
        b.created_at = Utc.with_ymd_and_hms(2025, 3, 15, 23, 0, 0).unwrap();

        let stats = compute_stats(&[a, b], &[], now());
        let today = stats.productivity_trend.last().unwrap();
        assert_eq!(today.created, 1);
        assert_eq!(today.completed, 1);
        let mar10 = stats
            .productivity_trend
            .iter()
            .find(|d| d.date.to_string() == "2025-03-10")
            .unwrap();
        assert_eq!(mar10.created, 1);
        assert_eq!(mar10.completed, 0);
    }

    #[test]
    fn test_project_progress_preserves_order_and_annotates() {
        let mut t1 = task("t1", TaskStatus::Completed, Priority::Low);
        t1.project_id = Some("p2".into());
        let mut t2 = task("t2", TaskStatus::Todo, Priority::Low);
        t2.project_id = Some("p2".into());
        let mut t3 = task("t3", TaskStatus::Todo, Priority::Low);
        t3.project_id = Some("p2".into());
        let orphan = task("t4", TaskStatus::Completed, Priority::Low);

        let projects = vec![
            project("p1", ProjectStatus::Archived),
            project("p2", ProjectStatus::Active),
        ];
        let stats = compute_stats(&[t1, t2, t3, orphan], &projects, now());

        assert_eq!(stats.project_progress.len(), 2);
        let p1 = &stats.project_progress[0];
        assert_eq!(p1.project.id, "p1");
        assert_eq!(p1.task_count, 0);
        assert_eq!(p1.completion_percentage, 0);
        assert_eq!(p1.project.task_count, Some(0));

        let p2 = &stats.project_progress[1];
        assert_eq!(p2.project.id, "p2");
        assert_eq!(p2.task_count, 3);
        assert_eq!(p2.completed_tasks, 1);
        assert_eq!(p2.completion_percentage, 33);
        assert_eq!(p2.project.completed_tasks, Some(1));

        // Archived projects count toward the total only
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 0);
    }

    #[test]
    fn test_idempotent() {
        let mut t = task("a", TaskStatus::InProgress, Priority::High);
        t.due_date = Some(now() - Duration::days(2));
        t.project_id = Some("p1".into());
        let tasks = vec![t, task("b", TaskStatus::Completed, Priority::Low)];
        let projects = vec![project("p1", ProjectStatus::Active)];
        let first = compute_stats(&tasks, &projects, now());
        let second = compute_stats(&tasks, &projects, now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_serializes_with_expected_field_names() {
        let stats = compute_stats(&[], &[project("p1", ProjectStatus::Active)], now());
        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["completion_rate"], 0);
        assert_eq!(v["productivity_trend"][29]["date"], "2025-03-15");
        assert_eq!(v["priority_breakdown"]["high"], 0);
        assert_eq!(v["project_progress"][0]["project"]["task_count"], 0);
    }
}
