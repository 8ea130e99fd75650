//! Figures the dashboard derives from aggregator output.

use serde::Serialize;

use super::types::{DailyActivity, ProjectProgress};
use crate::model::ProjectStatus;

/// Completed tasks in the last 7 buckets against the 7 before them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyChange {
    pub last_week: u64,
    pub previous_week: u64,
    /// Percent change; 0 when the previous week had no completions.
    pub percent: f64,
}

impl WeeklyChange {
    pub fn is_unchanged(&self) -> bool {
        self.percent == 0.0
    }

    pub fn label(&self) -> String {
        if self.is_unchanged() {
            "No change".to_string()
        } else {
            format!("{:+.1}%", self.percent)
        }
    }
}

pub fn weekly_change(trend: &[DailyActivity]) -> WeeklyChange {
    let len = trend.len();
    let last_start = len.saturating_sub(7);
    let prev_start = len.saturating_sub(14);
    let last_week = sum_completed(&trend[last_start..]);
    let previous_week = sum_completed(&trend[prev_start..last_start]);

    let percent = if previous_week == 0 {
        0.0
    } else {
        (last_week as f64 - previous_week as f64) / previous_week as f64 * 100.0
    };

    WeeklyChange {
        last_week,
        previous_week,
        percent,
    }
}

fn sum_completed(days: &[DailyActivity]) -> u64 {
    days.iter().map(|d| d.completed).sum()
}

/// Today's bucket minus yesterday's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayOverDay {
    pub created: i64,
    pub completed: i64,
}

pub fn day_over_day(trend: &[DailyActivity]) -> DayOverDay {
    match trend {
        [.., yesterday, today] => DayOverDay {
            created: today.created as i64 - yesterday.created as i64,
            completed: today.completed as i64 - yesterday.completed as i64,
        },
        _ => DayOverDay::default(),
    }
}

/// Largest single-day value across both series, at least 1. Used to scale charts.
pub fn trend_peak(trend: &[DailyActivity]) -> u64 {
    trend
        .iter()
        .map(|d| d.created.max(d.completed))
        .max()
        .unwrap_or(0)
        .max(1)
}

/// Active projects ordered by completion, highest first, at most `limit`.
/// Ties keep their original order.
pub fn top_active_projects(progress: &[ProjectProgress], limit: usize) -> Vec<&ProjectProgress> {
    let mut active: Vec<&ProjectProgress> = progress
        .iter()
        .filter(|p| p.project.status == ProjectStatus::Active)
        .collect();
    active.sort_by(|a, b| b.completion_percentage.cmp(&a.completion_percentage));
    active.truncate(limit);
    active
}
