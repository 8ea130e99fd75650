use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::model::{Project, Task};

pub fn tasks_to_json(tasks: &[Task]) -> Result<String> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

pub fn projects_to_json(projects: &[Project]) -> Result<String> {
    Ok(serde_json::to_string_pretty(projects)?)
}

/// One row per task. `is_overdue` is evaluated against `now`.
pub fn tasks_to_csv(tasks: &[Task], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("id,title,status,priority,due_date,completed_at,project_id,project_name,is_overdue,created_at,updated_at\n");
    for task in tasks {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(&task.id),
            csv_escape(&task.title),
            task.status,
            task.priority,
            task.due_date.map(timestamp).unwrap_or_default(),
            task.completed_at.map(timestamp).unwrap_or_default(),
            csv_escape(task.project_id.as_deref().unwrap_or("")),
            csv_escape(task.project.as_ref().map_or("", |p| p.name.as_str())),
            task.is_overdue(now),
            timestamp(task.created_at),
            timestamp(task.updated_at),
        ));
    }
    out
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
