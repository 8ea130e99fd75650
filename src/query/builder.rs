use crate::model::{Priority, TaskStatus};

/// Columns selected for task rows, with the owning project embedded.
pub const TASK_SELECT: &str = "*,project:projects(*)";

/// Builder for the backend side of a task listing: the filters the store
/// evaluates itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    project_id: Option<String>,
    search: Option<String>,
    order_by: String,
    order_desc: bool,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            project_id: None,
            search: None,
            order_by: "created_at".to_string(),
            order_desc: true,
        }
    }
}

impl TaskQuery {
    /// All tasks, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn project(mut self, id: &str) -> Self {
        self.project_id = Some(id.to_string());
        self
    }

    /// Case-insensitive substring match over title or description.
    /// Blank input is ignored.
    pub fn search(mut self, text: &str) -> Self {
        let text = text.trim();
        self.search = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = column.to_string();
        self
    }

    pub fn ascending(mut self) -> Self {
        self.order_desc = false;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order_desc = true;
        self
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Query-string pairs in the store's filter syntax.
    pub fn build_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), TASK_SELECT.to_string())];

        if let Some(status) = self.status {
            params.push(("status".into(), format!("eq.{status}")));
        }
        if let Some(priority) = self.priority {
            params.push(("priority".into(), format!("eq.{priority}")));
        }
        if let Some(ref pid) = self.project_id {
            params.push(("project_id".into(), format!("eq.{pid}")));
        }
        if let Some(ref text) = self.search {
            let pattern = quote_filter_value(&format!("*{text}*"));
            params.push((
                "or".into(),
                format!("(title.ilike.{pattern},description.ilike.{pattern})"),
            ));
        }

        let dir = if self.order_desc { "desc" } else { "asc" };
        params.push(("order".into(), format!("{}.{dir}", self.order_by)));
        params
    }
}

/// Double-quote a filter value so commas, dots and parentheses in user text
/// are not read as filter syntax.
fn quote_filter_value(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
