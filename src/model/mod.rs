pub mod project;
pub mod task;

pub use project::{NewProject, Project, ProjectStatus, ProjectUpdate, DEFAULT_PROJECT_COLOR, PROJECT_COLORS};
pub use task::{NewTask, Priority, Task, TaskStatus, TaskUpdate};

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static RE_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());
// Row ids end up inside filter strings like `id=eq.<id>`, so keep them to a
// conservative character set.
static RE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// Validate a display color of the form `#RRGGBB`.
pub fn validate_color(color: &str) -> Result<()> {
    if RE_COLOR.is_match(color) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "color must look like #RRGGBB, got '{color}'"
        )))
    }
}

/// Validate a row identifier before it is placed in a backend filter.
pub fn validate_id(id: &str) -> Result<()> {
    if RE_ID.is_match(id) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(id.to_string()))
    }
}

/// Trim `value` and reject it if nothing is left.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::Validation(format!("{field} must not be empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#3B82F6").is_ok());
        assert!(validate_color("#abcdef").is_ok());
        assert!(validate_color("3B82F6").is_err());
        assert!(validate_color("#3B82F").is_err());
        assert!(validate_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("6f1c2d3e-1111-4a2b-9c3d-abcdefabcdef").is_ok());
        assert!(validate_id("42").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("a,b").is_err());
        assert!(validate_id("id with space").is_err());
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("name", "  Launch  ").unwrap(), "Launch");
        assert!(require_text("name", "   ").is_err());
    }
}
