pub mod builder;
pub mod filters;
pub mod output;
pub mod sort;

pub use builder::TaskQuery;
pub use filters::{DueWindow, ProjectFilters, TaskFilters};
pub use sort::{ProjectSortKey, SortOrder, TaskSortKey};
