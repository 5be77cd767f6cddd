//! Task board: backend task types, the task form and list filtering.

pub mod filter;
pub mod model;

pub use filter::{Facet, SortDirection, SortKey, StatusFilter, TaskFilter, TaskSort, visible_tasks};
pub use model::{
    Category, DashboardStats, Task, TaskDraft, TaskPayload, TaskPriority, TaskStatus,
    TaskValidationError, WeatherReport, mark_done,
};
