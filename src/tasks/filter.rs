//! Task list filtering and ordering for the task board.

use serde::Deserialize;
use std::cmp::Ordering;

use super::model::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Everything not yet done
    #[default]
    Active,
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    /// `active`, `all`, or a status name as the backend spells it
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(StatusFilter::Active),
            "all" => Some(StatusFilter::All),
            other => serde_json::from_value(serde_json::Value::String(other.to_string()))
                .ok()
                .map(StatusFilter::Only),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    /// `None` = all categories
    pub category_id: Option<i64>,
    /// `None` = all priorities
    pub priority: Option<TaskPriority>,
    pub search: String,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_status(task)
            && self.matches_category(task)
            && self.matches_priority(task)
            && self.matches_search(task)
    }

    fn matches_status(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::Active => !task.status.is_done(),
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status == status,
        }
    }

    fn matches_category(&self, task: &Task) -> bool {
        match self.category_id {
            None => true,
            Some(id) => task.category.as_ref().map(|c| c.category_id) == Some(id),
        }
    }

    fn matches_priority(&self, task: &Task) -> bool {
        self.priority
            .is_none_or(|priority| task.effective_priority() == priority)
    }

    fn matches_search(&self, task: &Task) -> bool {
        if self.search.trim().is_empty() {
            return true;
        }

        let q = self.search.to_lowercase();
        let description = task.description.as_deref().unwrap_or_default();
        let category = task.category.as_ref().map(|c| c.name.as_str()).unwrap_or_default();

        task.title.to_lowercase().contains(&q)
            || description.to_lowercase().contains(&q)
            || category.to_lowercase().contains(&q)
    }

    /// Back to the defaults for one facet
    pub fn clear(&mut self, facet: Facet) {
        match facet {
            Facet::Status => self.status = StatusFilter::Active,
            Facet::Category => self.category_id = None,
            Facet::Priority => self.priority = None,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Status,
    Category,
    Priority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    DueDate,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl TaskSort {
    /// Tasks without the sort date go last ascending and first descending.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let (a_at, b_at) = match self.key {
            SortKey::DueDate => (a.due_at(), b.due_at()),
            SortKey::CreatedAt => (a.created(), b.created()),
        };

        let ordering = match (a_at, b_at) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(&b),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Filtered, stably sorted view of `tasks`
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter, sort: TaskSort) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();
    visible.sort_by(|a, b| sort.compare(a, b));
    visible
}
