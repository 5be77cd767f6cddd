//! Task, category and dashboard types as exchanged with the backend API.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Offset applied to due dates entered without one (WIB, UTC+7)
pub const LOCAL_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    #[serde(rename = "pending")]
    Pending,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task_id", alias = "id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Task {
    /// Priority, with tasks that never set one treated as `Medium`
    pub fn effective_priority(&self) -> TaskPriority {
        self.priority.unwrap_or_default()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date.as_deref().and_then(parse_timestamp)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parse a backend timestamp: RFC 3339, or a naive `YYYY-MM-DD[ HH:MM[:SS]]`
/// read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    parse_naive(s).map(|naive| naive.and_utc())
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn to_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),
}

/// Task form contents, before validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub category_id: Option<i64>,
    /// `YYYY-MM-DDTHH:MM` as entered, or a full RFC 3339 timestamp
    pub due_date: Option<String>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            category_id: None,
            due_date: None,
        }
    }
}

impl TaskDraft {
    /// Draft pre-filled from an existing task, for editing
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.effective_priority(),
            category_id: task.category.as_ref().map(|c| c.category_id),
            due_date: task.due_date.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::TitleRequired);
        }
        if let Some(raw) = self.due_date.as_deref() {
            local_due_date(raw)?;
        }
        Ok(())
    }

    /// Backend body for `POST /tasks` and `PUT /tasks/{id}`
    pub fn into_payload(
        self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<TaskPayload, TaskValidationError> {
        self.validate()?;

        let due_date = match self.due_date.as_deref() {
            Some(raw) => local_due_date(raw)?,
            None => None,
        };

        Ok(TaskPayload {
            title: self.title.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            status: self.status,
            user_id,
            category_id: self.category_id.unwrap_or(0),
            priority: self.priority,
            due_date,
            completed_at: self.status.is_done().then(|| to_iso(now)),
        })
    }
}

/// Interpret an entered due date; values without an offset are local time.
fn local_due_date(raw: &str) -> Result<Option<String>, TaskValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(to_iso(dt.with_timezone(&Utc))));
    }

    let offset = FixedOffset::east_opt(LOCAL_OFFSET_SECS)
        .ok_or_else(|| TaskValidationError::InvalidDueDate(s.to_string()))?;

    parse_naive(s)
        .and_then(|naive| naive.and_local_timezone(offset).single())
        .map(|dt| Some(to_iso(dt.with_timezone(&Utc))))
        .ok_or_else(|| TaskValidationError::InvalidDueDate(s.to_string()))
}

/// Write body for tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub user_id: i64,
    /// 0 means uncategorized
    pub category_id: i64,
    pub priority: TaskPriority,
    pub due_date: Option<String>,
    pub completed_at: Option<String>,
}

/// Payload that marks `task` done, keeping everything else
pub fn mark_done(task: &Task, user_id: i64, now: DateTime<Utc>) -> TaskPayload {
    TaskPayload {
        title: task.title.clone(),
        description: Some(task.description.clone().unwrap_or_default()),
        status: TaskStatus::Done,
        user_id,
        category_id: task.category.as_ref().map(|c| c.category_id).unwrap_or(0),
        priority: task.effective_priority(),
        due_date: task.due_at().map(to_iso),
        completed_at: Some(to_iso(now)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityStats {
    pub priority: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category_name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub total: u64,
    pub completed: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tasks: u64,
    pub tasks_by_priority: Vec<PriorityStats>,
    pub tasks_by_category: Vec<CategoryStats>,
    pub completion_stats: CompletionStats,
    pub tasks_due_today: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub data: WeatherData,
    pub last_sync: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub main: WeatherMain,
    pub weather: Vec<WeatherCondition>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMain {
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl WeatherReport {
    pub fn temperature(&self) -> i64 {
        self.data.main.temp.round() as i64
    }

    pub fn icon_url(&self) -> Option<String> {
        self.data
            .weather
            .first()
            .map(|w| format!("https://openweathermap.org/img/wn/{}@4x.png", w.icon))
    }
}
