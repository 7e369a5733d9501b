use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Rejects titles that are empty once surrounding whitespace is removed, and titles
/// containing NUL, which PostgreSQL text columns cannot store.
fn validate_title_text(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("Title cannot be empty or whitespace only"));
        return Err(error);
    }
    if title.contains('\0') {
        let mut error = ValidationError::new("nul_character");
        error.message = Some(Cow::from("Title cannot contain NUL characters"));
        return Err(error);
    }
    Ok(())
}

/// Payload for `POST /todos`.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskCreate {
    /// 1 to 255 characters, not blank. Stored trimmed.
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1-255 characters"),
        custom = "validate_title_text"
    )]
    pub title: String,
}

impl TaskCreate {
    pub fn normalized_title(&self) -> &str {
        self.title.trim()
    }
}

/// Payload for `PUT /todos/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskUpdate {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1-255 characters"),
        custom = "validate_title_text"
    )]
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn normalized_title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim)
    }
}

/// A task row, as stored and as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq, ToSchema)]
pub struct Task {
    pub id: Uuid,
    /// Owner. Always the `sub` of the token that created it.
    pub user_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

/// Query string for `GET /todos`.
#[derive(Debug, Serialize, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Only tasks with this completion state.
    pub completed: Option<bool>,
    /// Page size.
    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 100)]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: i64,
    /// Number of tasks to skip.
    #[serde(default)]
    #[param(minimum = 0)]
    #[validate(range(min = 0, message = "offset cannot be negative"))]
    pub offset: i64,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            completed: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// A page of tasks plus the number of tasks matching the filter.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub items: Vec<Task>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
