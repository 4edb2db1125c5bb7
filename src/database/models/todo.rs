use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{Colour, PriorityLevel};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TodoList {
    pub id: i64,
    pub title: String,
    pub colour: String,
    pub created: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: Option<String>,
}

impl TodoList {
    pub fn colour(&self) -> Colour {
        Colour::from_code(&self.colour).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TodoItem {
    pub id: i64,
    pub list_id: i64,
    pub title: Option<String>,
    pub note: Option<String>,
    pub priority: i64,
    pub reminder: Option<DateTime<Utc>>,
    pub done: bool,
    pub created: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_modified: DateTime<Utc>,
    pub last_modified_by: Option<String>,
}

impl TodoItem {
    pub fn priority(&self) -> PriorityLevel {
        PriorityLevel::try_from(self.priority).unwrap_or_default()
    }
}

/// Who touched an auditable row, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub at: DateTime<Utc>,
    pub by: Option<String>,
}

impl AuditStamp {
    pub fn now(by: Option<String>) -> Self {
        Self { at: Utc::now(), by }
    }
}
