use serde::{Deserialize, Serialize};

use crate::format;

/// A progress entry recorded against a goal.
///
/// `timestamp` is when the activity happened; `created_at` is when the record
/// was stored. The two differ for back-dated entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub log_id: String,
    pub goal_id: String,
    /// Owner of the log, denormalized from the goal.
    pub user_id: String,
    /// Increment recorded by this entry.
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: String,
    pub created_at: String,
}

/// Input for recording a new log entry.
///
/// `timestamp` defaults to the time the store receives the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogInput {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Input for updating a log entry. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Log {
    /// One-line description, e.g. `+3 on Jan 3, 2024`.
    pub fn summary(&self) -> String {
        let when = format::format_date(&self.timestamp).unwrap_or_else(|| self.timestamp.clone());
        format!("+{} on {}", self.value, when)
    }

    /// Apply a partial update, returning the replacement record.
    pub fn apply(&self, input: UpdateLogInput) -> Log {
        Log {
            log_id: self.log_id.clone(),
            goal_id: self.goal_id.clone(),
            user_id: self.user_id.clone(),
            value: input.value.unwrap_or(self.value),
            notes: input.notes.or_else(|| self.notes.clone()),
            timestamp: input.timestamp.unwrap_or_else(|| self.timestamp.clone()),
            created_at: self.created_at.clone(),
        }
    }
}
