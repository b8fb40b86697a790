use serde::{Deserialize, Serialize};

use crate::format;

/// Status stamped on goals when they are created.
pub const STATUS_ACTIVE: &str = "active";

/// A measurable target owned by a user.
///
/// A goal is complete once `current_value` reaches `target_value`. Updates
/// always replace the whole record with the one returned by the store; state
/// containers never patch individual fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub goal_id: String,
    /// Owner of the goal.
    pub user_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion threshold.
    pub target_value: f64,
    /// Progress so far.
    pub current_value: f64,
    /// Measurement unit, e.g. `km` or `books`.
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Lifecycle marker, [`STATUS_ACTIVE`] for goals created by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Goal {
    /// Percentage of the target reached, capped at 100.
    pub fn progress(&self) -> f64 {
        format::progress(self.current_value, self.target_value)
    }

    pub fn is_complete(&self) -> bool {
        self.current_value >= self.target_value
    }

    /// One-line description, e.g. `Run: 5 km of 10 km (50%), due Jan 5, 2025`.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {} of {} ({})",
            self.title,
            format::format_value(self.current_value, &self.unit),
            format::format_value(self.target_value, &self.unit),
            format::format_percentage(self.progress()),
        );
        if let Some(due) = self.deadline.as_deref().and_then(format::format_date) {
            line.push_str(&format!(", due {}", due));
        }
        if self.is_complete() {
            line.push_str(", complete");
        }
        line
    }

    /// Apply a partial update, returning the replacement record.
    pub fn apply(&self, input: UpdateGoalInput, now: &str) -> Goal {
        Goal {
            goal_id: self.goal_id.clone(),
            user_id: self.user_id.clone(),
            title: input.title.unwrap_or_else(|| self.title.clone()),
            description: input.description.or_else(|| self.description.clone()),
            target_value: input.target_value.unwrap_or(self.target_value),
            current_value: input.current_value.unwrap_or(self.current_value),
            unit: input.unit.unwrap_or_else(|| self.unit.clone()),
            deadline: input.deadline.or_else(|| self.deadline.clone()),
            category: input.category.or_else(|| self.category.clone()),
            status: self.status.clone(),
            created_at: self.created_at.clone(),
            updated_at: now.to_string(),
        }
    }
}

/// Input for creating a new goal.
///
/// The store assigns `goalId`, `userId`, `currentValue` and both timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalInput {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Input for updating an existing goal. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(current_value: f64, deadline: Option<&str>) -> Goal {
        Goal {
            goal_id: "g1".to_string(),
            user_id: "u1".to_string(),
            title: "Run".to_string(),
            description: None,
            target_value: 10.0,
            current_value,
            unit: "km".to_string(),
            deadline: deadline.map(str::to_string),
            category: None,
            status: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn summarizes_progress_and_deadline() {
        assert_eq!(goal(2.5, None).progress(), 25.0);
        assert_eq!(
            goal(2.5, Some("2025-01-05")).summary(),
            "Run: 2.5 km of 10 km (25%), due Jan 5, 2025"
        );
        assert_eq!(goal(12.0, Some("someday")).summary(), "Run: 12 km of 10 km (100%), complete");
    }
}
