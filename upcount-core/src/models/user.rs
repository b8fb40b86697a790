use serde::{Deserialize, Serialize};

/// An application user.
///
/// Users own goals and logs through their `user_id`. The identity provider is
/// the source of truth for credentials; this record only carries profile data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Input for updating the current user's profile. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl User {
    /// Apply a partial update, returning the replacement record.
    ///
    /// `now` becomes the new `updatedAt`.
    pub fn apply(&self, input: UpdateUserInput, now: &str) -> User {
        User {
            user_id: self.user_id.clone(),
            email: input.email.unwrap_or_else(|| self.email.clone()),
            display_name: input.display_name.or_else(|| self.display_name.clone()),
            created_at: self.created_at.clone(),
            updated_at: Some(now.to_string()),
        }
    }
}
