//! Typed endpoints over a [`Transport`].
//!
//! Every payload the server returns is run through the validator before it is
//! handed to the caller, so a malformed record surfaces as
//! [`ClientError::Shape`] rather than a partially filled struct.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::transport::{Transport, TransportError};
use crate::models::*;
use crate::validate::{parse_list, Entity, ShapeError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("invalid {kind} received: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: ShapeError,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_not_found())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unavailable())
    }
}

fn entity<E: Entity>(value: &Value) -> Result<E, ClientError> {
    E::parse(value).map_err(|source| {
        tracing::warn!(kind = E::KIND, "Rejected payload: {}", source);
        ClientError::Shape {
            kind: E::KIND,
            source,
        }
    })
}

fn entities<E: Entity>(value: &Value) -> Result<Vec<E>, ClientError> {
    parse_list(value).map_err(|source| {
        tracing::warn!(kind = E::KIND, "Rejected list payload: {}", source);
        ClientError::Shape {
            kind: E::KIND,
            source,
        }
    })
}

fn body(input: &impl Serialize) -> Result<Value, ClientError> {
    Ok(serde_json::to_value(input)?)
}

/// The UpCount REST API.
#[derive(Debug, Clone)]
pub struct Api<T> {
    transport: T,
}

impl<T: Transport> Api<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    // ============================================================
    // Users
    // ============================================================

    pub async fn current_user(&self) -> Result<User, ClientError> {
        let value = self.transport.get("/user").await?;
        entity(&value)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ClientError> {
        let value = self.transport.get(&format!("/users/{}", user_id)).await?;
        entity(&value)
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> Result<User, ClientError> {
        let value = self.transport.put("/user", &body(input)?).await?;
        entity(&value)
    }

    // ============================================================
    // Goals
    // ============================================================

    pub async fn list_goals(&self) -> Result<Vec<Goal>, ClientError> {
        let value = self.transport.get("/goals").await?;
        entities(&value)
    }

    pub async fn get_goal(&self, goal_id: &str) -> Result<Goal, ClientError> {
        let value = self.transport.get(&format!("/goals/{}", goal_id)).await?;
        entity(&value)
    }

    pub async fn create_goal(&self, input: &CreateGoalInput) -> Result<Goal, ClientError> {
        let value = self.transport.post("/goals", &body(input)?).await?;
        entity(&value)
    }

    pub async fn update_goal(
        &self,
        goal_id: &str,
        input: &UpdateGoalInput,
    ) -> Result<Goal, ClientError> {
        let value = self
            .transport
            .put(&format!("/goals/{}", goal_id), &body(input)?)
            .await?;
        entity(&value)
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), ClientError> {
        self.transport
            .delete(&format!("/goals/{}", goal_id))
            .await?;
        Ok(())
    }

    // ============================================================
    // Logs
    // ============================================================

    pub async fn list_logs(&self, goal_id: &str) -> Result<Vec<Log>, ClientError> {
        let value = self
            .transport
            .get(&format!("/goals/{}/logs", goal_id))
            .await?;
        entities(&value)
    }

    pub async fn create_log(
        &self,
        goal_id: &str,
        input: &CreateLogInput,
    ) -> Result<Log, ClientError> {
        let value = self
            .transport
            .post(&format!("/goals/{}/logs", goal_id), &body(input)?)
            .await?;
        entity(&value)
    }

    pub async fn update_log(
        &self,
        goal_id: &str,
        log_id: &str,
        input: &UpdateLogInput,
    ) -> Result<Log, ClientError> {
        let value = self
            .transport
            .put(&format!("/goals/{}/logs/{}", goal_id, log_id), &body(input)?)
            .await?;
        entity(&value)
    }

    pub async fn delete_log(&self, goal_id: &str, log_id: &str) -> Result<(), ClientError> {
        self.transport
            .delete(&format!("/goals/{}/logs/{}", goal_id, log_id))
            .await?;
        Ok(())
    }
}
