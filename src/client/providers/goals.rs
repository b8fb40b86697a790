use std::sync::Arc;

use super::failure_message;
use crate::client::api::{Api, ClientError};
use crate::client::transport::Transport;
use crate::models::{CreateGoalInput, Goal, UpdateGoalInput};
use crate::state::{GoalsAction, GoalsState, Store};

pub const FETCH_FAILED: &str = "Failed to fetch goals. Please try again.";
pub const CREATE_FAILED: &str = "Failed to create goal. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update goal. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete goal. Please try again.";
pub const INVALID_DATA: &str = "Received invalid goal data from the server.";

/// Owns the goals collection.
pub struct GoalsProvider<T> {
    api: Arc<Api<T>>,
    store: Store<GoalsState>,
}

impl<T: Transport> GoalsProvider<T> {
    pub fn new(api: Arc<Api<T>>) -> Self {
        Self {
            api,
            store: Store::default(),
        }
    }

    pub fn state(&self) -> GoalsState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store<GoalsState> {
        &self.store
    }

    /// Replace the collection with the server's list.
    pub async fn fetch_goals(&self) -> Result<(), ClientError> {
        self.store.dispatch(GoalsAction::FetchStart);
        match self.api.list_goals().await {
            Ok(goals) => {
                self.store.dispatch(GoalsAction::FetchSuccess(goals));
                Ok(())
            }
            Err(e) => Err(self.fail(e, FETCH_FAILED)),
        }
    }

    pub fn select_goal(&self, goal: Goal) {
        self.store.dispatch(GoalsAction::Select(goal));
    }

    pub fn clear_selected_goal(&self) {
        self.store.dispatch(GoalsAction::ClearSelected);
    }

    pub async fn add_goal(&self, input: &CreateGoalInput) -> Result<Goal, ClientError> {
        match self.api.create_goal(input).await {
            Ok(goal) => {
                self.store.dispatch(GoalsAction::Add(goal.clone()));
                Ok(goal)
            }
            Err(e) => Err(self.fail(e, CREATE_FAILED)),
        }
    }

    pub async fn update_goal(
        &self,
        goal_id: &str,
        input: &UpdateGoalInput,
    ) -> Result<Goal, ClientError> {
        match self.api.update_goal(goal_id, input).await {
            Ok(goal) => {
                self.store.dispatch(GoalsAction::Update(goal.clone()));
                Ok(goal)
            }
            Err(e) => Err(self.fail(e, UPDATE_FAILED)),
        }
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<(), ClientError> {
        match self.api.delete_goal(goal_id).await {
            Ok(()) => {
                self.store.dispatch(GoalsAction::Delete(goal_id.to_string()));
                Ok(())
            }
            Err(e) => Err(self.fail(e, DELETE_FAILED)),
        }
    }

    pub fn clear_error(&self) {
        self.store.dispatch(GoalsAction::ClearError);
    }

    fn fail(&self, err: ClientError, fallback: &str) -> ClientError {
        tracing::error!("Goals operation failed: {}", err);
        let message = failure_message(&err, fallback, INVALID_DATA);
        self.store.dispatch(GoalsAction::FetchError(message));
        err
    }
}
