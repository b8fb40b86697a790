use std::sync::Arc;

use super::failure_message;
use crate::client::api::{Api, ClientError};
use crate::client::transport::Transport;
use crate::models::{CreateLogInput, Log, UpdateLogInput};
use crate::state::{LogsAction, LogsState, Store};

pub const FETCH_FAILED: &str = "Failed to fetch logs. Please try again.";
pub const CREATE_FAILED: &str = "Failed to add log. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update log. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete log. Please try again.";
pub const INVALID_DATA: &str = "Received invalid log data from the server.";

/// Owns the log entries of the goal being viewed.
pub struct LogsProvider<T> {
    api: Arc<Api<T>>,
    store: Store<LogsState>,
}

impl<T: Transport> LogsProvider<T> {
    pub fn new(api: Arc<Api<T>>) -> Self {
        Self {
            api,
            store: Store::default(),
        }
    }

    pub fn state(&self) -> LogsState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Store<LogsState> {
        &self.store
    }

    pub async fn fetch_logs(&self, goal_id: &str) -> Result<(), ClientError> {
        self.store.dispatch(LogsAction::FetchStart {
            goal_id: goal_id.to_string(),
        });
        match self.api.list_logs(goal_id).await {
            Ok(logs) => {
                self.store.dispatch(LogsAction::FetchSuccess(logs));
                Ok(())
            }
            Err(e) => Err(self.fail(e, FETCH_FAILED)),
        }
    }

    /// Create a log. It joins the loaded list only when it belongs to the
    /// goal that list was fetched for.
    pub async fn add_log(&self, goal_id: &str, input: &CreateLogInput) -> Result<Log, ClientError> {
        match self.api.create_log(goal_id, input).await {
            Ok(log) => {
                if self.store.with(|state| state.holds(&log.goal_id)) {
                    self.store.dispatch(LogsAction::Add(log.clone()));
                } else {
                    tracing::debug!(goal_id = %log.goal_id, "Created log for a goal that is not loaded");
                }
                Ok(log)
            }
            Err(e) => Err(self.fail(e, CREATE_FAILED)),
        }
    }

    pub async fn update_log(
        &self,
        goal_id: &str,
        log_id: &str,
        input: &UpdateLogInput,
    ) -> Result<Log, ClientError> {
        match self.api.update_log(goal_id, log_id, input).await {
            Ok(log) => {
                self.store.dispatch(LogsAction::Update(log.clone()));
                Ok(log)
            }
            Err(e) => Err(self.fail(e, UPDATE_FAILED)),
        }
    }

    pub async fn delete_log(&self, goal_id: &str, log_id: &str) -> Result<(), ClientError> {
        match self.api.delete_log(goal_id, log_id).await {
            Ok(()) => {
                self.store.dispatch(LogsAction::Delete(log_id.to_string()));
                Ok(())
            }
            Err(e) => Err(self.fail(e, DELETE_FAILED)),
        }
    }

    pub fn clear_error(&self) {
        self.store.dispatch(LogsAction::ClearError);
    }

    fn fail(&self, err: ClientError, fallback: &str) -> ClientError {
        tracing::error!("Logs operation failed: {}", err);
        let message = failure_message(&err, fallback, INVALID_DATA);
        self.store.dispatch(LogsAction::FetchError(message));
        err
    }
}
