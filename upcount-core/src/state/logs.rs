use crate::models::Log;

use super::{Action, Reducer};

/// Log entries for one goal.
///
/// Logs are loaded per goal; `goal_id` records which goal the list belongs to.
/// Removing a goal from [`super::GoalsState`] does not touch this list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogsState {
    pub logs: Vec<Log>,
    pub goal_id: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogsAction {
    FetchStart { goal_id: String },
    FetchSuccess(Vec<Log>),
    FetchError(String),
    /// Appends a created log when it belongs to the loaded goal.
    Add(Log),
    /// Replaces the log with the same `logId`. Does nothing when none matches.
    Update(Log),
    Delete(String),
    ClearError,
}

impl Action for LogsAction {
    fn name(&self) -> &'static str {
        match self {
            Self::FetchStart { .. } => "logs/fetch_start",
            Self::FetchSuccess(_) => "logs/fetch_success",
            Self::FetchError(_) => "logs/fetch_error",
            Self::Add(_) => "logs/add",
            Self::Update(_) => "logs/update",
            Self::Delete(_) => "logs/delete",
            Self::ClearError => "logs/clear_error",
        }
    }
}

impl Reducer for LogsState {
    type Action = LogsAction;

    fn reduce(&self, action: LogsAction) -> Self {
        match action {
            LogsAction::FetchStart { goal_id } => Self {
                goal_id: Some(goal_id),
                is_loading: true,
                error: None,
                ..self.clone()
            },
            LogsAction::FetchSuccess(logs) => Self {
                logs,
                is_loading: false,
                ..self.clone()
            },
            LogsAction::FetchError(message) => Self {
                is_loading: false,
                error: Some(message),
                ..self.clone()
            },
            LogsAction::Add(log) if !self.holds(&log.goal_id) => self.clone(),
            LogsAction::Add(log) => {
                let mut logs = self.logs.clone();
                logs.push(log);
                Self {
                    logs,
                    ..self.clone()
                }
            }
            LogsAction::Update(log) => Self {
                logs: self
                    .logs
                    .iter()
                    .map(|l| if l.log_id == log.log_id { log.clone() } else { l.clone() })
                    .collect(),
                ..self.clone()
            },
            LogsAction::Delete(log_id) => Self {
                logs: self
                    .logs
                    .iter()
                    .filter(|l| l.log_id != log_id)
                    .cloned()
                    .collect(),
                ..self.clone()
            },
            LogsAction::ClearError => Self {
                error: None,
                ..self.clone()
            },
        }
    }
}

impl LogsState {
    /// Whether the loaded list is the one for `goal_id`.
    pub fn holds(&self, goal_id: &str) -> bool {
        self.goal_id.as_deref() == Some(goal_id)
    }

    /// Sum of all logged values.
    pub fn total(&self) -> f64 {
        self.logs.iter().map(|l| l.value).sum()
    }
}
