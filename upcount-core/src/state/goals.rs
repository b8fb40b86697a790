use crate::models::Goal;

use super::{Action, Reducer};

/// The user's goals as last seen by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalsState {
    /// Ordered as received; `Add` appends.
    pub goals: Vec<Goal>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub selected_goal: Option<Goal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GoalsAction {
    FetchStart,
    FetchSuccess(Vec<Goal>),
    FetchError(String),
    Select(Goal),
    ClearSelected,
    /// Appends without de-duplicating. Adding an existing `goalId` is a
    /// caller error.
    Add(Goal),
    /// Replaces the goal with the same `goalId`, and the selection if it is
    /// that goal. Does nothing when no goal matches.
    Update(Goal),
    /// Removes the goal by id, clearing the selection if it is that goal.
    Delete(String),
    ClearError,
}

impl Action for GoalsAction {
    fn name(&self) -> &'static str {
        match self {
            Self::FetchStart => "goals/fetch_start",
            Self::FetchSuccess(_) => "goals/fetch_success",
            Self::FetchError(_) => "goals/fetch_error",
            Self::Select(_) => "goals/select",
            Self::ClearSelected => "goals/clear_selected",
            Self::Add(_) => "goals/add",
            Self::Update(_) => "goals/update",
            Self::Delete(_) => "goals/delete",
            Self::ClearError => "goals/clear_error",
        }
    }
}

impl Reducer for GoalsState {
    type Action = GoalsAction;

    fn reduce(&self, action: GoalsAction) -> Self {
        match action {
            GoalsAction::FetchStart => Self {
                is_loading: true,
                error: None,
                ..self.clone()
            },
            GoalsAction::FetchSuccess(goals) => Self {
                is_loading: false,
                goals,
                ..self.clone()
            },
            GoalsAction::FetchError(message) => Self {
                is_loading: false,
                error: Some(message),
                ..self.clone()
            },
            GoalsAction::Select(goal) => Self {
                selected_goal: Some(goal),
                ..self.clone()
            },
            GoalsAction::ClearSelected => Self {
                selected_goal: None,
                ..self.clone()
            },
            GoalsAction::Add(goal) => {
                let mut goals = self.goals.clone();
                goals.push(goal);
                Self {
                    goals,
                    ..self.clone()
                }
            }
            GoalsAction::Update(goal) => {
                let goals = self
                    .goals
                    .iter()
                    .map(|g| {
                        if g.goal_id == goal.goal_id {
                            goal.clone()
                        } else {
                            g.clone()
                        }
                    })
                    .collect();
                let selected_goal = match &self.selected_goal {
                    Some(selected) if selected.goal_id == goal.goal_id => Some(goal),
                    other => other.clone(),
                };
                Self {
                    goals,
                    selected_goal,
                    ..self.clone()
                }
            }
            GoalsAction::Delete(goal_id) => {
                let goals = self
                    .goals
                    .iter()
                    .filter(|g| g.goal_id != goal_id)
                    .cloned()
                    .collect();
                let selected_goal = self
                    .selected_goal
                    .clone()
                    .filter(|selected| selected.goal_id != goal_id);
                Self {
                    goals,
                    selected_goal,
                    ..self.clone()
                }
            }
            GoalsAction::ClearError => Self {
                error: None,
                ..self.clone()
            },
        }
    }
}

impl GoalsState {
    pub fn find(&self, goal_id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.goal_id == goal_id)
    }
}
