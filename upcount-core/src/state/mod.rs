//! Client-side state containers.
//!
//! Each collection is a plain value type paired with a closed set of actions.
//! [`Reducer::reduce`] is a pure function from `(state, action)` to the next
//! state: it never performs I/O and never issues further actions. A [`Store`]
//! hosts one state value and applies dispatched actions atomically.
//!
//! - [`GoalsState`]: the user's goals plus the selected goal.
//! - [`LogsState`]: log entries for the goal currently being viewed.
//! - [`AuthState`]: the signed-in user and session check outcome.
//! - [`AppState`]: app-wide settings (theme, offline mode, notifications).

mod app;
mod auth;
mod goals;
mod logs;
mod store;

pub use app::*;
pub use auth::*;
pub use goals::*;
pub use logs::*;
pub use store::*;

/// A state value that evolves through a closed set of actions.
pub trait Reducer: Clone {
    type Action: Action;

    /// Compute the next state. Must be pure and synchronous.
    fn reduce(&self, action: Self::Action) -> Self;
}

/// An action that can be named in logs without dumping its payload.
pub trait Action {
    fn name(&self) -> &'static str;
}
