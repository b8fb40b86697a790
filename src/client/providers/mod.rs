//! State providers.
//!
//! A provider owns the [`Store`](crate::state::Store) for one collection and
//! runs the async operations that feed it: dispatch the start action, call the
//! API or identity provider, validate what came back, then dispatch the
//! terminal action. Failures are recorded in state as a fixed, human-readable
//! message; the underlying cause is logged.

mod app;
mod auth;
mod goals;
mod logs;

pub use app::AppProvider;
pub use auth::{AuthProvider, SessionError};
pub use goals::GoalsProvider;
pub use logs::LogsProvider;

use super::api::ClientError;

/// The message recorded in state for a failed operation.
///
/// Payloads that failed validation get `invalid`; everything else gets
/// `fallback`.
fn failure_message(err: &ClientError, fallback: &str, invalid: &str) -> String {
    match err {
        ClientError::Shape { .. } => invalid.to_string(),
        ClientError::Transport(_) | ClientError::Encode(_) => fallback.to_string(),
    }
}
