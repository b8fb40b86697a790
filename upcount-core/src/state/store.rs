use std::sync::Arc;

use parking_lot::Mutex;

use super::{Action, Reducer};

/// Hosts a single state value and applies actions to it.
///
/// Clones share the same underlying state, so a store can be handed to every
/// consumer that needs to read or dispatch. Each dispatch replaces the state
/// under the lock, which makes transitions atomic with respect to readers.
#[derive(Debug)]
pub struct Store<S> {
    state: Arc<Mutex<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: Reducer + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Reducer> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
        }
    }

    /// Apply an action and return the resulting state.
    pub fn dispatch(&self, action: S::Action) -> S {
        tracing::debug!(action = action.name(), "dispatch");
        let mut state = self.state.lock();
        let next = state.reduce(action);
        *state = next.clone();
        next
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> S {
        self.state.lock().clone()
    }

    /// Read the current state without copying it.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock())
    }
}
