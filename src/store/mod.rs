//! State snapshot access and atomic mutation.
//!
//! The engine never persists state. Mutations are expressed as pure
//! reducers from the current snapshot to the next one and handed to a
//! [`StateMutationSink`]; whoever owns persistence observes the commits.

pub mod state;

pub use state::*;

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::tools::ToolError;

/// Result of a successful reducer: the next state and a summary for the model.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub state: AppState,
    pub message: String,
}

impl Reduction {
    pub fn new(state: AppState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Pure `(State) -> State` transition. Returning an error leaves the state untouched.
pub type Reducer<'a> = &'a (dyn Fn(&AppState) -> Result<Reduction, ToolError> + Send + Sync);

/// Callback invoked with the new state after every successful commit.
pub type StateObserver = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Read/commit access to the external state document.
pub trait StateMutationSink: Send + Sync {
    /// Current state.
    fn snapshot(&self) -> AppState;

    /// Apply `reducer` as one atomic read-modify-write.
    ///
    /// Returns the reducer's summary message on success.
    fn commit(&self, reducer: Reducer<'_>) -> Result<String, ToolError>;
}

/// In-memory store serializing commits behind a mutex.
///
/// Observers run while the lock is held so they see commits in order; they
/// must not call back into the store.
#[derive(Default)]
pub struct InMemoryStateStore {
    state: Mutex<AppState>,
    observers: RwLock<Vec<StateObserver>>,
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("state", &*self.lock_state())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl InMemoryStateStore {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Mutex::new(initial),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Builder: register an observer.
    pub fn with_observer(self, observer: StateObserver) -> Self {
        self.subscribe(observer);
        self
    }

    /// Register an observer notified after every commit.
    pub fn subscribe(&self, observer: StateObserver) {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(observer);
    }

    /// Replace the whole document without notifying observers (initial load).
    pub fn replace(&self, next: AppState) {
        *self.lock_state() = next;
    }

    fn observer_count(&self) -> usize {
        self.observers
            .read()
            .map(|observers| observers.len())
            .unwrap_or_default()
    }

    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateMutationSink for InMemoryStateStore {
    fn snapshot(&self) -> AppState {
        self.lock_state().clone()
    }

    fn commit(&self, reducer: Reducer<'_>) -> Result<String, ToolError> {
        let mut guard = self.lock_state();
        let Reduction { state, message } = reducer(&guard)?;
        *guard = state;

        let observers = self
            .observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for observer in observers.iter() {
            observer(&guard);
        }
        tracing::debug!(observers = observers.len(), "state committed");
        Ok(message)
    }
}
