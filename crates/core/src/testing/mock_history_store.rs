//! Mock history store for testing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::history::{HistoryError, HistoryEvent, HistoryStore};

#[derive(Debug, Default)]
struct State {
    events: Vec<HistoryEvent>,
    next_error: Option<String>,
}

/// In-memory HistoryStore that records every inserted event.
///
/// Cloning shares the recorded events.
#[derive(Debug, Clone, Default)]
pub struct MockHistoryStore {
    state: Arc<Mutex<State>>,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events inserted so far, in insert order.
    pub fn events(&self) -> Vec<HistoryEvent> {
        self.state().events.clone()
    }

    /// Make the next insert fail with a database error.
    pub fn fail_next(&self, message: &str) {
        self.state().next_error = Some(message.to_string());
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for MockHistoryStore {
    fn insert(&self, event: &HistoryEvent) -> Result<i64, HistoryError> {
        let mut state = self.state();
        if let Some(message) = state.next_error.take() {
            return Err(HistoryError::Database(message));
        }
        state.events.push(event.clone());
        Ok(state.events.len() as i64)
    }
}
