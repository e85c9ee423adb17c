//! Application state.

use std::sync::Arc;

use memo_store::{MemoStore, SweepState};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    store: MemoStore,
    sweep_state: Arc<SweepState>,
}

impl AppState {
    pub fn new(store: MemoStore, sweep_state: Arc<SweepState>) -> Self {
        Self { store, sweep_state }
    }

    /// State over an in-memory store, with no sweep history.
    pub fn in_memory() -> Self {
        Self::new(MemoStore::in_memory(), Arc::new(SweepState::new()))
    }

    pub fn store(&self) -> &MemoStore {
        &self.store
    }

    /// Returns the sweep state the scheduler records into.
    pub fn sweep_state(&self) -> &Arc<SweepState> {
        &self.sweep_state
    }
}
