//! Persistence boundary consumed by [`TaskCollection`](crate::collection::TaskCollection).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Error;
use taskmaster_core::Task;
use taskmaster_store_json::{JsonFileStore, StoreError};

/// Minimal storage abstraction required by [`TaskCollection`](crate::collection::TaskCollection).
pub trait TaskStore {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error>;

    /// Load the whole collection.
    ///
    /// # Errors
    /// Returns a store-specific error when the backing medium cannot be read.
    fn load(&self) -> Result<Vec<Task>, Self::Error>;

    /// Replace the stored collection with `tasks`.
    ///
    /// # Errors
    /// Returns a store-specific error when the write fails.
    fn save(&self, tasks: &[Task]) -> Result<(), Self::Error>;
}

impl TaskStore for JsonFileStore {
    type Error = StoreError;

    fn load(&self) -> Result<Vec<Task>, Self::Error> {
        Self::load(self)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), Self::Error> {
        Self::save(self, tasks)
    }
}

/// Failures injected into [`MemoryTaskStore`].
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    /// Simulated read failure.
    #[error("simulated load failure")]
    LoadFailed,
    /// Simulated write failure.
    #[error("simulated save failure")]
    SaveFailed,
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    save_attempts: usize,
    saves: usize,
    failing_saves: usize,
    fail_loads: bool,
}

/// In-memory store that records every write. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTaskStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        store.state().tasks = tasks;
        store
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last successfully saved collection.
    #[must_use]
    pub fn saved_tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// Number of save calls, including failed ones.
    #[must_use]
    pub fn save_attempts(&self) -> usize {
        self.state().save_attempts
    }

    /// Make the next `count` saves fail.
    pub fn fail_next_saves(&self, count: usize) {
        self.state().failing_saves = count;
    }

    /// Make loads fail (or succeed again).
    pub fn set_fail_loads(&self, fail: bool) {
        self.state().fail_loads = fail;
    }
}

impl TaskStore for MemoryTaskStore {
    type Error = MemoryStoreError;

    fn load(&self) -> Result<Vec<Task>, Self::Error> {
        let state = self.state();
        if state.fail_loads {
            return Err(MemoryStoreError::LoadFailed);
        }
        Ok(state.tasks.clone())
    }

    fn save(&self, tasks: &[Task]) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.save_attempts += 1;
        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(MemoryStoreError::SaveFailed);
        }
        state.tasks = tasks.to_vec();
        state.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_counts_attempts_and_successes() {
        let store = MemoryTaskStore::new();
        store.fail_next_saves(1);
        assert!(store.save(&[]).is_err());
        assert!(store.save(&[]).is_ok());
        assert_eq!(store.save_attempts(), 2);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn memory_store_can_fail_loads() {
        let store = MemoryTaskStore::new();
        store.set_fail_loads(true);
        assert!(matches!(store.load(), Err(MemoryStoreError::LoadFailed)));
        store.set_fail_loads(false);
        assert!(store.load().is_ok_and(|tasks| tasks.is_empty()));
    }
}
