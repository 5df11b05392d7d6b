//! Serialized async handle for multi-writer contexts.
//!
//! The CLI drives a single [`TaskService`](crate::service::TaskService) and
//! never needs this. Embedders that mutate one task file from several tasks
//! (a daemon, a sync job beside a UI) share a [`SharedTaskCollection`]
//! instead, so saves never interleave.

use std::sync::Arc;

use anyhow::anyhow;
use taskmaster_core::id::TaskId;
use taskmaster_core::view::{ViewState, derive_view};
use taskmaster_core::{Task, TaskDraft};
use tokio::sync::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::collection::{TaskCollection, TaskWriteError};
use crate::task_store::TaskStore;

/// Cloneable handle to one [`TaskCollection`].
///
/// Each mutation holds the lock across the in-memory change and its save, so
/// writes reach the store in the order they were applied.
pub struct SharedTaskCollection<S, C = SystemClock> {
    inner: Arc<Mutex<TaskCollection<S, C>>>,
}

impl<S, C> Clone for SharedTaskCollection<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, C> SharedTaskCollection<S, C>
where
    S: TaskStore + Send + 'static,
    C: Clock + Send + 'static,
{
    /// Share an opened collection.
    pub fn new(collection: TaskCollection<S, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    /// Copy of every task in collection order.
    pub async fn snapshot(&self) -> Vec<Task> {
        self.inner.lock().await.tasks().to_vec()
    }

    /// Tasks matching `state`, in view order.
    pub async fn view(&self, state: &ViewState) -> Vec<Task> {
        let guard = self.inner.lock().await;
        derive_view(guard.tasks(), state).into_iter().cloned().collect()
    }

    /// See [`TaskCollection::create`].
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Validation`] for invalid input.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TaskWriteError> {
        self.with_collection(move |tasks| tasks.create(draft)).await
    }

    /// See [`TaskCollection::update`].
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] or [`TaskWriteError::Validation`].
    pub async fn update(&self, id: TaskId, draft: TaskDraft) -> Result<Task, TaskWriteError> {
        self.with_collection(move |tasks| tasks.update(id, draft)).await
    }

    /// See [`TaskCollection::delete`].
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] for unknown ids.
    pub async fn delete(&self, id: TaskId) -> Result<Task, TaskWriteError> {
        self.with_collection(move |tasks| tasks.delete(id)).await
    }

    /// See [`TaskCollection::toggle_complete`].
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] for unknown ids.
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, TaskWriteError> {
        self.with_collection(move |tasks| tasks.toggle_complete(id)).await
    }

    /// See [`TaskCollection::flush`].
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Store`] if the write fails.
    pub async fn flush(&self) -> Result<(), TaskWriteError> {
        self.with_collection(TaskCollection::flush).await
    }

    async fn with_collection<T, F>(&self, op: F) -> Result<T, TaskWriteError>
    where
        F: FnOnce(&mut TaskCollection<S, C>) -> Result<T, TaskWriteError> + Send + 'static,
        T: Send + 'static,
    {
        let mut guard = Arc::clone(&self.inner).lock_owned().await;
        // The guard moves into the blocking task so the save runs under the lock.
        tokio::task::spawn_blocking(move || op(&mut guard))
            .await
            .map_err(|err| TaskWriteError::Store(anyhow!("task join error: {err}")))?
    }
}
