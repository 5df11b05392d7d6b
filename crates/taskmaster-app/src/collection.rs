//! Authoritative in-memory task list with write-through persistence.

use std::collections::HashSet;

use anyhow::Error;
use taskmaster_core::id::TaskId;
use taskmaster_core::{Task, TaskDraft, ValidationError};
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::task_store::TaskStore;

/// Errors returned by collection mutations.
#[derive(Debug, thiserror::Error)]
pub enum TaskWriteError {
    /// Input violated entity rules; nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The referenced task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// No task id matches the given text.
    #[error("no task matches id '{0}'")]
    UnknownId(String),
    /// More than one task id starts with the given prefix.
    #[error("id prefix '{prefix}' matches {count} tasks")]
    AmbiguousId {
        /// Prefix as typed.
        prefix: String,
        /// Number of matching tasks.
        count: usize,
    },
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[from] Error),
}

/// Sole owner of the task list.
///
/// Every successful mutation writes the full collection to the store before
/// returning. Failed writes are logged and leave the in-memory state
/// authoritative; [`flush`](Self::flush) retries them.
pub struct TaskCollection<S, C = SystemClock> {
    store: S,
    clock: C,
    tasks: Vec<Task>,
    dirty: bool,
}

impl<S, C> TaskCollection<S, C> {
    /// Tasks in insertion order (newest first).
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Number of tasks.
    pub const fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the collection holds no tasks.
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether the last write to the store failed.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clock used for timestamps.
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Borrow the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a full id or a unique id prefix.
    ///
    /// A well-formed full id is returned as-is, present or not, so operations
    /// on a task that has gone away reach the missing-id no-op path.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::UnknownId`] when no id starts with the text
    /// and [`TaskWriteError::AmbiguousId`] when several do.
    pub fn resolve(&self, raw: &str) -> Result<TaskId, TaskWriteError> {
        if let Ok(id) = raw.parse::<TaskId>() {
            return Ok(id);
        }
        let mut matches = self.tasks.iter().filter(|task| task.id.starts_with(raw));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task.id),
            (None, _) => Err(TaskWriteError::UnknownId(raw.trim().to_owned())),
            (Some(_), Some(_)) => Err(TaskWriteError::AmbiguousId {
                prefix: raw.trim().to_owned(),
                count: 2 + matches.count(),
            }),
        }
    }

    fn position(&self, id: TaskId) -> Result<usize, TaskWriteError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(TaskWriteError::NotFound(id))
    }
}

impl<S, C> TaskCollection<S, C>
where
    S: TaskStore,
    C: Clock,
{
    /// Load the collection from `store`.
    ///
    /// A failing load starts an empty collection instead of aborting.
    pub fn open(store: S, clock: C) -> Self {
        let tasks = match store.load() {
            Ok(tasks) => dedupe(tasks),
            Err(err) => {
                let err: Error = err.into();
                warn!(error = %err, "Failed to load tasks; starting with an empty list");
                Vec::new()
            }
        };
        Self {
            store,
            clock,
            tasks,
            dirty: false,
        }
    }

    /// Validate `draft`, add it as the newest task and persist.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Validation`] for a blank title or an
    /// out-of-range priority; the collection and store are left untouched.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task, TaskWriteError> {
        let draft = draft.validate()?;
        let task = Task::create(self.fresh_id(), draft, self.clock.now());
        self.tasks.insert(0, task.clone());
        info!(id = %task.id, title = %task.title, "Created task");
        self.persist();
        Ok(task)
    }

    /// Replace the editable fields of an existing task and persist.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] for unknown ids and
    /// [`TaskWriteError::Validation`] for invalid input.
    pub fn update(&mut self, id: TaskId, draft: TaskDraft) -> Result<Task, TaskWriteError> {
        let index = self.position(id)?;
        let draft = draft.validate()?;
        let now = self.clock.now();
        let task = &mut self.tasks[index];
        task.apply(draft, now);
        let task = task.clone();
        info!(id = %task.id, "Updated task");
        self.persist();
        Ok(task)
    }

    /// Remove a task and persist.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] when the id is absent; nothing is written.
    pub fn delete(&mut self, id: TaskId) -> Result<Task, TaskWriteError> {
        let index = self.position(id)?;
        let task = self.tasks.remove(index);
        info!(id = %task.id, "Deleted task");
        self.persist();
        Ok(task)
    }

    /// Flip the completion flag and persist.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::NotFound`] when the id is absent.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Task, TaskWriteError> {
        let index = self.position(id)?;
        let now = self.clock.now();
        let task = &mut self.tasks[index];
        task.toggle_completed(now);
        let task = task.clone();
        info!(id = %task.id, completed = task.completed, "Toggled task");
        self.persist();
        Ok(task)
    }

    /// Write any changes a previous save failed to store.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Store`] if the write fails again.
    pub fn flush(&mut self) -> Result<(), TaskWriteError> {
        if !self.dirty {
            return Ok(());
        }
        self.store
            .save(&self.tasks)
            .map_err(|err| TaskWriteError::Store(err.into()))?;
        self.dirty = false;
        info!(count = self.tasks.len(), "Flushed pending changes");
        Ok(())
    }

    /// Final save at shutdown.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Store`] if unsaved changes cannot be written.
    pub fn close(mut self) -> Result<(), TaskWriteError> {
        self.flush()
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::new();
            if self.get(id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        let Err(first) = self.store.save(&self.tasks) else {
            self.dirty = false;
            return;
        };
        let first: Error = first.into();
        warn!(error = %first, "Saving tasks failed; retrying once");

        match self.store.save(&self.tasks) {
            Ok(()) => self.dirty = false,
            Err(err) => {
                let err: Error = err.into();
                error!(error = %err, "Saving tasks failed; keeping changes in memory");
                self.dirty = true;
            }
        }
    }
}

fn dedupe(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::with_capacity(tasks.len());
    let before = tasks.len();
    let unique: Vec<Task> = tasks.into_iter().filter(|task| seen.insert(task.id)).collect();
    if unique.len() != before {
        warn!(dropped = before - unique.len(), "Ignoring tasks with duplicate ids");
    }
    unique
}
