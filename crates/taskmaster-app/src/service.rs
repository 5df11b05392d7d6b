//! Session façade combining the task collection with the current view.

use taskmaster_core::id::TaskId;
use taskmaster_core::stats::{RECENT_ACTIVITY_LEN, TaskStats, recent_activity};
use taskmaster_core::view::{FilterMode, SortKey, ViewState, derive_view};
use taskmaster_core::{Task, TaskDraft};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::collection::{TaskCollection, TaskWriteError};
use crate::export::{ExportArtifact, ExportError, ExportFormat, export};
use crate::task_store::TaskStore;

/// Service façade for one session: the task collection plus the view selections.
pub struct TaskService<S, C = SystemClock> {
    collection: TaskCollection<S, C>,
    view: ViewState,
}

impl<S, C> TaskService<S, C> {
    /// Wrap an already opened collection.
    pub const fn new(collection: TaskCollection<S, C>, view: ViewState) -> Self {
        Self { collection, view }
    }

    /// Underlying collection.
    pub const fn collection(&self) -> &TaskCollection<S, C> {
        &self.collection
    }

    /// Current view selections.
    pub const fn view_state(&self) -> &ViewState {
        &self.view
    }

    /// Replace the search term. An empty term shows everything.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.view.search_term = term.into();
    }

    /// Change the ordering.
    pub const fn set_sort_by(&mut self, sort_by: SortKey) {
        self.view.sort_by = sort_by;
    }

    /// Change the status filter.
    pub const fn set_filter_by(&mut self, filter_by: FilterMode) {
        self.view.filter_by = filter_by;
    }

    /// Tasks matching the current view, derived from the live collection.
    pub fn visible(&self) -> Vec<&Task> {
        derive_view(self.collection.tasks(), &self.view)
    }

    /// Summary counts over the whole collection.
    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(self.collection.tasks())
    }

    /// Most recently updated tasks.
    pub fn recent_activity(&self) -> Vec<&Task> {
        recent_activity(self.collection.tasks(), RECENT_ACTIVITY_LEN)
    }

    /// Resolve a full id or unique prefix.
    ///
    /// # Errors
    /// See [`TaskCollection::resolve`].
    pub fn resolve(&self, raw: &str) -> Result<TaskId, TaskWriteError> {
        self.collection.resolve(raw)
    }

    /// Open the edit form for `id`, returning its current fields.
    ///
    /// Returns `None` (and leaves any previous edit untouched) when the task
    /// does not exist.
    pub fn begin_edit(&mut self, id: TaskId) -> Option<TaskDraft> {
        let draft = self.collection.get(id).map(Task::draft)?;
        self.view.editing = Some(id);
        debug!(%id, "Editing task");
        Some(draft)
    }

    /// Task currently being edited.
    pub const fn editing(&self) -> Option<TaskId> {
        self.view.editing
    }

    /// Abandon the current edit.
    pub const fn cancel_edit(&mut self) {
        self.view.editing = None;
    }
}

impl<S, C> TaskService<S, C>
where
    S: TaskStore,
    C: Clock,
{
    /// Load the collection from `store` and start a session with `view`.
    pub fn open(store: S, clock: C, view: ViewState) -> Self {
        Self::new(TaskCollection::open(store, clock), view)
    }

    /// Add a task.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Validation`] for invalid input.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task, TaskWriteError> {
        self.collection.create(draft)
    }

    /// Replace the fields of a task. Unknown ids are a logged no-op.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Validation`] for invalid input.
    pub fn update(&mut self, id: TaskId, draft: TaskDraft) -> Result<Option<Task>, TaskWriteError> {
        missing_as_none(self.collection.update(id, draft), "update")
    }

    /// Remove a task. Unknown ids are a logged no-op.
    ///
    /// # Errors
    /// Only fails for errors other than a missing id.
    pub fn delete(&mut self, id: TaskId) -> Result<Option<Task>, TaskWriteError> {
        let removed = missing_as_none(self.collection.delete(id), "delete")?;
        if removed.is_some() && self.view.editing == Some(id) {
            self.view.editing = None;
        }
        Ok(removed)
    }

    /// Flip completion. Unknown ids are a logged no-op.
    ///
    /// # Errors
    /// Only fails for errors other than a missing id.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Option<Task>, TaskWriteError> {
        missing_as_none(self.collection.toggle_complete(id), "toggle")
    }

    /// Save the edit form against the task being edited.
    ///
    /// The edited id is looked up again at submit time. If the task vanished
    /// meanwhile the edit is dropped and `Ok(None)` is returned. Invalid input
    /// keeps the edit open.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Validation`] for invalid input.
    pub fn submit_edit(&mut self, draft: TaskDraft) -> Result<Option<Task>, TaskWriteError> {
        let Some(id) = self.view.editing else {
            warn!("Submit without an open edit; ignoring");
            return Ok(None);
        };
        match self.collection.update(id, draft) {
            Ok(task) => {
                self.view.editing = None;
                Ok(Some(task))
            }
            Err(TaskWriteError::NotFound(id)) => {
                warn!(%id, "Edited task no longer exists; discarding edit");
                self.view.editing = None;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Render the whole collection, stamped with the session clock.
    ///
    /// # Errors
    /// Returns [`ExportError`] if encoding fails.
    pub fn export(&self, format: ExportFormat) -> Result<ExportArtifact, ExportError> {
        export(self.collection.tasks(), format, self.collection.clock().now())
    }

    /// Retry writes that failed earlier.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Store`] if the store still rejects the write.
    pub fn flush(&mut self) -> Result<(), TaskWriteError> {
        self.collection.flush()
    }

    /// End the session with a final save of unsaved changes.
    ///
    /// # Errors
    /// Returns [`TaskWriteError::Store`] if the final save fails.
    pub fn close(self) -> Result<(), TaskWriteError> {
        self.collection.close()
    }
}

fn missing_as_none<T>(
    result: Result<T, TaskWriteError>,
    action: &str,
) -> Result<Option<T>, TaskWriteError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(TaskWriteError::NotFound(id)) => {
            warn!(%id, action, "Task not found; nothing to do");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
