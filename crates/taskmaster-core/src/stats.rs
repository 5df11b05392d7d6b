use serde::Serialize;

use crate::Task;

/// Number of entries shown in the recent activity list.
pub const RECENT_ACTIVITY_LEN: usize = 5;

/// Counts shown next to the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// All tasks.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Open tasks.
    pub pending: usize,
    /// Open tasks with priority 4 or 5.
    pub high_priority_pending: usize,
}

impl TaskStats {
    /// Summarize a collection.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        let high_priority_pending = tasks
            .iter()
            .filter(|task| !task.completed && task.priority.is_high())
            .count();
        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
            high_priority_pending,
        }
    }

    /// Completed share as a rounded percentage; 0 for an empty collection.
    #[must_use]
    pub const fn progress_percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 200 + self.total) / (self.total * 2)
    }
}

/// The most recently updated tasks, newest first.
#[must_use]
pub fn recent_activity(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut recent: Vec<&Task> = tasks.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(limit);
    recent
}
