//! Domain types, validation and derived views for taskmaster.

/// Locale-style string ordering.
pub mod collate;
/// Identifier types.
pub mod id;
/// Collection summaries.
pub mod stats;
/// Case-insensitive search.
pub mod text_matcher;
/// Search, filter and sort pipeline.
pub mod view;

use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

/// Smallest step used when refreshing `updated_at`.
pub const MIN_TICK: Duration = Duration::microseconds(1);

/// Years the persisted RFC 3339 layout can hold.
pub const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Whether `dt` can be written as an RFC 3339 timestamp.
#[must_use]
pub fn is_storable(dt: OffsetDateTime) -> bool {
    STORABLE_YEARS.contains(&dt.year())
}

/// Errors raised when task input violates entity rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty or whitespace only.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Priority outside of 1..=5.
    #[error("priority {0} is out of range (expected 1-5)")]
    PriorityOutOfRange(u8),
    /// Stored record claims it was updated before it was created.
    #[error("updatedAt precedes createdAt")]
    UpdatedBeforeCreated,
    /// Due date outside of the years the task file can store.
    #[error("due date year {0} is out of range (expected 0-9999)")]
    DueDateOutOfRange(i32),
}

/// Task priority on a 1 (low) to 5 (critical) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority.
    pub const LOW: Self = Self(1);
    /// Highest priority.
    pub const CRITICAL: Self = Self(5);

    /// Validate a raw priority value.
    ///
    /// # Errors
    /// Returns [`ValidationError::PriorityOutOfRange`] outside of 1..=5.
    pub const fn new(value: u8) -> Result<Self, ValidationError> {
        if value >= 1 && value <= 5 {
            Ok(Self(value))
        } else {
            Err(ValidationError::PriorityOutOfRange(value))
        }
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// High and critical priorities (4 and 5).
    #[must_use]
    pub const fn is_high(self) -> bool {
        self.0 >= 4
    }

    /// Display label used by the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Low",
            2 => "Normal",
            3 => "Medium",
            4 => "High",
            _ => "Critical",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOW
    }
}

impl TryFrom<u8> for Priority {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Category labels offered by the UI. Tasks store categories as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Work.
    Work,
    /// Personal.
    Personal,
    /// Health.
    Health,
    /// Learning.
    Learning,
    /// Shopping.
    Shopping,
    /// Anything else.
    Other,
}

impl Category {
    /// Every known category in menu order.
    pub const ALL: [Self; 6] = [
        Self::Work,
        Self::Personal,
        Self::Health,
        Self::Learning,
        Self::Shopping,
        Self::Other,
    ];

    /// Canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "Work",
            Self::Personal => "Personal",
            Self::Health => "Health",
            Self::Learning => "Learning",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// Match a known label case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
    }

    /// Canonicalize known labels and keep free text as typed (trimmed).
    #[must_use]
    pub fn normalize(value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::Other.as_str().to_owned();
        }
        Self::parse(trimmed).map_or_else(|| trimmed.to_owned(), |c| c.as_str().to_owned())
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Personal
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// User-editable task fields, without identity or timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Title as typed; trimmed on validation.
    pub title: String,
    /// Optional long-form description.
    pub description: String,
    /// Raw priority, validated against 1..=5.
    pub priority: u8,
    /// Optional due date.
    pub due_date: Option<OffsetDateTime>,
    /// Category label.
    pub category: String,
}

impl Default for TaskDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::LOW.get(),
            due_date: None,
            category: Category::default().as_str().to_owned(),
        }
    }
}

impl TaskDraft {
    /// Draft with the given title and form defaults for everything else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the raw priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Set or clear the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<OffsetDateTime>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Set the category label.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Check entity rules and normalize the fields.
    ///
    /// # Errors
    /// Returns [`ValidationError`] for blank titles, out-of-range priorities
    /// and due dates that cannot be stored.
    pub fn validate(self) -> Result<ValidDraft, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let priority = Priority::new(self.priority)?;
        Ok(ValidDraft {
            title: title.to_owned(),
            description: self.description.trim().to_owned(),
            priority,
            due_date: self.due_date.map(storable_due_date).transpose()?,
            category: Category::normalize(&self.category),
        })
    }
}

fn storable_due_date(due: OffsetDateTime) -> Result<OffsetDateTime, ValidationError> {
    if !is_storable(due) {
        return Err(ValidationError::DueDateOutOfRange(due.year()));
    }
    let utc = OffsetDateTime::from_unix_timestamp_nanos(due.unix_timestamp_nanos())
        .map_err(|_| ValidationError::DueDateOutOfRange(due.year()))?;
    if is_storable(utc) {
        Ok(utc)
    } else {
        Err(ValidationError::DueDateOutOfRange(utc.year()))
    }
}

/// A [`TaskDraft`] that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    title: String,
    description: String,
    priority: Priority,
    due_date: Option<OffsetDateTime>,
    category: String,
}

/// A single to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable identifier.
    pub id: TaskId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Description (may be empty).
    #[serde(default)]
    pub description: String,
    /// Priority 1..=5.
    pub priority: Priority,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last mutation time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Optional due date.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<OffsetDateTime>,
    /// Category label.
    pub category: String,
}

impl Task {
    /// Build a fresh, incomplete task stamped with `now`.
    #[must_use]
    pub fn create(id: TaskId, draft: ValidDraft, now: OffsetDateTime) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            completed: false,
            created_at: now,
            updated_at: now,
            due_date: draft.due_date,
            category: draft.category,
        }
    }

    /// Replace every editable field and refresh `updated_at`.
    pub fn apply(&mut self, draft: ValidDraft, now: OffsetDateTime) {
        self.title = draft.title;
        self.description = draft.description;
        self.priority = draft.priority;
        self.due_date = draft.due_date;
        self.category = draft.category;
        self.touch(now);
    }

    /// Flip the completion flag and refresh `updated_at`.
    pub fn toggle_completed(&mut self, now: OffsetDateTime) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Refresh `updated_at`; it always moves forward by at least [`MIN_TICK`].
    pub fn touch(&mut self, now: OffsetDateTime) {
        let floor = self.updated_at.max(self.created_at) + MIN_TICK;
        self.updated_at = now.max(floor);
    }

    /// Editable fields of this task, e.g. to prefill an edit form.
    #[must_use]
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority.get(),
            due_date: self.due_date,
            category: self.category.clone(),
        }
    }

    /// Check the invariants a stored record must satisfy.
    ///
    /// # Errors
    /// Returns the first violated rule.
    pub fn check_invariants(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::UpdatedBeforeCreated);
        }
        if let Some(due) = self.due_date.filter(|due| !is_storable(*due)) {
            return Err(ValidationError::DueDateOutOfRange(due.year()));
        }
        Ok(())
    }

    /// Classify the due date relative to `now`.
    #[must_use]
    pub fn due_status(&self, now: OffsetDateTime) -> DueStatus {
        let Some(due) = self.due_date else {
            return DueStatus::NoDueDate;
        };
        if self.completed {
            return DueStatus::Upcoming;
        }
        if due.to_offset(now.offset()).date() == now.date() {
            return DueStatus::DueToday;
        }
        if due < now {
            DueStatus::Overdue
        } else {
            DueStatus::Upcoming
        }
    }
}

/// Due-date classification shown next to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueStatus {
    /// No due date set.
    NoDueDate,
    /// Due on the current calendar day.
    DueToday,
    /// Due in the past and still open.
    Overdue,
    /// Due later, or already completed.
    Upcoming,
}
