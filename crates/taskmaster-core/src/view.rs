use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::Task;
use crate::collate::locale_cmp;
use crate::id::TaskId;
use crate::text_matcher::TextMatcher;

/// Returned when a sort key or filter mode name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownOption {
    kind: &'static str,
    value: String,
}

impl UnknownOption {
    /// Rejection of `value` for the option family `kind`.
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ordering applied to the derived list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Title, ascending.
    Title,
    /// Priority, highest first.
    Priority,
    /// Creation time, newest first.
    #[default]
    CreatedAt,
    /// Due date, soonest first; undated tasks last.
    DueDate,
    /// Category, ascending.
    Category,
}

impl SortKey {
    /// Every sort key in menu order.
    pub const ALL: [Self; 5] = [
        Self::CreatedAt,
        Self::Title,
        Self::Priority,
        Self::DueDate,
        Self::Category,
    ];

    /// Wire name (`createdAt`, `dueDate`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Priority => "priority",
            Self::CreatedAt => "createdAt",
            Self::DueDate => "dueDate",
            Self::Category => "category",
        }
    }

    /// Parse a name, falling back to [`SortKey::CreatedAt`] for unknown values.
    #[must_use]
    pub fn from_name_lossy(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err| {
            debug!(%err, "falling back to createdAt ordering");
            Self::default()
        })
    }

    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::Title => locale_cmp(&a.title, &b.title),
            Self::Priority => b.priority.cmp(&a.priority),
            Self::DueDate => match (a.due_date, b.due_date) {
                (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::Category => locale_cmp(&a.category, &b.category),
            Self::CreatedAt => b.created_at.cmp(&a.created_at),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "title" => Ok(Self::Title),
            "priority" => Ok(Self::Priority),
            "createdat" | "created" => Ok(Self::CreatedAt),
            "duedate" | "due" => Ok(Self::DueDate),
            "category" => Ok(Self::Category),
            _ => Err(UnknownOption {
                kind: "sort key",
                value: s.to_owned(),
            }),
        }
    }
}

/// Status filter applied after the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Keep everything.
    #[default]
    All,
    /// Completed tasks only.
    Completed,
    /// Open tasks only.
    Pending,
    /// Priority 4 and 5.
    HighPriority,
}

impl FilterMode {
    /// Every filter mode in menu order.
    pub const ALL: [Self; 4] = [Self::All, Self::Pending, Self::Completed, Self::HighPriority];

    /// Wire name (`all`, `high-priority`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::HighPriority => "high-priority",
        }
    }

    /// Parse a name, falling back to [`FilterMode::All`] for unknown values.
    #[must_use]
    pub fn from_name_lossy(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err| {
            debug!(%err, "falling back to unfiltered view");
            Self::default()
        })
    }

    /// Whether `task` passes this filter.
    #[must_use]
    pub const fn keeps(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::HighPriority => task.priority.is_high(),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" | "open" => Ok(Self::Pending),
            "highpriority" | "high" => Ok(Self::HighPriority),
            _ => Err(UnknownOption {
                kind: "filter mode",
                value: s.to_owned(),
            }),
        }
    }
}

/// Ephemeral UI selections that shape the derived list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Free-text search; empty disables the search step.
    pub search_term: String,
    /// Ordering of the result.
    pub sort_by: SortKey,
    /// Status filter.
    pub filter_by: FilterMode,
    /// Task currently open in the edit form, by id only.
    pub editing: Option<TaskId>,
}

impl ViewState {
    /// View with the given sort and filter and no search.
    #[must_use]
    pub fn new(sort_by: SortKey, filter_by: FilterMode) -> Self {
        Self {
            sort_by,
            filter_by,
            ..Self::default()
        }
    }

    /// Set the search term.
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }
}

/// Compute the visible task list: search, then status filter, then a stable sort.
#[must_use]
pub fn derive_view<'a>(tasks: &'a [Task], state: &ViewState) -> Vec<&'a Task> {
    let matcher = TextMatcher::new(&state.search_term);
    let mut visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| matcher.as_ref().is_none_or(|m| m.matches(task)))
        .filter(|task| state.filter_by.keeps(task))
        .collect();
    visible.sort_by(|a, b| state.sort_by.compare(a, b));
    debug!(
        total = tasks.len(),
        visible = visible.len(),
        sort = %state.sort_by,
        filter = %state.filter_by,
        "derived view"
    );
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskDraft;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn task(title: &str, priority: u8, category: &str, created: OffsetDateTime) -> Task {
        let draft = TaskDraft::new(title)
            .with_priority(priority)
            .with_category(category)
            .validate()
            .unwrap_or_else(|err| panic!("draft must validate: {err}"));
        Task::create(TaskId::new(), draft, created)
    }

    fn titles(view: &[&Task]) -> Vec<String> {
        view.iter().map(|task| task.title.clone()).collect()
    }

    #[test]
    fn empty_collection_yields_empty_view() {
        assert!(derive_view(&[], &ViewState::default()).is_empty());
    }

    #[test]
    fn high_priority_filter_keeps_priority_four_and_up() {
        let tasks = vec![
            task("Buy milk", 2, "Shopping", datetime!(2024-01-01 00:00 UTC)),
            task("Ship release", 5, "Work", datetime!(2024-01-02 00:00 UTC)),
        ];
        let state = ViewState::new(SortKey::CreatedAt, FilterMode::HighPriority);
        assert_eq!(titles(&derive_view(&tasks, &state)), ["Ship release"]);
    }

    #[test]
    fn due_date_sort_puts_undated_last() {
        let created = datetime!(2024-01-01 00:00 UTC);
        let mut a = task("A", 1, "Work", created);
        a.due_date = Some(datetime!(2024-01-10 00:00 UTC));
        let b = task("B", 1, "Work", created);
        let mut c = task("C", 1, "Work", created);
        c.due_date = Some(datetime!(2024-01-05 00:00 UTC));
        let tasks = vec![a, b, c];

        let state = ViewState::new(SortKey::DueDate, FilterMode::All);
        assert_eq!(titles(&derive_view(&tasks, &state)), ["C", "A", "B"]);
    }

    #[test]
    fn created_at_sort_is_newest_first_and_the_default() {
        let tasks = vec![
            task("old", 1, "Work", datetime!(2024-01-01 00:00 UTC)),
            task("new", 1, "Work", datetime!(2024-02-01 00:00 UTC)),
            task("mid", 1, "Work", datetime!(2024-01-15 00:00 UTC)),
        ];
        assert_eq!(
            titles(&derive_view(&tasks, &ViewState::default())),
            ["new", "mid", "old"]
        );
    }

    #[test]
    fn priority_sort_is_descending_and_stable() {
        let created = datetime!(2024-01-01 00:00 UTC);
        let tasks = vec![
            task("low", 1, "Work", created),
            task("crit-a", 5, "Work", created),
            task("mid", 3, "Work", created),
            task("crit-b", 5, "Work", created),
        ];
        let state = ViewState::new(SortKey::Priority, FilterMode::All);
        assert_eq!(
            titles(&derive_view(&tasks, &state)),
            ["crit-a", "crit-b", "mid", "low"]
        );
    }

    #[test]
    fn title_and_category_sorts_are_case_insensitive() {
        let created = datetime!(2024-01-01 00:00 UTC);
        let tasks = vec![
            task("banana", 1, "work", created),
            task("Apple", 1, "Health", created),
            task("cherry", 1, "Learning", created),
        ];
        let by_title = ViewState::new(SortKey::Title, FilterMode::All);
        assert_eq!(titles(&derive_view(&tasks, &by_title)), ["Apple", "banana", "cherry"]);

        let by_category = ViewState::new(SortKey::Category, FilterMode::All);
        assert_eq!(
            titles(&derive_view(&tasks, &by_category)),
            ["Apple", "cherry", "banana"]
        );
    }

    #[test]
    fn search_runs_before_status_filter() {
        let created = datetime!(2024-01-01 00:00 UTC);
        let mut done = task("Report draft", 1, "Work", created);
        done.completed = true;
        let tasks = vec![
            done,
            task("Report final", 1, "Work", created),
            task("Groceries", 1, "Shopping", created),
        ];
        let state = ViewState::new(SortKey::Title, FilterMode::Pending).with_search("REPORT");
        assert_eq!(titles(&derive_view(&tasks, &state)), ["Report final"]);

        let state = ViewState::new(SortKey::Title, FilterMode::Completed).with_search("report");
        assert_eq!(titles(&derive_view(&tasks, &state)), ["Report draft"]);

        let state = ViewState::new(SortKey::Title, FilterMode::All).with_search("shop");
        assert_eq!(titles(&derive_view(&tasks, &state)), ["Groceries"]);
    }

    #[test]
    fn names_parse_leniently() {
        assert_eq!("dueDate".parse::<SortKey>(), Ok(SortKey::DueDate));
        assert_eq!("due-date".parse::<SortKey>(), Ok(SortKey::DueDate));
        assert_eq!("CREATED_AT".parse::<SortKey>(), Ok(SortKey::CreatedAt));
        assert_eq!(SortKey::from_name_lossy("bogus"), SortKey::CreatedAt);

        assert_eq!("high-priority".parse::<FilterMode>(), Ok(FilterMode::HighPriority));
        assert_eq!("Pending".parse::<FilterMode>(), Ok(FilterMode::Pending));
        assert_eq!(FilterMode::from_name_lossy("weird"), FilterMode::All);
        assert!("weird".parse::<FilterMode>().is_err());
    }

    #[test]
    fn wire_names_roundtrip_through_display() {
        for key in SortKey::ALL {
            assert_eq!(key.to_string().parse::<SortKey>(), Ok(key));
        }
        for mode in FilterMode::ALL {
            assert_eq!(mode.to_string().parse::<FilterMode>(), Ok(mode));
        }
    }
}
