//! Backup artifacts built from the task collection.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use taskmaster_core::Task;
use taskmaster_core::view::UnknownOption;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::date_util::format_date;

/// Errors raised while rendering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON encoding failed.
    #[error("failed to encode export: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Timestamp formatting failed.
    #[error("failed to format export timestamp: {0}")]
    Format(#[from] time::error::Format),
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Machine-readable document with every task field.
    #[default]
    Json,
    /// Human-readable checklist.
    Markdown,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }

    /// Name used on the command line and in config files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(UnknownOption::new("export format", s)),
        }
    }
}

/// A rendered export, ready to be written somewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Suggested file name, e.g. `tasks-2024-01-05.json`.
    pub file_name: String,
    /// Document body.
    pub contents: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    #[serde(with = "time::serde::rfc3339")]
    exported_at: OffsetDateTime,
    task_count: usize,
    tasks: &'a [Task],
}

/// Render `tasks` in `format`, stamped with `now`.
///
/// # Errors
/// Returns [`ExportError`] if encoding fails.
pub fn export(
    tasks: &[Task],
    format: ExportFormat,
    now: OffsetDateTime,
) -> Result<ExportArtifact, ExportError> {
    let contents = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&ExportDocument {
            exported_at: now,
            task_count: tasks.len(),
            tasks,
        })?,
        ExportFormat::Markdown => render_markdown(tasks, now)?,
    };
    Ok(ExportArtifact {
        file_name: format!("tasks-{}.{}", format_date(now), format.extension()),
        contents,
    })
}

fn render_markdown(tasks: &[Task], now: OffsetDateTime) -> Result<String, ExportError> {
    let completed = tasks.iter().filter(|task| task.completed).count();
    let mut out = String::from("# Tasks\n\n");
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Exported {} - {} tasks, {} completed\n",
        now.format(&Rfc3339)?,
        tasks.len(),
        completed
    );
    if tasks.is_empty() {
        out.push_str("_No tasks._\n");
        return Ok(out);
    }
    for task in tasks {
        let mark = if task.completed { 'x' } else { ' ' };
        let _ = write!(
            out,
            "- [{mark}] **{}** ({}, {}",
            task.title,
            task.priority.label(),
            task.category
        );
        if let Some(due) = task.due_date {
            let _ = write!(out, ", due {}", format_date(due));
        }
        out.push_str(")\n");
        for line in task.description.lines().filter(|line| !line.trim().is_empty()) {
            let _ = writeln!(out, "  {line}");
        }
    }
    Ok(out)
}

/// Write `artifact` into `dir`, creating the directory if needed.
///
/// # Errors
/// Returns an error naming the path when the directory or file cannot be written.
pub fn write_export(dir: &Path, artifact: &ExportArtifact) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(&artifact.file_name);
    fs::write(&path, &artifact.contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = artifact.contents.len(), "Wrote export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskmaster_core::TaskDraft;
    use taskmaster_core::id::TaskId;
    use time::macros::datetime;

    fn task(draft: TaskDraft, at: OffsetDateTime) -> Task {
        let draft = draft.validate().unwrap_or_else(|err| panic!("valid draft: {err}"));
        Task::create(TaskId::new(), draft, at)
    }

    fn sample() -> Vec<Task> {
        let release = task(
            TaskDraft::new("Ship release")
                .with_priority(5)
                .with_category("Work")
                .with_description("Tag, build and publish")
                .with_due_date(Some(datetime!(2024-01-10 00:00 UTC))),
            datetime!(2024-01-03 08:00 UTC),
        );
        let mut milk = task(
            TaskDraft::new("Buy milk").with_priority(2).with_category("Shopping"),
            datetime!(2024-01-01 09:00 UTC),
        );
        milk.toggle_completed(datetime!(2024-01-02 09:00 UTC));
        vec![release, milk]
    }

    #[test]
    fn json_export_wraps_records_with_metadata() {
        let tasks = sample();
        let now = datetime!(2024-01-05 10:00 UTC);
        let artifact =
            export(&tasks, ExportFormat::Json, now).unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(artifact.file_name, "tasks-2024-01-05.json");
        let doc: serde_json::Value =
            serde_json::from_str(&artifact.contents).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(doc["exportedAt"], "2024-01-05T10:00:00Z");
        assert_eq!(doc["taskCount"], 2);
        let records: Vec<Task> =
            serde_json::from_value(doc["tasks"].clone()).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(records, tasks);
    }

    #[test]
    fn markdown_export_lists_a_checklist() {
        let artifact = export(&sample(), ExportFormat::Markdown, datetime!(2024-01-05 10:00 UTC))
            .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(artifact.file_name, "tasks-2024-01-05.md");
        assert!(artifact.contents.contains("2 tasks, 1 completed"));
        assert!(
            artifact
                .contents
                .contains("- [ ] **Ship release** (Critical, Work, due 2024-01-10)\n  Tag, build and publish\n")
        );
        assert!(artifact.contents.contains("- [x] **Buy milk** (Normal, Shopping)\n"));
    }

    #[test]
    fn empty_markdown_export_says_so() {
        let artifact = export(&[], ExportFormat::Markdown, datetime!(2024-01-05 10:00 UTC))
            .unwrap_or_else(|err| panic!("{err}"));
        assert!(artifact.contents.contains("_No tasks._"));
    }

    #[test]
    fn format_names_parse_leniently() {
        assert_eq!("JSON".parse::<ExportFormat>().ok(), Some(ExportFormat::Json));
        assert_eq!("md".parse::<ExportFormat>().ok(), Some(ExportFormat::Markdown));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn write_export_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("{err}"));
        let target = dir.path().join("backups");
        let artifact = ExportArtifact {
            file_name: "tasks-2024-01-05.json".into(),
            contents: "[]".into(),
        };
        let path = write_export(&target, &artifact).unwrap_or_else(|err| panic!("{err:#}"));
        assert_eq!(path, target.join("tasks-2024-01-05.json"));
        assert_eq!(fs::read_to_string(path).unwrap_or_default(), "[]");
    }
}
