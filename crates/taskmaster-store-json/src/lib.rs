//! JSON file storage for taskmaster.

mod error;

pub use error::StoreError;

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use taskmaster_core::Task;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Result of decoding a persisted task document.
#[derive(Debug, Default)]
pub struct DecodedTasks {
    /// Records that decoded and passed the entity checks, in stored order.
    pub tasks: Vec<Task>,
    /// Number of records that were skipped.
    pub dropped: usize,
}

/// Decode a JSON array of task records.
///
/// Never fails: a document that is not a JSON array yields no tasks, and
/// records that are malformed, violate entity invariants or repeat an
/// earlier id are skipped individually.
#[must_use]
pub fn decode_tasks(text: &str) -> DecodedTasks {
    let records = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(records)) => records,
        Ok(other) => {
            warn!(kind = value_kind(&other), "Task document is not an array; ignoring it");
            return DecodedTasks::default();
        }
        Err(err) => {
            warn!(%err, "Task document is not valid JSON; ignoring it");
            return DecodedTasks::default();
        }
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut decoded = DecodedTasks {
        tasks: Vec::with_capacity(records.len()),
        dropped: 0,
    };
    for (index, record) in records.into_iter().enumerate() {
        let task = match serde_json::from_value::<Task>(record) {
            Ok(task) => task,
            Err(err) => {
                warn!(index, %err, "Dropping malformed task record");
                decoded.dropped += 1;
                continue;
            }
        };
        if let Err(err) = task.check_invariants() {
            warn!(index, id = %task.id, %err, "Dropping invalid task record");
            decoded.dropped += 1;
            continue;
        }
        if !seen.insert(task.id) {
            warn!(index, id = %task.id, "Dropping task record with duplicate id");
            decoded.dropped += 1;
            continue;
        }
        decoded.tasks.push(task);
    }
    decoded
}

/// Encode tasks as the persisted JSON document.
///
/// # Errors
/// Returns [`StoreError::Serialize`] if serialization fails.
pub fn encode_tasks(tasks: &[Task]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Task collection stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by the file at `path`. Nothing is touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the task file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every valid task from disk.
    ///
    /// A missing file is an empty collection. Undecodable content is logged and
    /// skipped (see [`decode_tasks`]).
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the file exists but cannot be read.
    pub fn load(&self) -> Result<Vec<Task>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Task file does not exist yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let decoded = decode_tasks(&text);
        info!(
            path = %self.path.display(),
            loaded = decoded.tasks.len(),
            dropped = decoded.dropped,
            "Loaded tasks"
        );
        Ok(decoded.tasks)
    }

    /// Replace the file with the given collection.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so readers never observe a partial write.
    ///
    /// # Errors
    /// Returns a [`StoreError`] if the directory cannot be created, the
    /// document cannot be written, or the rename fails.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let body = encode_tasks(tasks)?;
        let io_err = |source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(body.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| StoreError::Persist {
            path: self.path.clone(),
            source: err.error,
        })?;

        info!(path = %self.path.display(), count = tasks.len(), "Saved tasks");
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "id": "019a6ff3-119f-7661-869e-2a6c4fca5c4f",
        "title": "Buy milk",
        "description": "",
        "priority": 2,
        "completed": false,
        "createdAt": "2024-01-01T10:00:00.000Z",
        "updatedAt": "2024-01-01T10:00:00.000Z",
        "category": "Shopping"
    }"#;

    #[test]
    fn non_array_documents_decode_to_nothing() {
        assert!(decode_tasks("{}").tasks.is_empty());
        assert!(decode_tasks("not json").tasks.is_empty());
        assert!(decode_tasks("").tasks.is_empty());
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let doc = format!(
            r#"[{VALID},
                {{"id": "nope", "title": "bad id"}},
                {{"id": "019a6ff5-7c1f-7643-80c8-28f4c7d1754e", "title": "   ", "priority": 1,
                  "createdAt": "2024-01-01T10:00:00Z", "updatedAt": "2024-01-01T10:00:00Z", "category": "Work"}},
                {{"id": "019a6ff5-7c1f-7643-80c8-28f4c7d1754f", "title": "bad date", "priority": 1,
                  "createdAt": "yesterday", "updatedAt": "2024-01-01T10:00:00Z", "category": "Work"}},
                42]"#
        );
        let decoded = decode_tasks(&doc);
        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.dropped, 4);
        assert_eq!(decoded.tasks[0].title, "Buy milk");
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let second = VALID.replace("Buy milk", "Buy bread");
        let doc = format!("[{VALID}, {second}]");
        let decoded = decode_tasks(&doc);
        assert_eq!(decoded.tasks.len(), 1);
        assert_eq!(decoded.tasks[0].title, "Buy milk");
        assert_eq!(decoded.dropped, 1);
    }

    #[test]
    fn records_updated_before_created_are_dropped() {
        let doc = format!(
            "[{}]",
            VALID.replace(
                r#""updatedAt": "2024-01-01T10:00:00.000Z""#,
                r#""updatedAt": "2023-12-31T10:00:00.000Z""#
            )
        );
        assert!(decode_tasks(&doc).tasks.is_empty());
    }

    #[test]
    fn missing_description_and_completed_default() {
        let doc = r#"[{"id": "019a6ff3-119f-7661-869e-2a6c4fca5c4f", "title": "Minimal", "priority": 3,
            "createdAt": "2024-01-01T10:00:00Z", "updatedAt": "2024-01-01T10:00:00Z", "category": "Other"}]"#;
        let decoded = decode_tasks(doc);
        assert_eq!(decoded.tasks.len(), 1);
        assert!(decoded.tasks[0].description.is_empty());
        assert!(!decoded.tasks[0].completed);
        assert!(decoded.tasks[0].due_date.is_none());
    }
}
