//! Reading and writing the task file.
//!
//! The file is a pretty-printed JSON array of task records. Priority and
//! status are stored as their label text. Each call opens, fully reads or
//! writes, and closes the file; nothing is held between calls.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::task::Task;

/// Result of reading the task file.
#[derive(Debug, Default)]
pub struct Loaded {
    pub store: TaskStore,
    /// The file did not exist yet.
    pub first_run: bool,
}

/// Loads the store from `path`. A missing file is a first run and yields an
/// empty store. One undecodable record fails the whole load.
pub fn load(path: &Path) -> Result<Loaded> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No task file yet, starting empty");
            return Ok(Loaded {
                store: TaskStore::new(),
                first_run: true,
            });
        }
        Err(source) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let tasks: Vec<Task> = serde_json::from_str(&data)?;
    info!(path = %path.display(), count = tasks.len(), "Tasks loaded");
    Ok(Loaded {
        store: TaskStore::from_tasks(tasks)?,
        first_run: false,
    })
}

/// Like [`load`], but never fails: on error the store starts empty and the
/// error is handed back for the caller to report.
pub fn load_or_default(path: &Path) -> (Loaded, Option<Error>) {
    match load(path) {
        Ok(loaded) => (loaded, None),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to load tasks, starting empty");
            (Loaded::default(), Some(err))
        }
    }
}

/// Overwrites `path` with every task in the store. On failure the in-memory
/// store is untouched, so the caller may retry.
pub fn save(path: &Path, store: &TaskStore) -> Result<()> {
    let mut json = serde_json::to_string_pretty(store.tasks())?;
    json.push('\n');

    if let Err(source) = fs::write(path, json) {
        warn!(path = %path.display(), error = %source, "Failed to save tasks");
        return Err(Error::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(path = %path.display(), count = store.len(), "Tasks saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempdir().unwrap();
        let loaded = load(&dir.path().join("tasks.json")).unwrap();
        assert!(loaded.first_run);
        assert!(loaded.store.is_empty());
        assert_eq!(loaded.store.next_id(), 1);
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[{\"id\": 1,").unwrap();

        assert!(matches!(load(&path), Err(Error::Decode(_))));
    }

    #[test]
    fn one_bad_label_aborts_the_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[
              {"id": 1, "title": "ok", "description": "", "priority": "Низкий",
               "status": "Выполнено", "created_at": "01.01.2024 10:00"},
              {"id": 2, "title": "bad", "description": "", "priority": "Низкий",
               "status": "Done", "created_at": "01.01.2024 10:00"}
            ]"#,
        )
        .unwrap();

        let (loaded, err) = load_or_default(&path);
        assert!(loaded.store.is_empty());
        assert!(!loaded.first_run);
        assert!(matches!(err, Some(Error::Decode(_))));
    }

    #[test]
    fn largest_possible_id_degrades_to_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"id": 4294967295, "title": "last", "description": "", "priority": "Низкий",
                 "status": "Выполнено", "created_at": "01.01.2024 10:00"}]"#,
        )
        .unwrap();

        let (loaded, err) = load_or_default(&path);
        assert!(loaded.store.is_empty());
        assert_eq!(loaded.store.next_id(), 1);
        assert!(matches!(err, Some(Error::Validation(_))));
    }

    #[test]
    fn existing_file_is_not_a_first_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "[]").unwrap();

        let loaded = load(&path).unwrap();
        assert!(!loaded.first_run);
        assert!(loaded.store.is_empty());
    }

    #[test]
    fn directory_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(Error::Io { .. })));
    }

    #[test]
    fn save_into_missing_directory_fails_without_touching_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("tasks.json");
        let mut store = TaskStore::new();
        store.add(crate::task::NewTask::new("keep")).unwrap();
        let before = store.clone();

        assert!(matches!(save(&path, &store), Err(Error::Io { .. })));
        assert_eq!(store, before);
    }

    #[test]
    fn saved_file_uses_label_text_and_null_due_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = TaskStore::new();
        store.add(crate::task::NewTask::new("Email Alice")).unwrap();
        save(&path, &store).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"status\": \"К выполнению\""));
        assert!(raw.contains("\"priority\": \"Средний\""));
        assert!(raw.contains("\"due_date\": null"));
        assert!(raw.contains("\"tags\": []"));
    }
}
