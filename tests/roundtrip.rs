use std::fs;

use tempfile::tempdir;
use termtasks::{storage, NewTask, Priority, Status, TaskPatch, TaskStore};

fn populated() -> TaskStore {
    let mut store = TaskStore::new();
    store
        .add(
            NewTask::new("Email Alice")
                .description("about the invoice")
                .priority(Priority::Urgent)
                .due_date("20.10.2026")
                .tags(["work", "Mail", "work"]),
        )
        .unwrap();
    store.add(NewTask::new("Buy milk").priority(Priority::Low)).unwrap();
    store.add(NewTask::new("Old chore")).unwrap();
    store
        .edit(
            2,
            TaskPatch {
                status: Some(Status::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
    store.delete(3).unwrap();
    store
}

#[test]
fn save_then_load_reproduces_the_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    let store = populated();

    storage::save(&path, &store).unwrap();
    let loaded = storage::load(&path).unwrap().store;

    assert_eq!(loaded.tasks(), store.tasks());
    assert_eq!(loaded.find(1).unwrap().tags, vec!["work", "Mail", "work"]);
}

#[test]
fn next_id_after_load_follows_largest_saved_id() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    storage::save(&path, &populated()).unwrap();

    // Task 3 was deleted before saving, so only ids up to 2 are on disk.
    let mut loaded = storage::load(&path).unwrap().store;
    assert_eq!(loaded.next_id(), 3);
    assert_eq!(loaded.add(NewTask::new("next")).unwrap().id, 3);
}

#[test]
fn loads_legacy_records_without_optional_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
          {
            "id": 7,
            "title": "Позвонить маме",
            "description": "",
            "priority": "Высокий",
            "status": "Отменено",
            "created_at": "31.12.2023 23:59"
          }
        ]"#,
    )
    .unwrap();

    let store = storage::load(&path).unwrap().store;
    let task = store.find(7).unwrap();
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.status, Status::Cancelled);
    assert_eq!(task.due_date, None);
    assert!(task.tags.is_empty());
    assert_eq!(store.next_id(), 8);

    storage::save(&path, &store).unwrap();
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("Позвонить маме"));
    assert!(raw.contains("  {\n    \"id\": 7,"));
}

#[test]
fn corrupt_file_degrades_to_empty_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, "not json").unwrap();

    let (loaded, err) = storage::load_or_default(&path);
    assert!(loaded.store.is_empty());
    assert!(err.is_some());
}
