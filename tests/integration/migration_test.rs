//! Legacy JSON documents are imported into SQLite exactly once.

use super::init_test_env;
use apicli::models::{Headers, HttpMethod, RequestRecord, ResponseRecord, SavedRequest};
use apicli::storage::{JsonStorage, SqliteStorage, Storage};
use chrono::{Duration, Utc};
use tempfile::TempDir;

fn seed_legacy(dir: &TempDir) -> Vec<RequestRecord> {
    let legacy = JsonStorage::open(dir.path()).unwrap();

    let records: Vec<RequestRecord> = (0..3)
        .map(|i| {
            let mut record = RequestRecord::new(
                HttpMethod::GET,
                format!("https://e.com/{}", i),
                Headers::new(),
                String::new(),
            )
            .with_response(ResponseRecord::new(200, "200 OK"));
            record.timestamp = Utc::now() - Duration::minutes(10 - i);
            record
        })
        .collect();
    for record in &records {
        legacy.add_to_history(record).unwrap();
    }

    legacy
        .add_to_collection("smoke", &SavedRequest::new("health", HttpMethod::GET, "api/health"))
        .unwrap();
    legacy
        .add_to_collection("smoke", &SavedRequest::new("login", HttpMethod::POST, "api/login"))
        .unwrap();
    legacy.create_alias("api", "https://e.com/v1").unwrap();
    records
}

#[test]
fn test_first_open_imports_and_marks_documents() {
    init_test_env();
    let dir = TempDir::new().unwrap();
    let records = seed_legacy(&dir);

    let storage = SqliteStorage::open(dir.path()).unwrap();

    let history = storage.load_history().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].id, records[2].id);
    assert_eq!(history[0].response.as_ref().unwrap().status, "200 OK");

    let smoke = storage.get_collection("smoke").unwrap().unwrap();
    let names: Vec<&str> = smoke.requests.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["health", "login"]);

    assert_eq!(storage.get_alias("api").unwrap().as_deref(), Some("https://e.com/v1"));

    for file in ["history.json", "collections.json", "aliases.json"] {
        assert!(!dir.path().join(file).exists(), "{} still present", file);
        assert!(dir.path().join(format!("{}.migrated", file)).exists());
    }
}

#[test]
fn test_reopening_does_not_import_again() {
    init_test_env();
    let dir = TempDir::new().unwrap();
    seed_legacy(&dir);
    drop(SqliteStorage::open(dir.path()).unwrap());

    // A new legacy document appears after the first import.
    let legacy = JsonStorage::open(dir.path()).unwrap();
    legacy.create_alias("late", "https://late.example.com").unwrap();

    let storage = SqliteStorage::open(dir.path()).unwrap();
    assert!(storage.get_alias("late").unwrap().is_none());
    assert!(dir.path().join("aliases.json").exists());
    assert_eq!(storage.get_collection("smoke").unwrap().unwrap().len(), 2);
}

#[test]
fn test_corrupt_document_is_left_in_place() {
    init_test_env();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("collections.json"), "not json at all").unwrap();
    std::fs::write(
        dir.path().join("aliases.json"),
        r#"{"aliases": {"api": "https://e.com"}}"#,
    )
    .unwrap();

    let storage = SqliteStorage::open(dir.path()).unwrap();

    assert!(dir.path().join("collections.json").exists());
    assert!(!dir.path().join("collections.json.migrated").exists());
    assert!(storage.list_collections().unwrap().is_empty());
    assert_eq!(storage.get_alias("api").unwrap().as_deref(), Some("https://e.com"));
}
