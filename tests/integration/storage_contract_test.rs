//! The storage contract, checked against both backends.

use super::all_backends;
use apicli::models::{
    Collection, Headers, HttpMethod, RequestRecord, SavedRequest, HISTORY_CAPACITY,
};
use apicli::storage::AliasMap;
use chrono::{Duration, TimeZone, Utc};

fn record_at(seconds: i64) -> RequestRecord {
    let mut record = RequestRecord::new(
        HttpMethod::GET,
        format!("https://example.com/{}", seconds),
        Headers::new(),
        String::new(),
    );
    record.timestamp =
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds);
    record
}

#[test]
fn test_history_is_capped_at_100_newest() {
    for (backend, _dir, storage) in all_backends() {
        let records: Vec<RequestRecord> = (0..105).map(record_at).collect();
        for (i, record) in records.iter().enumerate() {
            storage.add_to_history(record).unwrap();
            let len = storage.load_history().unwrap().len();
            assert_eq!(len, (i + 1).min(HISTORY_CAPACITY), "{}", backend);
        }

        let history = storage.load_history().unwrap();
        assert_eq!(history.len(), 100, "{}", backend);
        assert_eq!(history[0].id, records[104].id, "{}", backend);
        assert_eq!(history[99].id, records[5].id, "{}", backend);
        for old in &records[..5] {
            assert!(storage.get_history_entry(&old.id).unwrap().is_none(), "{}", backend);
        }
        assert!(history
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }
}

#[test]
fn test_out_of_order_insert_is_sorted_by_timestamp() {
    for (backend, _dir, storage) in all_backends() {
        storage.add_to_history(&record_at(10)).unwrap();
        storage.add_to_history(&record_at(30)).unwrap();
        storage.add_to_history(&record_at(20)).unwrap();

        let urls: Vec<String> = storage
            .load_history()
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/30",
                "https://example.com/20",
                "https://example.com/10"
            ],
            "{}",
            backend
        );
    }
}

#[test]
fn test_clear_and_replace_history() {
    for (backend, _dir, storage) in all_backends() {
        storage.add_to_history(&record_at(1)).unwrap();
        storage.clear_history().unwrap();
        assert!(storage.load_history().unwrap().is_empty(), "{}", backend);

        let replacement: Vec<RequestRecord> = (0..120).map(record_at).collect();
        storage.save_history(&replacement).unwrap();
        let history = storage.load_history().unwrap();
        assert_eq!(history.len(), HISTORY_CAPACITY, "{}", backend);
        assert_eq!(history[0].id, replacement[119].id, "{}", backend);
    }
}

#[test]
fn test_collections_keep_order_and_create_implicitly() {
    for (backend, _dir, storage) in all_backends() {
        assert!(storage.get_collection("api").unwrap().is_none(), "{}", backend);

        for name in ["first", "second", "third"] {
            storage
                .add_to_collection("api", &SavedRequest::new(name, HttpMethod::GET, "api/x"))
                .unwrap();
        }
        // Creating an existing collection must not wipe it.
        storage.create_collection("api").unwrap();

        let collection = storage.get_collection("api").unwrap().unwrap();
        let names: Vec<&str> = collection.requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"], "{}", backend);
    }
}

#[test]
fn test_delete_collection_removes_requests() {
    for (backend, _dir, storage) in all_backends() {
        storage
            .add_to_collection("gone", &SavedRequest::new("", HttpMethod::POST, "https://e.com"))
            .unwrap();
        storage.create_collection("kept").unwrap();

        storage.delete_collection("gone").unwrap();
        storage.delete_collection("never-existed").unwrap();

        assert!(storage.get_collection("gone").unwrap().is_none(), "{}", backend);
        let names: Vec<String> = storage
            .list_collections()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["kept"], "{}", backend);

        // Re-creating starts from an empty request list.
        storage
            .add_to_collection("gone", &SavedRequest::new("new", HttpMethod::GET, "https://e.com"))
            .unwrap();
        assert_eq!(storage.get_collection("gone").unwrap().unwrap().len(), 1, "{}", backend);
    }
}

#[test]
fn test_save_collections_replaces_everything() {
    for (backend, _dir, storage) in all_backends() {
        storage.create_collection("old").unwrap();

        let mut fresh = Collection::new("fresh");
        fresh.requests.push(SavedRequest::new("a", HttpMethod::GET, "https://e.com/a"));
        fresh.requests.push(SavedRequest::new("b", HttpMethod::DELETE, "https://e.com/b"));
        storage.save_collections(&[fresh.clone()]).unwrap();

        let collections = storage.list_collections().unwrap();
        assert_eq!(collections, vec![fresh], "{}", backend);
    }
}

#[test]
fn test_aliases_last_write_wins() {
    for (backend, _dir, storage) in all_backends() {
        storage.create_alias("api", "https://one.example.com").unwrap();
        storage.create_alias("api", "https://two.example.com").unwrap();
        storage.create_alias("web", "https://web.example.com").unwrap();

        assert_eq!(
            storage.get_alias("api").unwrap().as_deref(),
            Some("https://two.example.com"),
            "{}",
            backend
        );
        assert_eq!(storage.list_aliases().unwrap().len(), 2, "{}", backend);

        storage.delete_alias("api").unwrap();
        assert!(storage.get_alias("api").unwrap().is_none(), "{}", backend);

        let mut replacement = AliasMap::new();
        replacement.insert("only".to_string(), "https://only.example.com".to_string());
        storage.save_aliases(&replacement).unwrap();
        assert_eq!(storage.list_aliases().unwrap(), replacement, "{}", backend);
    }
}

#[cfg(unix)]
#[test]
fn test_backing_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    for (backend, dir, storage) in all_backends() {
        storage.create_alias("api", "https://e.com").unwrap();
        storage.add_to_history(&record_at(0)).unwrap();

        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if !(name.ends_with(".json") || name.ends_with(".db")) {
                continue;
            }
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "{} {}", backend, name);
        }
    }
}
