//! Snapshot file tests
//!
//! Dump / import round trips, older snapshot layouts and corrupt files.

use std::fs;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use url::Url;

use decaylink::errors::DecaylinkError;
use decaylink::storage::{LinkStore, SnapshotFile, SnapshotLoad};

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn dump_to_string(store: &LinkStore) -> String {
    let mut out = Vec::new();
    store.dump(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_round_trip_preserves_fetch_behaviour() {
    let original = LinkStore::new();
    let expires = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();

    let unlimited = original
        .submit(url("https://example.com/a?x=1"), 6, Some(expires), 0)
        .unwrap();
    let limited = original
        .submit(url("https://example.com/b"), 6, None, 2)
        .unwrap();

    let text = dump_to_string(&original);
    let restored = LinkStore::new();
    assert_eq!(restored.import(text.as_bytes()).unwrap(), 2);

    let a = restored.fetch(&unlimited).unwrap();
    assert_eq!(a.record.url.as_str(), "https://example.com/a?x=1");
    assert_eq!(a.record.expires_at, Some(expires));
    assert!(!a.was_last_use);

    assert!(!restored.fetch(&limited).unwrap().was_last_use);
    assert!(restored.fetch(&limited).unwrap().was_last_use);
    assert!(restored.fetch(&limited).is_none());
}

#[test]
fn test_dump_import_dump_is_stable() {
    let store = LinkStore::new();
    for i in 0..10 {
        let expires = (i % 2 == 0).then(|| Utc::now() + Duration::days(i));
        store
            .submit(url(&format!("https://example.com/{}", i)), 4, expires, i as u32)
            .unwrap();
    }

    let first = dump_to_string(&store);
    let copy = LinkStore::new();
    copy.import(first.as_bytes()).unwrap();
    assert_eq!(dump_to_string(&copy), first);
}

#[test]
fn test_dump_format_is_readable_json() {
    let store = LinkStore::new();
    let token = store
        .submit(url("https://example.com/"), 3, None, 4)
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&dump_to_string(&store)).unwrap();
    assert_eq!(value[&token]["url"], "https://example.com/");
    assert_eq!(value[&token]["expires"], serde_json::Value::Null);
    assert_eq!(value[&token]["uses"], 4);
}

#[test]
fn test_import_accepts_older_layout() {
    let legacy = r#"{
        "AbCd": {
            "URL": {
                "Scheme": "https",
                "Opaque": "",
                "User": null,
                "Host": "example.com",
                "Path": "/old",
                "RawPath": "",
                "ForceQuery": false,
                "RawQuery": "q=1",
                "Fragment": "",
                "RawFragment": ""
            },
            "Expires": "0001-01-01T00:00:00Z",
            "Uses": 0
        },
        "EfGh": {
            "URL": "https://example.org/text",
            "Expires": "2031-05-06T07:08:09Z",
            "Uses": 3
        }
    }"#;

    let store = LinkStore::new();
    assert_eq!(store.import(legacy.as_bytes()).unwrap(), 2);

    let old = store.fetch("AbCd").unwrap();
    assert_eq!(old.record.url.as_str(), "https://example.com/old?q=1");
    assert_eq!(old.record.expires_at, None);

    let text = store.fetch("EfGh").unwrap();
    assert_eq!(text.record.url.as_str(), "https://example.org/text");
    assert_eq!(text.record.remaining_uses, 2);
    assert_eq!(
        text.record.expires_at,
        Some(Utc.with_ymd_and_hms(2031, 5, 6, 7, 8, 9).unwrap())
    );
}

#[test]
fn test_malformed_import_leaves_store_untouched() {
    let store = LinkStore::new();
    let token = store
        .submit(url("https://example.com/keep"), 3, None, 0)
        .unwrap();

    let bad_inputs = [
        "",
        "{",
        "[]",
        r#"{"abc": {"url": "not a url", "expires": null, "uses": 0}}"#,
        r#"{"abc": {"url": "https://example.com", "expires": null, "uses": -1}}"#,
        r#"{"ok": {"url": "https://example.com"}, "broken": {"uses": 1}"#,
    ];

    for input in bad_inputs {
        let err = store.import(input.as_bytes()).unwrap_err();
        assert!(
            matches!(err, DecaylinkError::Deserialization(_)),
            "{:?} gave {:?}",
            input,
            err
        );
        assert_eq!(store.len(), 1);
        assert!(store.fetch(&token).is_some());
    }
}

#[test]
fn test_import_replaces_previous_contents() {
    let store = LinkStore::new();
    let old = store
        .submit(url("https://example.com/old"), 3, None, 0)
        .unwrap();

    let count = store
        .import(r#"{"new1": {"url": "https://example.com/new", "expires": null, "uses": 0}}"#.as_bytes())
        .unwrap();
    assert_eq!(count, 1);
    assert!(store.fetch(&old).is_none());
    assert!(store.fetch("new1").is_some());
}

#[test]
fn test_snapshot_file_absent_then_written_then_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    let file = SnapshotFile::new(&path);

    let store = LinkStore::new();
    assert_eq!(file.load_into(&store).unwrap(), SnapshotLoad::Absent);

    let token = store
        .submit(url("https://example.com/persist"), 3, None, 0)
        .unwrap();
    file.write_from(&store).unwrap();
    assert!(path.exists());

    // 只剩目标文件，没有遗留临时文件
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);

    let restored = LinkStore::new();
    assert_eq!(file.load_into(&restored).unwrap(), SnapshotLoad::Loaded(1));
    assert_eq!(
        restored.fetch(&token).unwrap().record.url.as_str(),
        "https://example.com/persist"
    );
}

#[test]
fn test_snapshot_overwrite_replaces_contents() {
    let dir = TempDir::new().unwrap();
    let file = SnapshotFile::new(dir.path().join("links.json"));

    let store = LinkStore::new();
    store
        .submit(url("https://example.com/1"), 3, None, 0)
        .unwrap();
    file.write_from(&store).unwrap();

    store
        .submit(url("https://example.com/2"), 3, None, 0)
        .unwrap();
    file.write_from(&store).unwrap();

    let restored = LinkStore::new();
    assert_eq!(file.load_into(&restored).unwrap(), SnapshotLoad::Loaded(2));
}

#[test]
fn test_corrupt_snapshot_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("links.json");
    fs::write(&path, "{ this is not json").unwrap();

    let store = LinkStore::new();
    store
        .submit(url("https://example.com/live"), 3, None, 0)
        .unwrap();

    let err = SnapshotFile::new(&path).load_into(&store).unwrap_err();
    assert!(matches!(err, DecaylinkError::Deserialization(_)));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_write_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let file = SnapshotFile::new(dir.path().join("missing").join("links.json"));

    let err = file.write_from(&LinkStore::new()).unwrap_err();
    assert!(matches!(err, DecaylinkError::FileOperation(_)));
}
