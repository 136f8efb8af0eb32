use pretty_assertions::assert_eq;
use projects_store::{JsonFileStore, RecordStore};
use projects_types::ProjectRecord;
use serde_json::json;
use tempfile::TempDir;

fn record(value: serde_json::Value) -> ProjectRecord {
    ProjectRecord::from_value(value).unwrap()
}

fn store_in(dir: &TempDir) -> JsonFileStore {
    JsonFileStore::new(dir.path().join("projects.json"))
}

#[tokio::test]
async fn missing_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert!(store.get_all().await.unwrap().is_empty());
    assert!(store.get("a").await.unwrap().is_none());
}

#[tokio::test]
async fn blank_file_is_empty_store() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "\n  \n").unwrap();
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn put_creates_pretty_printed_file() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store
        .put("a", &record(json!({"packageName": "a", "code": "2"})))
        .await
        .unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("\n  \"a\": {"));
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, json!({"a": {"packageName": "a", "code": "2"}}));
}

#[tokio::test]
async fn put_keeps_other_records() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.put("a", &record(json!({"packageName": "a"}))).await.unwrap();
    store.put("b", &record(json!({"packageName": "b"}))).await.unwrap();
    store
        .put("a", &record(json!({"packageName": "a", "v": 2})))
        .await
        .unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["a"], record(json!({"packageName": "a", "v": 2})));
}

#[tokio::test]
async fn reopen_sees_previous_writes() {
    let dir = TempDir::new().unwrap();
    store_in(&dir)
        .put("a", &record(json!({"packageName": "a", "code": "1"})))
        .await
        .unwrap();

    let reopened = store_in(&dir);
    assert_eq!(
        reopened.get("a").await.unwrap(),
        Some(record(json!({"packageName": "a", "code": "1"})))
    );
}

#[tokio::test]
async fn non_object_entries_are_skipped() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), r#"{"a": {"packageName": "a"}, "b": 3}"#).unwrap();
    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("a"));
}

#[tokio::test]
async fn put_preserves_non_object_entries() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(
        store.path(),
        r#"{"legacy": "keepme", "a": {"packageName": "a"}}"#,
    )
    .unwrap();

    store
        .put("b", &record(json!({"packageName": "b"})))
        .await
        .unwrap();

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(on_disk["legacy"], json!("keepme"));
    assert_eq!(on_disk["a"], json!({"packageName": "a"}));
    assert_eq!(on_disk["b"], json!({"packageName": "b"}));
    assert_eq!(store.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn corrupt_file_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    std::fs::write(store.path(), "{ not json").unwrap();

    assert!(store.get_all().await.is_err());
    assert!(store.put("a", &record(json!({"packageName": "a"}))).await.is_err());
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{ not json");
}

#[tokio::test]
async fn no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.put("a", &record(json!({"packageName": "a"}))).await.unwrap();
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("projects.json")]);
}

#[tokio::test]
async fn connectivity_follows_parent_directory() {
    let dir = TempDir::new().unwrap();
    assert!(store_in(&dir).is_connected().await);

    let gone = JsonFileStore::new(dir.path().join("missing").join("projects.json"));
    assert!(!gone.is_connected().await);
    assert!(gone.put("a", &ProjectRecord::default()).await.is_err());
}
