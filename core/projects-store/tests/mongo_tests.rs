//! MongoDB tests that do not need a running server.

use pretty_assertions::assert_eq;
use projects_store::{document_to_record, record_to_document, MongoConfig, StoreError};
use projects_types::ProjectRecord;
use serde_json::json;

// ── Config ───────────────────────────────────────────────────────

#[test]
fn from_uri_uses_default_namespace() {
    let cfg = MongoConfig::from_uri("mongodb://localhost:27017");
    assert_eq!(cfg.database, "projectsDB");
    assert_eq!(cfg.collection, "projects");
}

#[test]
fn with_namespace_overrides() {
    let cfg = MongoConfig::from_uri("mongodb://localhost").with_namespace("db", "coll");
    assert_eq!(cfg.database, "db");
    assert_eq!(cfg.collection, "coll");
}

#[test]
fn from_parts_without_credentials() {
    let cfg = MongoConfig::from_parts("db.internal", Some(27018), None, None).unwrap();
    assert_eq!(cfg.uri, "mongodb://db.internal:27018");
}

#[test]
fn from_parts_defaults_port() {
    let cfg = MongoConfig::from_parts("db.internal", None, None, None).unwrap();
    assert_eq!(cfg.uri, "mongodb://db.internal:27017");
}

#[test]
fn from_parts_encodes_credentials() {
    let cfg = MongoConfig::from_parts("db", None, Some("app"), Some("p@ss:word/1")).unwrap();
    assert_eq!(cfg.uri, "mongodb://app:p%40ss%3Aword%2F1@db:27017");
}

#[test]
fn from_parts_rejects_empty_host() {
    let err = MongoConfig::from_parts("  ", None, None, None).unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn from_parts_rejects_password_without_user() {
    let err = MongoConfig::from_parts("db", None, None, Some("secret")).unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn redacted_uri_masks_password() {
    let cfg = MongoConfig::from_uri("mongodb://app:secret@db:27017/?authSource=admin");
    let redacted = cfg.redacted_uri();
    assert!(!redacted.contains("secret"));
    assert!(redacted.contains("app:****@db"));
}

#[test]
fn redacted_uri_without_password_is_unchanged() {
    let cfg = MongoConfig::from_uri("mongodb://db:27017");
    assert_eq!(cfg.redacted_uri(), "mongodb://db:27017");
}

// ── Document conversion ──────────────────────────────────────────

#[test]
fn record_document_roundtrip_keeps_fields() {
    let body = json!({
        "packageName": "a",
        "code": "2",
        "ip": "",
        "count": 3,
        "tags": ["x", "y"],
        "meta": {"nested": true},
    });
    let record = ProjectRecord::from_value(body.clone()).unwrap();
    let doc = record_to_document(&record).unwrap();
    let back = document_to_record(doc).unwrap();
    assert_eq!(back.into_value(), body);
}

#[test]
fn document_id_is_stripped() {
    let mut doc = record_to_document(
        &ProjectRecord::from_value(json!({"packageName": "a"})).unwrap(),
    )
    .unwrap();
    doc.insert("_id", mongodb::bson::oid::ObjectId::new());
    let record = document_to_record(doc).unwrap();
    assert!(record.get("_id").is_none());
    assert_eq!(record.package_name(), Some("a"));
}

#[test]
fn oversized_unsigned_is_invalid_record() {
    let record = ProjectRecord::from_value(json!({"packageName": "a", "n": u64::MAX})).unwrap();
    let err = record_to_document(&record).unwrap_err();
    assert!(matches!(err, StoreError::InvalidRecord(_)));
}
