use chrono::{TimeZone, Utc};
use permahost_core::{Link, RepoRecord, RepoStatus, SyncSuccess};
use serde_json::{Value, json};

fn registered() -> RepoRecord {
    let link = Link::parse("https://example.com/a.git").unwrap();
    RepoRecord::new(&link, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_registered_record_omits_sync_fields() {
    let value = serde_json::to_value(registered()).unwrap();

    assert_eq!(value["link"], "https://example.com/a.git");
    assert_eq!(value["contentHash"], "");
    assert_eq!(value["pinned"], false);
    assert_eq!(value["failureCount"], 0);
    assert!(value.get("lastSyncedAt").is_none());
    assert!(value.get("lastError").is_none());
    assert!(value.get("commit").is_none());
}

#[test]
fn test_synced_record_uses_camel_case() {
    let mut record = registered();
    record.record_success(SyncSuccess {
        content_hash: "Qm123".to_string(),
        commit: Some("9fceb02".to_string()),
        name: None,
        synced_at: Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap(),
    });

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["contentHash"], "Qm123");
    assert_eq!(value["pinned"], true);
    assert_eq!(value["lastSyncedAt"], "2024-03-02T12:00:00Z");
    assert_eq!(value["commit"], "9fceb02");
}

#[test]
fn test_minimal_document_deserializes() {
    let doc = json!({
        "link": "/srv/git/project",
        "registeredAt": "2024-03-01T12:00:00Z"
    });

    let record: RepoRecord = serde_json::from_value(doc).unwrap();
    assert_eq!(record.link(), "/srv/git/project");
    assert_eq!(record.status(), RepoStatus::Registered);
    assert_eq!(record.failure_count(), 0);
}

#[test]
fn test_status_serializes_lowercase() {
    let value: Value = serde_json::to_value(RepoStatus::Failed).unwrap();
    assert_eq!(value, "failed");
}
