//! Physical erase.

use crate::common::*;
use revstore::prelude::*;
use revstore_durability::JOURNAL_FILE;
use std::fs;
use tempfile::TempDir;

#[test]
fn erase_makes_resource_unreadable() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({"a": 1})).unwrap();
    db.resources
        .update(&key, &json!({"a": 2}), Precondition::None)
        .unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();

    let record = db.resources.erase(&key, Some("subject request")).unwrap();
    assert_eq!(record.versions_erased, 3);
    assert_eq!(record.reason.as_deref(), Some("subject request"));

    assert!(db.resources.read(&key).unwrap_err().is_not_found());
    assert!(db.resources.vread(&key, 1).unwrap_err().is_not_found());
    assert!(db.resources.history(&key, HistoryQuery::all()).unwrap_err().is_not_found());
    assert_eq!(db.resources.state(&key), LifecycleState::Absent);
    assert!(db.resources.list("Patient").is_empty());
}

#[test]
fn erase_active_resource() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    assert_eq!(db.resources.erase(&key, None).unwrap().versions_erased, 1);
    assert!(db.resources.read(&key).unwrap_err().is_not_found());
}

#[test]
fn erase_absent_is_not_found() {
    let db = ephemeral();
    assert!(db
        .resources
        .erase(&patient("nobody"), None)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn numbering_restarts_after_erase() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    db.resources.update(&key, &json!({}), Precondition::None).unwrap();
    db.resources.erase(&key, None).unwrap();

    let created = db.resources.create_with_id(&key, &json!({"new": true})).unwrap();
    assert_eq!(created.version_id, 1);
    assert_eq!(created.outcome, OutcomeStatus::Created);
    assert_eq!(db.resources.history(&key, HistoryQuery::all()).unwrap().len(), 1);
}

#[test]
fn erase_leaves_other_resources_alone() {
    let db = ephemeral();
    db.resources.create_with_id(&patient("a"), &json!({})).unwrap();
    db.resources.create_with_id(&patient("b"), &json!({})).unwrap();
    db.resources.erase(&patient("a"), None).unwrap();
    assert!(db.resources.exists(&patient("b")));
    assert_eq!(db.resources.list("Patient"), vec![patient("b")]);
}

#[test]
fn compact_on_erase_removes_payload_from_disk() {
    let dir = TempDir::new().unwrap();
    let db = strict_builder(dir.path())
        .compact_on_erase(true)
        .open()
        .unwrap();
    let secret = patient("secret");
    db.resources
        .create_with_id(&secret, &json!({"ssn": "123-45-6789"}))
        .unwrap();
    db.resources
        .create_with_id(&patient("keep"), &json!({"name": "kept"}))
        .unwrap();

    let journal = dir.path().join(JOURNAL_FILE);
    let contains = |needle: &str| {
        let bytes = fs::read(&journal).unwrap();
        bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
    };
    assert!(contains("123-45-6789"));

    db.resources.erase(&secret, None).unwrap();
    assert!(!contains("123-45-6789"));
    assert!(contains("kept"));
}

#[test]
fn erase_without_compaction_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let db = strict_builder(dir.path()).open().unwrap();
        db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
        db.resources.erase(&patient("p1"), None).unwrap();
        db.resources.create_with_id(&patient("p1"), &json!({"epoch": 2})).unwrap();
    }
    let db = strict_builder(dir.path()).open().unwrap();
    let read = db.resources.read(&patient("p1")).unwrap();
    assert_eq!(read.version_id, 1);
    assert_eq!(read.body, json!({"epoch": 2}));
}
