//! ABSENT → ACTIVE → DELETED → ACTIVE transitions.

use crate::common::*;
use revstore::prelude::*;
use revstore::Revstore;

#[test]
fn create_then_read_returns_v1() {
    let db = ephemeral();
    let key = patient("p1");

    let created = db
        .resources
        .create_with_id(&key, &json!({"name": "Alice"}))
        .unwrap();
    assert_eq!(created.version_id, 1);
    assert_eq!(created.outcome, OutcomeStatus::Created);

    let read = db.resources.read(&key).unwrap();
    assert_eq!(read.body, json!({"name": "Alice"}));
    assert_eq!(read.version_id, 1);
    assert_eq!(read.etag(), "W/\"1\"");
    assert_eq!(read.location(), "Patient/p1/_history/1");
}

#[test]
fn server_assigned_ids_are_unique() {
    let db = ephemeral();
    let a = db.resources.create("Observation", &json!({})).unwrap();
    let b = db.resources.create("Observation", &json!({})).unwrap();
    assert_ne!(a.key, b.key);
    assert_eq!(db.resources.list("Observation").len(), 2);
}

#[test]
fn delete_then_recreate_continues_numbering() {
    let db = ephemeral();
    let key = patient("p1");

    db.resources.create_with_id(&key, &json!({"v": 1})).unwrap();
    let deleted = db.resources.delete(&key, Precondition::None).unwrap();
    assert_eq!(deleted.version_id, 2);
    assert_eq!(deleted.outcome, OutcomeStatus::Deleted);
    assert_eq!(db.resources.state(&key), LifecycleState::Deleted);

    let err = db.resources.read(&key).unwrap_err();
    assert!(err.is_gone());
    assert!(matches!(err, Error::Gone { version_id: 2, .. }));

    let recreated = db
        .resources
        .update(&key, &json!({"v": 3}), Precondition::IfNoneMatch)
        .unwrap();
    assert_eq!(recreated.version_id, 3);
    assert_eq!(recreated.outcome, OutcomeStatus::Created);
    assert!(db.resources.exists(&key));
}

#[test]
fn create_on_active_already_exists() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();

    let err = db.resources.create_with_id(&key, &json!({})).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
    assert!(err.is_conflict());
}

#[test]
fn create_after_delete_starts_new_epoch() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();

    let created = db.resources.create_with_id(&key, &json!({"again": true})).unwrap();
    assert_eq!(created.version_id, 3);
    assert_eq!(created.outcome, OutcomeStatus::Created);
}

#[test]
fn delete_absent_is_not_found() {
    let db = ephemeral();
    let err = db
        .resources
        .delete(&patient("nobody"), Precondition::None)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn double_delete_is_idempotent_by_default() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();

    let again = db.resources.delete(&key, Precondition::None).unwrap();
    assert_eq!(again.outcome, OutcomeStatus::Unchanged);
    assert_eq!(again.version_id, 2);
}

#[test]
fn repeat_tombstone_policy_appends() {
    let db = Revstore::builder()
        .delete_policy(DeletePolicy::RepeatTombstone)
        .open()
        .unwrap();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();

    let again = db.resources.delete(&key, Precondition::None).unwrap();
    assert_eq!(again.outcome, OutcomeStatus::Deleted);
    assert_eq!(again.version_id, 3);
}

#[test]
fn delete_disabled_is_not_supported() {
    let db = Revstore::builder().allow_delete(false).open().unwrap();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();

    let err = db.resources.delete(&key, Precondition::None).unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
    assert!(db.resources.exists(&key));
}

#[test]
fn update_without_create_on_update() {
    let db = Revstore::builder().create_on_update(false).open().unwrap();
    let key = patient("p1");

    let err = db
        .resources
        .update(&key, &json!({}), Precondition::None)
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.resources.state(&key), LifecycleState::Absent);

    db.resources.create_with_id(&key, &json!({})).unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();
    let err = db
        .resources
        .update(&key, &json!({}), Precondition::None)
        .unwrap_err();
    assert!(err.is_gone());

    // If-None-Match still creates
    let created = db
        .resources
        .update(&key, &json!({}), Precondition::IfNoneMatch)
        .unwrap();
    assert_eq!(created.version_id, 3);
}

#[test]
fn vread_of_tombstone_is_gone() {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({"a": 1})).unwrap();
    db.resources.delete(&key, Precondition::None).unwrap();

    assert_eq!(db.resources.vread(&key, 1).unwrap().body, json!({"a": 1}));
    assert!(db.resources.vread(&key, 2).unwrap_err().is_gone());
    assert!(matches!(
        db.resources.vread(&key, 3).unwrap_err(),
        Error::VersionNotFound { version_id: 3, .. }
    ));
}

#[test]
fn invalid_keys_rejected() {
    let db = ephemeral();
    for key in [
        ResourceKey::new("", "p1"),
        ResourceKey::new("Patient", ""),
        ResourceKey::new("Pat/ient", "p1"),
    ] {
        assert!(matches!(
            db.resources.create_with_id(&key, &json!({})),
            Err(Error::InvalidKey(_))
        ));
    }
}
