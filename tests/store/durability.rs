//! Journal persistence and recovery.

use crate::common::*;
use revstore::prelude::*;
use revstore::Revstore;
use revstore_durability::JOURNAL_FILE;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::TempDir;

#[test]
fn reopen_reproduces_state() {
    let dir = TempDir::new().unwrap();
    {
        let db = strict_builder(dir.path()).open().unwrap();
        let a = patient("a");
        db.resources.create_with_id(&a, &json!({"v": 1})).unwrap();
        db.resources
            .update(&a, &json!({"v": 2}), Precondition::IfMatch(1))
            .unwrap();

        let b = patient("b");
        db.resources.create_with_id(&b, &json!({})).unwrap();
        db.resources.delete(&b, Precondition::None).unwrap();

        let c = patient("c");
        db.resources.create_with_id(&c, &json!({})).unwrap();
        db.resources.erase(&c, Some("cleanup")).unwrap();
        db.close().unwrap();
    }

    let db = strict_builder(dir.path()).open().unwrap();
    let a = db.resources.read(&patient("a")).unwrap();
    assert_eq!(a.version_id, 2);
    assert_eq!(a.body, json!({"v": 2}));
    assert_eq!(db.resources.vread(&patient("a"), 1).unwrap().body, json!({"v": 1}));

    assert!(db.resources.read(&patient("b")).unwrap_err().is_gone());
    assert_contiguous(&db.resources.history(&patient("b"), HistoryQuery::all()).unwrap());

    assert!(db.resources.read(&patient("c")).unwrap_err().is_not_found());
    assert_eq!(db.info().resources, 2);

    // Numbering continues from the recovered head
    let next = db
        .resources
        .update(&patient("a"), &json!({"v": 3}), Precondition::IfMatch(2))
        .unwrap();
    assert_eq!(next.version_id, 3);
}

#[test]
fn torn_tail_is_ignored() {
    let dir = TempDir::new().unwrap();
    {
        let db = strict_builder(dir.path()).open().unwrap();
        db.resources.create_with_id(&patient("p1"), &json!({"ok": true})).unwrap();
    }

    // A frame header promising more bytes than follow
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join(JOURNAL_FILE))
        .unwrap();
    file.write_all(&[64, 0, 0, 0, 1, 2, 3, 4, 9, 9]).unwrap();
    drop(file);

    let db = strict_builder(dir.path()).open().unwrap();
    assert_eq!(db.resources.read(&patient("p1")).unwrap().body, json!({"ok": true}));

    // The journal is writable again after truncation
    db.resources
        .update(&patient("p1"), &json!({"ok": 2}), Precondition::None)
        .unwrap();
    drop(db);
    let db = strict_builder(dir.path()).open().unwrap();
    assert_eq!(db.resources.read(&patient("p1")).unwrap().version_id, 2);
}

#[test]
fn corruption_mid_journal_fails_open() {
    let dir = TempDir::new().unwrap();
    {
        let db = strict_builder(dir.path()).open().unwrap();
        for i in 0..3 {
            db.resources
                .create_with_id(&patient(&format!("p{}", i)), &json!({"i": i}))
                .unwrap();
        }
    }

    let path = dir.path().join(JOURNAL_FILE);
    let mut bytes = fs::read(&path).unwrap();
    // Inside the first frame's body
    bytes[12] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    let err = strict_builder(dir.path()).open().unwrap_err();
    assert!(err.is_serious(), "{:?}", err);
}

#[test]
fn config_file_is_read_on_open() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("revstore.toml"),
        "allow_delete = false\n\n[durability]\nmode = \"strict\"\n",
    )
    .unwrap();

    let db = Revstore::open(dir.path()).unwrap();
    assert_eq!(db.durability_mode(), DurabilityMode::Strict);
    db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
    assert!(matches!(
        db.resources.delete(&patient("p1"), Precondition::None),
        Err(Error::NotSupported(_))
    ));
}

#[test]
fn builder_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("revstore.toml"), "allow_delete = false\n").unwrap();

    let db = Revstore::builder()
        .path(dir.path())
        .allow_delete(true)
        .open()
        .unwrap();
    db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
    assert!(db.resources.delete(&patient("p1"), Precondition::None).is_ok());
}

#[test]
fn bad_config_file_fails_open() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("revstore.toml"), "delete_policy = 7\n").unwrap();
    assert!(matches!(
        Revstore::open(dir.path()).unwrap_err(),
        Error::Serialization(_)
    ));
}

#[test]
fn no_durability_writes_no_journal() {
    let dir = TempDir::new().unwrap();
    let db = Revstore::builder()
        .path(dir.path())
        .no_durability()
        .open()
        .unwrap();
    db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
    assert!(db.is_ephemeral());
    assert!(!dir.path().join(JOURNAL_FILE).exists());
}

#[test]
fn batched_mode_persists_after_flush() {
    let dir = TempDir::new().unwrap();
    {
        let db = Revstore::builder()
            .path(dir.path())
            .buffered_with(60_000, 1_000_000)
            .open()
            .unwrap();
        db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
        db.flush().unwrap();
    }
    let db = Revstore::open(dir.path()).unwrap();
    assert!(db.resources.exists(&patient("p1")));
}

#[test]
fn compact_shrinks_journal() {
    let (_dir, db) = persistent();
    for i in 0..20 {
        db.resources
            .create_with_id(&patient(&format!("p{}", i)), &json!({"padding": "x".repeat(64)}))
            .unwrap();
    }
    for i in 0..19 {
        db.resources.erase(&patient(&format!("p{}", i)), None).unwrap();
    }
    let before = db.info().journal_bytes;
    let after = db.compact().unwrap();
    assert!(after < before, "{} !< {}", after, before);
    assert_eq!(db.info().journal_bytes, after);
    assert_eq!(db.info().resources, 1);
}

#[test]
fn open_temp_is_persistent() {
    let db = Revstore::builder().strict().open_temp().unwrap();
    assert!(!db.is_ephemeral());
    let path = db.path().unwrap().to_path_buf();
    db.resources.create_with_id(&patient("p1"), &json!({})).unwrap();
    drop(db);

    let db = Revstore::builder().path(&path).open().unwrap();
    assert!(db.resources.exists(&patient("p1")));
    drop(db);
    let _ = fs::remove_dir_all(path);
}
