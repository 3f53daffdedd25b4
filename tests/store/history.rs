//! History listing and paging.

use crate::common::*;
use revstore::prelude::*;

fn seeded(versions: u64) -> (revstore::Revstore, ResourceKey) {
    let db = ephemeral();
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({"v": 1})).unwrap();
    for v in 2..=versions {
        db.resources
            .update(&key, &json!({ "v": v }), Precondition::None)
            .unwrap();
    }
    (db, key)
}

#[test]
fn history_is_newest_first() {
    let (db, key) = seeded(5);
    let history = db.resources.history(&key, HistoryQuery::all()).unwrap();
    let ids: Vec<u64> = history.iter().map(|r| r.version_id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);
    assert_contiguous(&history);
}

#[test]
fn history_paging() {
    let (db, key) = seeded(10);

    let page = db
        .resources
        .history(&key, HistoryQuery::all().limit(3))
        .unwrap();
    assert_eq!(page.iter().map(|r| r.version_id).collect::<Vec<_>>(), vec![10, 9, 8]);

    let next = db
        .resources
        .history(&key, HistoryQuery::all().limit(3).before(8))
        .unwrap();
    assert_eq!(next.iter().map(|r| r.version_id).collect::<Vec<_>>(), vec![7, 6, 5]);

    let tail = db
        .resources
        .history(&key, HistoryQuery::all().before(2))
        .unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].version_id, 1);
}

#[test]
fn history_includes_tombstones() {
    let (db, key) = seeded(2);
    db.resources.delete(&key, Precondition::None).unwrap();
    db.resources
        .update(&key, &json!({"back": true}), Precondition::IfNoneMatch)
        .unwrap();

    let history = db.resources.history(&key, HistoryQuery::all()).unwrap();
    assert_contiguous(&history);
    let markers: Vec<bool> = history.iter().map(|r| r.is_deletion_marker).collect();
    assert_eq!(markers, vec![false, true, false, false]);
    assert!(history[1].payload.is_empty());
}

#[test]
fn vread_every_version() {
    let (db, key) = seeded(4);
    for v in 1..=4u64 {
        assert_eq!(db.resources.vread(&key, v).unwrap().body, json!({ "v": v }));
    }
}
