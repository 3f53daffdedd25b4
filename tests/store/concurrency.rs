//! Racing writers on one resource.

use crate::common::*;
use revstore::prelude::*;
use revstore::Revstore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

const THREADS: usize = 8;

#[test]
fn racing_updates_are_gap_free() {
    let db = Arc::new(ephemeral());
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..50 {
                    db.resources
                        .update(&key, &json!({ "t": t, "i": i }), Precondition::None)
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let history = db.resources.history(&key, HistoryQuery::all()).unwrap();
    assert_eq!(history.len(), 1 + THREADS * 50);
    assert_contiguous(&history);
}

#[test]
fn racing_creators_exactly_one_wins() {
    let db = Arc::new(ephemeral());
    let key = patient("contested");
    let barrier = Arc::new(Barrier::new(THREADS));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            let wins = Arc::clone(&wins);
            thread::spawn(move || {
                barrier.wait();
                match db.resources.create_with_id(&key, &json!({ "t": t })) {
                    Ok(_) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(e) => assert!(matches!(e, Error::AlreadyExists(_)), "{:?}", e),
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(db.resources.read(&key).unwrap().version_id, 1);
}

#[test]
fn racing_if_match_one_succeeds() {
    let db = Arc::new(ephemeral());
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.resources
                    .update(&key, &json!({}), Precondition::IfMatch(1))
                    .is_ok()
            })
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(db.resources.read(&key).unwrap().version_id, 2);
}

#[test]
fn one_create_per_epoch() {
    let db = Arc::new(ephemeral());
    let key = patient("p1");
    let barrier = Arc::new(Barrier::new(THREADS));
    let created = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            let created = Arc::clone(&created);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..40 {
                    if (t + i) % 3 == 0 {
                        let _ = db.resources.delete(&key, Precondition::None);
                    } else if let Ok(w) =
                        db.resources
                            .update(&key, &json!({}), Precondition::IfNoneMatch)
                    {
                        assert_eq!(w.outcome, OutcomeStatus::Created);
                        created.lock().unwrap().push(w.version_id);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let history = db.resources.history(&key, HistoryQuery::all()).unwrap();
    assert_contiguous(&history);

    let mut created = created.lock().unwrap().clone();
    created.sort_unstable();
    let before = created.len();
    created.dedup();
    assert_eq!(before, created.len(), "two creates reported the same version");

    // Every create starts an epoch: it is v1 or directly follows a tombstone
    let oldest_first: Vec<_> = history.iter().rev().collect();
    for v in created {
        let idx = (v - 1) as usize;
        assert!(!oldest_first[idx].is_deletion_marker);
        if v > 1 {
            assert!(
                oldest_first[idx - 1].is_deletion_marker,
                "create at v{} did not follow a tombstone",
                v
            );
        }
    }
}

#[test]
fn erase_racing_writes_ends_unreadable() {
    let db = Arc::new(ephemeral());
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let writers: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    db.resources
                        .update(&key, &json!({}), Precondition::None)
                        .unwrap();
                    if let Ok(history) = db.resources.history(&key, HistoryQuery::all()) {
                        assert_contiguous(&history);
                    }
                }
            })
        })
        .collect();

    let eraser = {
        let db = Arc::clone(&db);
        let key = key.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..20 {
                match db.resources.erase(&key, None) {
                    Ok(_) => {}
                    Err(e) => assert!(e.is_not_found(), "{:?}", e),
                }
            }
        })
    };

    for h in writers {
        h.join().unwrap();
    }
    eraser.join().unwrap();

    db.resources.erase(&key, None).unwrap();
    assert!(db.resources.read(&key).unwrap_err().is_not_found());
}

#[test]
fn reject_in_flight_only_fails_with_erase_conflict() {
    let db = Arc::new(
        Revstore::builder()
            .erase_semantics(EraseSemantics::RejectInFlight)
            .open()
            .unwrap(),
    );
    let key = patient("p1");
    db.resources.create_with_id(&key, &json!({})).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS + 1));

    let writers: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let key = key.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    if let Err(e) = db.resources.update(&key, &json!({}), Precondition::None) {
                        assert!(matches!(e, Error::ConflictDuringErase(_)), "{:?}", e);
                        assert!(e.is_retryable());
                    }
                }
            })
        })
        .collect();

    let eraser = {
        let db = Arc::clone(&db);
        let key = key.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..20 {
                let _ = db.resources.erase(&key, None);
            }
        })
    };

    for h in writers {
        h.join().unwrap();
    }
    eraser.join().unwrap();

    if let Ok(history) = db.resources.history(&key, HistoryQuery::all()) {
        assert_contiguous(&history);
    }
}

#[test]
fn different_resources_do_not_interfere() {
    let db = Arc::new(ephemeral());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let key = patient(&format!("p{}", t));
                barrier.wait();
                db.resources.create_with_id(&key, &json!({})).unwrap();
                for _ in 0..20 {
                    db.resources
                        .update(&key, &json!({}), Precondition::None)
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(db.resources.list("Patient").len(), THREADS);
    for t in 0..THREADS {
        let key = patient(&format!("p{}", t));
        assert_eq!(db.resources.read(&key).unwrap().version_id, 21);
    }
}

#[test]
fn random_mixed_workload_keeps_histories_contiguous() {
    use rand::Rng;

    let db = Arc::new(ephemeral());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                barrier.wait();
                for _ in 0..200 {
                    let key = patient(&format!("r{}", rng.gen_range(0..4)));
                    match rng.gen_range(0..10) {
                        0..=5 => {
                            db.resources
                                .update(&key, &json!({}), Precondition::None)
                                .unwrap();
                        }
                        6..=8 => {
                            if let Err(e) = db.resources.delete(&key, Precondition::None) {
                                assert!(e.is_not_found(), "{:?}", e);
                            }
                        }
                        _ => {
                            if let Err(e) = db.resources.erase(&key, None) {
                                assert!(e.is_not_found(), "{:?}", e);
                            }
                        }
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for key in db.resources.list("Patient") {
        let history = db.resources.history(&key, HistoryQuery::all()).unwrap();
        assert_contiguous(&history);
    }
}
