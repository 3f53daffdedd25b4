//! Random operation sequences checked against a small reference model.

use crate::common::*;
use proptest::prelude::*;
use revstore::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create(usize),
    Update(usize),
    UpdateIfMatch(usize, u64),
    Delete(usize),
    Erase(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let slot = 0usize..3;
    prop_oneof![
        1 => slot.clone().prop_map(Op::Create),
        3 => slot.clone().prop_map(Op::Update),
        1 => (slot.clone(), 1u64..6).prop_map(|(s, v)| Op::UpdateIfMatch(s, v)),
        2 => slot.clone().prop_map(Op::Delete),
        1 => slot.prop_map(Op::Erase),
    ]
}

/// Head of one resource: `None` when absent, else (version, tombstone)
type Head = Option<(u64, bool)>;

fn next(head: Head) -> u64 {
    head.map_or(1, |(v, _)| v + 1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn store_matches_model(ops in prop::collection::vec(op(), 1..40)) {
        let db = ephemeral();
        let mut heads: [Head; 3] = [None; 3];
        let keys: Vec<_> = (0..3).map(|i| patient(&format!("m{}", i))).collect();

        for op in ops {
            match op {
                Op::Create(s) => {
                    let result = db.resources.create_with_id(&keys[s], &json!({}));
                    match heads[s] {
                        Some((_, false)) => {
                            prop_assert!(matches!(result, Err(Error::AlreadyExists(_))));
                        }
                        head => {
                            let w = result.unwrap();
                            prop_assert_eq!(w.version_id, next(head));
                            prop_assert_eq!(w.outcome, OutcomeStatus::Created);
                            heads[s] = Some((w.version_id, false));
                        }
                    }
                }
                Op::Update(s) => {
                    let w = db
                        .resources
                        .update(&keys[s], &json!({}), Precondition::None)
                        .unwrap();
                    let expected = match heads[s] {
                        Some((_, false)) => OutcomeStatus::Updated,
                        _ => OutcomeStatus::Created,
                    };
                    prop_assert_eq!(w.version_id, next(heads[s]));
                    prop_assert_eq!(w.outcome, expected);
                    heads[s] = Some((w.version_id, false));
                }
                Op::UpdateIfMatch(s, v) => {
                    let result = db
                        .resources
                        .update(&keys[s], &json!({}), Precondition::IfMatch(v));
                    match heads[s] {
                        Some((head, false)) if head == v => {
                            let w = result.unwrap();
                            prop_assert_eq!(w.version_id, head + 1);
                            heads[s] = Some((head + 1, false));
                        }
                        Some((_, false)) => {
                            let is_conflict = matches!(result, Err(ref e) if e.is_conflict());
                            prop_assert!(is_conflict);
                        }
                        Some((_, true)) => prop_assert!(matches!(result, Err(ref e) if e.is_gone())),
                        None => prop_assert!(matches!(result, Err(ref e) if e.is_not_found())),
                    }
                }
                Op::Delete(s) => {
                    let result = db.resources.delete(&keys[s], Precondition::None);
                    match heads[s] {
                        None => prop_assert!(matches!(result, Err(ref e) if e.is_not_found())),
                        Some((head, true)) => {
                            let w = result.unwrap();
                            prop_assert_eq!(w.version_id, head);
                            prop_assert_eq!(w.outcome, OutcomeStatus::Unchanged);
                        }
                        Some((head, false)) => {
                            let w = result.unwrap();
                            prop_assert_eq!(w.version_id, head + 1);
                            prop_assert_eq!(w.outcome, OutcomeStatus::Deleted);
                            heads[s] = Some((head + 1, true));
                        }
                    }
                }
                Op::Erase(s) => {
                    let result = db.resources.erase(&keys[s], None);
                    match heads[s] {
                        None => prop_assert!(matches!(result, Err(ref e) if e.is_not_found())),
                        Some(_) => {
                            prop_assert!(result.is_ok());
                            heads[s] = None;
                        }
                    }
                }
            }
        }

        for (key, head) in keys.iter().zip(heads) {
            let read = db.resources.read(key);
            match head {
                None => {
                    prop_assert!(read.unwrap_err().is_not_found());
                    prop_assert_eq!(db.resources.state(key), LifecycleState::Absent);
                }
                Some((v, true)) => {
                    prop_assert!(read.unwrap_err().is_gone());
                    prop_assert_eq!(db.resources.state(key), LifecycleState::Deleted);
                    prop_assert_eq!(
                        db.resources.history(key, HistoryQuery::all()).unwrap().len() as u64,
                        v
                    );
                }
                Some((v, false)) => {
                    prop_assert_eq!(read.unwrap().version_id, v);
                    let history = db.resources.history(key, HistoryQuery::all()).unwrap();
                    assert_contiguous(&history);
                }
            }
        }
    }
}
