use super::*;
use crate::stroke::StrokeInput;

fn seg(owner: Uuid, x: f64) -> StrokeSegment {
    StrokeSegment::new(owner, StrokeInput { x0: x, y0: x, x1: x, y1: x, color: "#000".into(), width: 2.0 })
        .expect("valid stroke")
}

fn ids(history: &HistoryStore) -> Vec<Uuid> {
    history.snapshot().iter().map(|s| s.id).collect()
}

#[test]
fn new_is_empty() {
    let h = HistoryStore::new();
    assert!(h.is_empty());
    assert_eq!(h.len(), 0);
    assert!(h.snapshot().is_empty());
}

#[test]
fn append_preserves_insertion_order() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let mut h = HistoryStore::new();
    let (a, b, c) = (seg(x, 0.1), seg(y, 0.2), seg(x, 0.3));
    let expected = vec![a.id, b.id, c.id];
    h.append(a);
    h.append(b);
    h.append(c);
    assert_eq!(ids(&h), expected);
}

#[test]
fn remove_last_by_owner_skips_other_owners() {
    // History = [A(x), B(y), C(x)]; undo(x) removes C, then A.
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let mut h = HistoryStore::new();
    let (a, b, c) = (seg(x, 0.1), seg(y, 0.2), seg(x, 0.3));
    let (a_id, b_id, c_id) = (a.id, b.id, c.id);
    h.append(a);
    h.append(b);
    h.append(c);

    assert_eq!(h.remove_last_by_owner(x).map(|s| s.id), Some(c_id));
    assert_eq!(ids(&h), vec![a_id, b_id]);

    assert_eq!(h.remove_last_by_owner(x).map(|s| s.id), Some(a_id));
    assert_eq!(ids(&h), vec![b_id]);
}

#[test]
fn remove_last_by_owner_without_match_has_no_effect() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let mut h = HistoryStore::new();
    h.append(seg(y, 0.1));
    let before = ids(&h);

    assert!(h.remove_last_by_owner(x).is_none());
    assert_eq!(ids(&h), before);
}

#[test]
fn remove_last_by_owner_on_empty_is_none() {
    let mut h = HistoryStore::new();
    assert!(h.remove_last_by_owner(Uuid::new_v4()).is_none());
}

#[test]
fn snapshot_is_detached_copy() {
    let x = Uuid::new_v4();
    let mut h = HistoryStore::new();
    h.append(seg(x, 0.1));
    let snap = h.snapshot();
    h.append(seg(x, 0.2));
    assert_eq!(snap.len(), 1);
    assert_eq!(h.len(), 2);
}

#[test]
fn clear_empties_history() {
    let x = Uuid::new_v4();
    let mut h = HistoryStore::new();
    h.append(seg(x, 0.1));
    h.append(seg(x, 0.2));
    h.clear();
    assert!(h.is_empty());
    assert!(h.remove_last_by_owner(x).is_none());
}
