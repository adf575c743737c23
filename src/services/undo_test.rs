use super::*;
use crate::stroke::StrokeInput;

fn seg(owner: Uuid, x: f64) -> StrokeSegment {
    StrokeSegment::new(owner, StrokeInput { x0: x, y0: x, x1: x, y1: x, color: "#000".into(), width: 2.0 })
        .expect("valid stroke")
}

fn ids(segments: &[StrokeSegment]) -> Vec<Uuid> {
    segments.iter().map(|s| s.id).collect()
}

/// History = [A(x), B(y), C(x)].
fn seeded(x: Uuid, y: Uuid) -> (HistoryStore, [Uuid; 3]) {
    let mut h = HistoryStore::new();
    let (a, b, c) = (seg(x, 0.1), seg(y, 0.2), seg(x, 0.3));
    let out = [a.id, b.id, c.id];
    h.append(a);
    h.append(b);
    h.append(c);
    (h, out)
}

// =============================================================================
// undo
// =============================================================================

#[test]
fn undo_pushes_removed_segment() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let (mut h, [_, _, c]) = seeded(x, y);
    let mut u = UndoManager::new();

    let UndoOutcome::Removed(removed) = u.undo(&mut h, x) else {
        panic!("expected removal");
    };
    assert_eq!(removed.id, c);
    assert_eq!(u.depth(), 1);
    assert_eq!(h.len(), 2);
}

#[test]
fn undo_with_nothing_owned_is_noop() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let mut h = HistoryStore::new();
    h.append(seg(y, 0.1));
    let mut u = UndoManager::new();

    assert_eq!(u.undo(&mut h, x), UndoOutcome::NoOp);
    assert_eq!(u.depth(), 0);
    assert_eq!(h.len(), 1);
}

// =============================================================================
// redo
// =============================================================================

#[test]
fn redo_restores_most_recent_own_entry() {
    // After undo(x) twice: redo stack = [C, A]; redo(x) restores A, not C.
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let (mut h, [a, b, c]) = seeded(x, y);
    let mut u = UndoManager::new();
    u.undo(&mut h, x);
    u.undo(&mut h, x);
    assert_eq!(ids(u.pending()), vec![c, a]);

    let UndoOutcome::Restored(restored) = u.redo(&mut h, x) else {
        panic!("expected restore");
    };
    assert_eq!(restored.id, a);
    assert_eq!(ids(&h.snapshot()), vec![b, a]);
    assert_eq!(ids(u.pending()), vec![c]);
}

#[test]
fn redo_filters_by_owner_not_global_top() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let (mut h, [_, b, c]) = seeded(x, y);
    let mut u = UndoManager::new();
    u.undo(&mut h, x); // pushes C
    u.undo(&mut h, y); // pushes B, now on top

    let UndoOutcome::Restored(restored) = u.redo(&mut h, x) else {
        panic!("expected restore");
    };
    assert_eq!(restored.id, c);
    assert_eq!(ids(u.pending()), vec![b]);
}

#[test]
fn redo_for_other_owner_is_noop() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let (mut h, _) = seeded(x, y);
    let mut u = UndoManager::new();
    u.undo(&mut h, x);

    assert_eq!(u.redo(&mut h, y), UndoOutcome::NoOp);
    assert_eq!(u.depth(), 1);
    assert_eq!(h.len(), 2);
}

#[test]
fn redo_on_empty_stack_is_noop() {
    let mut h = HistoryStore::new();
    let mut u = UndoManager::new();
    assert_eq!(u.redo(&mut h, Uuid::new_v4()), UndoOutcome::NoOp);
}

// =============================================================================
// invalidation
// =============================================================================

#[test]
fn new_draw_clears_every_owners_redo() {
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let (mut h, _) = seeded(x, y);
    let mut u = UndoManager::new();
    u.undo(&mut h, x);
    u.undo(&mut h, y);
    assert_eq!(u.depth(), 2);

    u.on_new_draw();
    assert_eq!(u.depth(), 0);
    assert_eq!(u.redo(&mut h, x), UndoOutcome::NoOp);
    assert_eq!(u.redo(&mut h, y), UndoOutcome::NoOp);
}

#[test]
fn undo_then_redo_reappends_at_end() {
    // X draws S1, Y draws S2, X undoes, X redoes: history = [S2, S1].
    let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
    let mut h = HistoryStore::new();
    let mut u = UndoManager::new();
    let (s1, s2) = (seg(x, 0.0), seg(y, 0.5));
    let (s1_id, s2_id) = (s1.id, s2.id);
    h.append(s1);
    u.on_new_draw();
    h.append(s2);
    u.on_new_draw();

    u.undo(&mut h, x);
    assert_eq!(ids(&h.snapshot()), vec![s2_id]);
    assert_eq!(ids(u.pending()), vec![s1_id]);

    u.redo(&mut h, x);
    assert_eq!(ids(&h.snapshot()), vec![s2_id, s1_id]);
    assert_eq!(u.depth(), 0);
}
