use super::*;
use std::sync::Arc;

fn mv(text: &str) -> Move {
    chess_core::Position::startpos().parse_move(text).unwrap()
}

fn table_with_slots(slots: usize) -> TranspositionTable {
    TranspositionTable::new(slots * std::mem::size_of::<Slot>())
}

#[test]
fn test_insert_then_load() {
    let tt = table_with_slots(1024);
    tt.insert_if_needed(0xDEAD_BEEF, mv("e2e4"), 35, 4, Bound::Exact);
    assert_eq!(
        tt.load(0xDEAD_BEEF),
        Some(TtEntry {
            best_move: mv("e2e4"),
            score: 35,
            depth: 4,
            bound: Bound::Exact
        })
    );
    assert_eq!(tt.len(), 1);
    assert_eq!(tt.load(0xBEEF), None);
}

#[test]
fn test_entry_fields_survive_packing() {
    let tt = table_with_slots(64);
    let promo = Move::with_promo(52, 60, PieceKind::Knight);
    let castle = chess_core::Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1")
        .unwrap()
        .parse_move("e1g1")
        .unwrap();
    assert!(castle.is_castle);

    tt.insert_if_needed(1, promo, -1_000_000 + 7, 255, Bound::Upper);
    tt.insert_if_needed(2, castle, i32::MIN + 1, 0, Bound::Lower);
    let a = tt.load(1).unwrap();
    assert_eq!((a.best_move, a.score, a.depth, a.bound), (promo, -999_993, 255, Bound::Upper));
    let b = tt.load(2).unwrap();
    assert_eq!((b.best_move, b.score, b.depth, b.bound), (castle, i32::MIN + 1, 0, Bound::Lower));
}

#[test]
fn test_shallower_store_does_not_replace_deeper() {
    let tt = table_with_slots(64);
    tt.insert_if_needed(7, mv("d2d4"), 20, 6, Bound::Exact);
    tt.insert_if_needed(7, mv("e2e4"), 90, 3, Bound::Lower);
    assert_eq!(tt.load(7).unwrap().best_move, mv("d2d4"));

    // Equal depth overwrites
    tt.insert_if_needed(7, mv("c2c4"), 15, 6, Bound::Upper);
    let entry = tt.load(7).unwrap();
    assert_eq!((entry.best_move, entry.bound), (mv("c2c4"), Bound::Upper));
    assert_eq!(tt.len(), 1);
}

#[test]
fn test_index_collision_is_not_a_hit() {
    let tt = table_with_slots(16);
    let cap = tt.capacity() as u64;
    tt.insert_if_needed(3, mv("g1f3"), 10, 9, Bound::Exact);
    assert_eq!(tt.load(3 + cap), None);

    // A different key in the slot is replaced regardless of depth
    tt.insert_if_needed(3 + cap, mv("b1c3"), -10, 1, Bound::Exact);
    assert_eq!(tt.load(3), None);
    assert_eq!(tt.load(3 + cap).unwrap().best_move, mv("b1c3"));
    assert_eq!(tt.len(), 1);
}

#[test]
fn test_full_table_is_cleared_before_insert() {
    let tt = table_with_slots(2);
    assert_eq!(tt.capacity(), 2);
    tt.insert_if_needed(0, mv("a2a3"), 1, 1, Bound::Exact);
    tt.insert_if_needed(1, mv("b2b3"), 2, 1, Bound::Exact);
    assert_eq!(tt.len(), 2);

    tt.insert_if_needed(2, mv("c2c3"), 3, 1, Bound::Exact);
    assert_eq!(tt.len(), 1);
    assert_eq!(tt.load(1), None);
    assert_eq!(tt.load(2).unwrap().score, 3);
    assert!(tt.len() <= tt.capacity());
}

#[test]
fn test_locked_slot_reads_as_miss_and_skips_writes() {
    let tt = table_with_slots(8);
    tt.insert_if_needed(5, mv("e2e4"), 1, 1, Bound::Exact);

    let guard = tt.slot(5).try_lock().unwrap();
    assert_eq!(tt.load(5), None);
    tt.insert_if_needed(5, mv("d2d4"), 2, 8, Bound::Exact);
    drop(guard);

    assert_eq!(tt.load(5).unwrap().best_move, mv("e2e4"));
}

#[test]
fn test_clear_and_sizes() {
    let tt = TranspositionTable::new_with_mb(1);
    assert_eq!(tt.capacity(), 1024 * 1024 / std::mem::size_of::<Slot>());
    assert!(tt.is_empty());
    tt.insert_if_needed(42, mv("e2e4"), 0, 1, Bound::Exact);
    assert!(!tt.is_empty());
    tt.clear();
    assert!(tt.is_empty());
    assert_eq!(tt.load(42), None);

    assert_eq!(TranspositionTable::new(0).capacity(), 1);
}

#[test]
fn test_shared_between_threads() {
    let tt = Arc::new(table_with_slots(4096));
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let tt = Arc::clone(&tt);
            std::thread::spawn(move || {
                for i in 0..500u64 {
                    let hash = t * 10_000 + i;
                    tt.insert_if_needed(hash, mv("e2e4"), i as i32, 2, Bound::Exact);
                    if let Some(entry) = tt.load(hash) {
                        assert_eq!(entry.score, i as i32);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert!(tt.len() <= tt.capacity());
}
