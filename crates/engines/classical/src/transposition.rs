//! Fixed-size transposition table shared between searches.
//!
//! Slots live in a flat array indexed by `hash % capacity`. Each slot keeps the
//! full 64-bit key, so two positions that only share an index never alias; two
//! positions with the same Zobrist hash still do. Every access first takes the
//! slot's advisory lock with a single compare-exchange and gives up on
//! contention: writers drop the store, readers report a miss.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chess_core::{Move, PieceKind};
use tracing::debug;

/// Default table size (256 MiB).
pub const DEFAULT_TABLE_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Fail high: the true score is at least the stored one.
    Lower,
    Exact,
    /// Fail low: the true score is at most the stored one.
    Upper,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub best_move: Move,
    pub score: i32,
    pub depth: u8,
    pub bound: Bound,
}

#[derive(Debug, Default)]
struct Slot {
    lock: AtomicBool,
    key: AtomicU64,
    data: AtomicU64,
}

// data layout: from 0..6, to 6..12, promo 12..15, en passant 15, castle 16,
// bound 17..19, occupied 19, depth 20..28, score 32..64
const OCCUPIED: u64 = 1 << 19;

fn pack(entry: &TtEntry) -> u64 {
    let mv = entry.best_move;
    let promo = match mv.promo {
        None => 0,
        Some(PieceKind::Knight) => 1,
        Some(PieceKind::Bishop) => 2,
        Some(PieceKind::Rook) => 3,
        Some(_) => 4,
    };
    let bound = match entry.bound {
        Bound::Lower => 0,
        Bound::Exact => 1,
        Bound::Upper => 2,
    };
    (mv.from as u64 & 0x3f)
        | (mv.to as u64 & 0x3f) << 6
        | promo << 12
        | (mv.is_en_passant as u64) << 15
        | (mv.is_castle as u64) << 16
        | bound << 17
        | OCCUPIED
        | (entry.depth as u64) << 20
        | (entry.score as u32 as u64) << 32
}

fn unpack(data: u64) -> TtEntry {
    let promo = match (data >> 12) & 0x7 {
        0 => None,
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        _ => Some(PieceKind::Queen),
    };
    let bound = match (data >> 17) & 0x3 {
        0 => Bound::Lower,
        1 => Bound::Exact,
        _ => Bound::Upper,
    };
    TtEntry {
        best_move: Move {
            from: (data & 0x3f) as u8,
            to: ((data >> 6) & 0x3f) as u8,
            promo,
            is_en_passant: data & (1 << 15) != 0,
            is_castle: data & (1 << 16) != 0,
        },
        score: (data >> 32) as u32 as i32,
        depth: ((data >> 20) & 0xff) as u8,
        bound,
    }
}

/// Releases a slot lock when dropped.
struct SlotGuard<'a>(&'a AtomicBool);

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Slot {
    fn try_lock(&self) -> Option<SlotGuard<'_>> {
        self.lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SlotGuard(&self.lock))
    }
}

pub struct TranspositionTable {
    slots: Box<[Slot]>,
    used: AtomicUsize,
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_BYTES)
    }
}

impl TranspositionTable {
    /// Table holding as many slots as fit in `bytes` (at least one).
    pub fn new(bytes: usize) -> Self {
        let capacity = (bytes / std::mem::size_of::<Slot>()).max(1);
        let slots: Box<[Slot]> = (0..capacity).map(|_| Slot::default()).collect();
        debug!(bytes, capacity, "allocated transposition table");
        Self {
            slots,
            used: AtomicUsize::new(0),
        }
    }

    pub fn new_with_mb(mb: usize) -> Self {
        Self::new(mb.saturating_mul(1024 * 1024))
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.data.store(0, Ordering::Relaxed);
            slot.key.store(0, Ordering::Relaxed);
        }
        self.used.store(0, Ordering::Relaxed);
    }

    #[inline]
    fn slot(&self, hash: u64) -> &Slot {
        &self.slots[(hash % self.slots.len() as u64) as usize]
    }

    /// Store an entry unless a deeper one for the same position is already
    /// present. A full table is cleared first.
    pub fn insert_if_needed(&self, hash: u64, best_move: Move, score: i32, depth: u8, bound: Bound) {
        if self.len() >= self.capacity() {
            debug!(capacity = self.capacity(), "transposition table full, clearing");
            self.clear();
        }

        let slot = self.slot(hash);
        let Some(_guard) = slot.try_lock() else {
            return;
        };
        let data = slot.data.load(Ordering::Relaxed);
        let occupied = data & OCCUPIED != 0;
        if occupied && slot.key.load(Ordering::Relaxed) == hash && unpack(data).depth > depth {
            return;
        }

        let entry = TtEntry {
            best_move,
            score,
            depth,
            bound,
        };
        slot.key.store(hash, Ordering::Relaxed);
        slot.data.store(pack(&entry), Ordering::Relaxed);
        if !occupied {
            self.used.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Entry stored for `hash`. A slot locked by a concurrent writer reads as a miss.
    pub fn load(&self, hash: u64) -> Option<TtEntry> {
        let slot = self.slot(hash);
        let _guard = slot.try_lock()?;
        let data = slot.data.load(Ordering::Relaxed);
        if data & OCCUPIED == 0 || slot.key.load(Ordering::Relaxed) != hash {
            return None;
        }
        Some(unpack(data))
    }
}

#[cfg(test)]
#[path = "transposition_tests.rs"]
mod transposition_tests;
