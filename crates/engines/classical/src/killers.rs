//! Killer moves: per ply, the two quiet moves that most recently caused a
//! beta cutoff.

use chess_core::Move;

#[derive(Debug, Clone, Default)]
pub struct KillerMoveTable {
    plies: Vec<[Option<Move>; 2]>,
}

impl KillerMoveTable {
    pub fn new() -> Self {
        Self {
            plies: Vec::with_capacity(64),
        }
    }

    /// Record `mv` as the newest killer at `ply`. Storing the current first
    /// killer again is a no-op.
    pub fn update(&mut self, ply: usize, mv: Move) {
        if ply >= self.plies.len() {
            self.plies.resize(ply + 1, [None, None]);
        }
        let slots = &mut self.plies[ply];
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    /// Both killers for `ply`, newest first.
    pub fn fetch(&self, ply: usize) -> [Option<Move>; 2] {
        self.plies.get(ply).copied().unwrap_or([None, None])
    }

    pub fn clear(&mut self) {
        self.plies.clear();
    }
}

#[cfg(test)]
#[path = "killers_tests.rs"]
mod killers_tests;
