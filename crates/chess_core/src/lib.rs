pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod error;
pub mod game;
pub mod movegen;
pub mod perft;
pub mod time_control;
pub mod types;
pub mod uci;
pub mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use board::*;
pub use error::{ChessError, ChessResult};
pub use game::{DrawReason, GameResult, GameState};
pub use movegen::*;
pub use perft::{perft, perft_divide};
pub use time_control::*;
pub use types::*;
pub use uci::*;
pub use zobrist::ZOBRIST;

use std::time::Duration;

// =============================================================================
// Engine trait and search reporting
// =============================================================================

/// Result of a search operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    /// Best move of the last completed iteration (None if no legal moves)
    pub best_move: Option<Move>,
    /// Score in centipawns from the side to move's perspective
    pub score: i32,
    /// Last fully completed depth
    pub depth: u8,
    /// Nodes visited, quiescence included
    pub nodes: u64,
    /// Principal variation, root move first
    pub pv: Vec<Move>,
    /// Whether the search was cut short by the deadline or a stop request
    pub stopped: bool,
}

/// Summary of one completed iterative-deepening pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationInfo {
    pub depth: u8,
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

impl IterationInfo {
    pub fn nps(&self) -> u64 {
        let micros = self.elapsed.as_micros().max(1);
        (self.nodes as u128 * 1_000_000 / micros) as u64
    }

    /// `info depth D score cp S nodes N nps R time T pv ...`
    pub fn to_uci(&self) -> String {
        let mut line = format!(
            "info depth {} score cp {} nodes {} nps {} time {}",
            self.depth,
            self.score,
            self.nodes,
            self.nps(),
            self.elapsed.as_millis()
        );
        if !self.pv.is_empty() {
            line.push_str(" pv ");
            line.push_str(&moves_to_uci(&self.pv));
        }
        line
    }
}

/// Receives one report per completed search depth.
pub trait SearchReporter {
    fn report(&mut self, info: &IterationInfo);
}

impl<F: FnMut(&IterationInfo)> SearchReporter for F {
    fn report(&mut self, info: &IterationInfo) {
        self(info)
    }
}

/// Trait implemented by playing engines so the protocol layer can drive them.
pub trait Engine: Send {
    /// Search `game` within `limits`. The game is mutated during the search but
    /// restored before returning.
    fn search(
        &mut self,
        game: &mut GameState,
        limits: SearchLimits,
        reporter: &mut dyn SearchReporter,
    ) -> SearchResult;

    /// Returns the engine's name for UCI identification
    fn name(&self) -> &str;

    fn author(&self) -> &str {
        "axw-chess"
    }

    /// Reset internal state for a new game (clear hash tables, killers, etc.)
    fn new_game(&mut self) {}

    /// Set an engine option. Returns true if the option was recognized.
    fn set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }
}
