//! Classical Chess Engine
//!
//! Iterative-deepening alpha-beta search over a tapered hand-crafted
//! evaluation, with a shared transposition table and killer-move ordering.

pub mod eval;
pub mod killers;
pub mod search;
pub mod transposition;
pub mod weights;

use std::sync::Arc;

use chess_core::{Engine, GameState, SearchLimits, SearchReporter, SearchResult};
use tracing::{debug, warn};

pub use eval::{Evaluate, Evaluation, EvaluationPart, Evaluator, NullEvaluator, PieceTerms, MATE_SCORE};
pub use killers::KillerMoveTable;
pub use search::{Search, SearchInfo, DEFAULT_MAX_QUIESCENCE_DEPTH, INFINITY};
pub use transposition::{Bound, TranspositionTable, TtEntry};
pub use weights::{EvaluationWeights, MaterialValues, Modifiers, WeightsConfig, WeightsError};

pub const DEFAULT_HASH_MB: usize = 256;
pub const MIN_HASH_MB: usize = 1;
pub const MAX_HASH_MB: usize = 2048;

/// Classical chess engine using negamax with alpha-beta pruning.
///
/// This engine uses:
/// - Iterative deepening with quiescence search at the leaves
/// - Tapered piece-square evaluation with positional modifiers
/// - A transposition table kept across moves until `ucinewgame`
/// - Killer moves and the previous principal variation for ordering
#[derive(Debug)]
pub struct ClassicalEngine {
    evaluator: Evaluator,
    tt: Arc<TranspositionTable>,
    hash_mb: usize,
    max_qdepth: u8,
}

impl Default for ClassicalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassicalEngine {
    pub fn new() -> Self {
        Self::with_options(EvaluationWeights::default(), DEFAULT_HASH_MB)
    }

    pub fn with_options(weights: EvaluationWeights, hash_mb: usize) -> Self {
        let hash_mb = hash_mb.clamp(MIN_HASH_MB, MAX_HASH_MB);
        Self {
            evaluator: Evaluator::new(weights),
            tt: Arc::new(TranspositionTable::new_with_mb(hash_mb)),
            hash_mb,
            max_qdepth: DEFAULT_MAX_QUIESCENCE_DEPTH,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn hash_mb(&self) -> usize {
        self.hash_mb
    }

    /// Handle to the table; searches on other threads can share it.
    pub fn table(&self) -> Arc<TranspositionTable> {
        Arc::clone(&self.tt)
    }

    pub fn set_max_quiescence_depth(&mut self, depth: u8) {
        self.max_qdepth = depth;
    }

    fn resize_table(&mut self, hash_mb: usize) {
        self.hash_mb = hash_mb.clamp(MIN_HASH_MB, MAX_HASH_MB);
        self.tt = Arc::new(TranspositionTable::new_with_mb(self.hash_mb));
        debug!(hash_mb = self.hash_mb, "rebuilt transposition table");
    }
}

impl Engine for ClassicalEngine {
    fn search(
        &mut self,
        game: &mut GameState,
        limits: SearchLimits,
        reporter: &mut dyn SearchReporter,
    ) -> SearchResult {
        Search::new(&self.evaluator, &self.tt, limits, self.max_qdepth).run(game, reporter)
    }

    fn name(&self) -> &str {
        "axw-chess classical"
    }

    fn new_game(&mut self) {
        self.resize_table(self.hash_mb);
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        if !name.eq_ignore_ascii_case("hash") {
            return false;
        }
        match value.trim().parse::<usize>() {
            Ok(mb) => self.resize_table(mb),
            Err(e) => warn!(value, error = %e, "ignoring invalid Hash value"),
        }
        true
    }
}
