//! Game state: a position plus its full move history and result tracking.
//!
//! The result is recomputed after every [`GameState::push_move`] and restored
//! from a snapshot (not recomputed) on [`GameState::pop_move`], so popping
//! always returns the state to exactly what it was before the matching push.

use tracing::trace;

use crate::bitboard::Bitboard;
use crate::board::{Position, Undo};
use crate::error::{ChessError, ChessResult};
use crate::movegen::legal_moves_into;
use crate::types::{Color, Move, PieceKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameResult {
    InProgress,
    WhiteWon,
    BlackWon,
    Draw,
}

impl GameResult {
    pub fn winner(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWon,
            Color::Black => GameResult::BlackWon,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawReason {
    None,
    Stalemate,
    ThreefoldRepetition,
    /// Never produced: threefold repetition always triggers first.
    FivefoldRepetition,
    FiftyMoveRule,
    /// Never produced: the fifty-move rule always triggers first.
    SeventyFiveMoveRule,
    InsufficientMaterial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ResultSnapshot {
    result: GameResult,
    draw_reason: DrawReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    position: Position,
    moves: Vec<Move>,
    undos: Vec<Undo>,
    snapshots: Vec<ResultSnapshot>,
    /// Root hash first, then one entry per applied move.
    hash_history: Vec<u64>,
    result: GameResult,
    draw_reason: DrawReason,
    /// Reused by result detection; always empty between calls.
    scratch: Vec<Move>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        Ok(Self::from_position(Position::from_fen(fen)?))
    }

    pub fn from_position(position: Position) -> Self {
        let mut game = GameState {
            hash_history: vec![position.hash()],
            position,
            moves: Vec::new(),
            undos: Vec::new(),
            snapshots: Vec::new(),
            result: GameResult::InProgress,
            draw_reason: DrawReason::None,
            scratch: Vec::with_capacity(64),
        };
        game.update_result();
        game
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[inline]
    pub fn hash_history(&self) -> &[u64] {
        &self.hash_history
    }

    #[inline]
    pub fn result(&self) -> GameResult {
        self.result
    }

    #[inline]
    pub fn draw_reason(&self) -> DrawReason {
        self.draw_reason
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.result != GameResult::InProgress
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.position.hash()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        crate::movegen::legal_moves(&self.position)
    }

    /// Fill `moves` with the legal moves of the current position.
    pub fn legal_moves_into(&mut self, moves: &mut Vec<Move>) {
        legal_moves_into(&mut self.position, moves);
    }

    /// Apply a move without legality checks and recompute the result.
    pub fn push_move(&mut self, mv: Move) {
        let undo = self.position.make_move(mv);
        self.moves.push(mv);
        self.undos.push(undo);
        self.snapshots.push(ResultSnapshot {
            result: self.result,
            draw_reason: self.draw_reason,
        });
        self.hash_history.push(self.position.hash());
        self.update_result();
    }

    /// Parse a coordinate-notation move against the current position and push it.
    pub fn push_move_str(&mut self, text: &str) -> ChessResult<()> {
        let mv = self.position.parse_move(text)?;
        self.push_move(mv);
        Ok(())
    }

    /// Undo the last move, restoring the result recorded before it was pushed.
    pub fn pop_move(&mut self) -> ChessResult<Move> {
        let (Some(mv), Some(undo), Some(snapshot)) =
            (self.moves.pop(), self.undos.pop(), self.snapshots.pop())
        else {
            return Err(ChessError::EmptyHistory);
        };
        self.hash_history.pop();
        self.position.unmake_move(mv, undo);
        self.result = snapshot.result;
        self.draw_reason = snapshot.draw_reason;
        Ok(mv)
    }

    /// Occurrences of the current position across the whole game, itself included.
    pub fn repetition_count(&self) -> usize {
        let current = self.position.hash();
        self.hash_history.iter().filter(|&&h| h == current).count()
    }

    fn update_result(&mut self) {
        self.result = GameResult::InProgress;
        self.draw_reason = DrawReason::None;

        let mut moves = std::mem::take(&mut self.scratch);
        legal_moves_into(&mut self.position, &mut moves);
        let stuck = moves.is_empty();
        moves.clear();
        self.scratch = moves;

        if stuck {
            let us = self.position.side_to_move();
            if self.position.in_check(us) {
                self.result = GameResult::winner(us.other());
            } else {
                self.result = GameResult::Draw;
                self.draw_reason = DrawReason::Stalemate;
            }
            trace!(result = ?self.result, reason = ?self.draw_reason, "game over");
            return;
        }

        if self.repetition_count() >= 3 {
            self.result = GameResult::Draw;
            self.draw_reason = DrawReason::ThreefoldRepetition;
        }
        if self.position.halfmove_clock() >= 100 {
            self.result = GameResult::Draw;
            self.draw_reason = DrawReason::FiftyMoveRule;
        }
        // Checked last so it wins over any other draw reason.
        if self.is_insufficient_material() {
            self.result = GameResult::Draw;
            self.draw_reason = DrawReason::InsufficientMaterial;
        }
    }

    fn is_insufficient_material(&self) -> bool {
        let pos = &self.position;
        let heavy = pos.pieces_of_kind(PieceKind::Queen)
            | pos.pieces_of_kind(PieceKind::Rook)
            | pos.pieces_of_kind(PieceKind::Pawn);
        if heavy.any() {
            return false;
        }
        if pos.king_sq(Color::White).is_none() || pos.king_sq(Color::Black).is_none() {
            return false;
        }

        let knights = pos.pieces_of_kind(PieceKind::Knight).popcount();
        let bishops = pos.pieces_of_kind(PieceKind::Bishop);
        if knights + bishops.popcount() <= 1 {
            return true;
        }
        if knights == 0 {
            let dark = (bishops & Bitboard::DARK_SQUARES).popcount();
            return dark == 0 || dark == bishops.popcount();
        }
        false
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
