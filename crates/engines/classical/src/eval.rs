//! Tapered hand-crafted evaluation.
//!
//! Each side is scored independently (material, blended piece-square tables
//! and a handful of positional modifiers) and the result is White minus
//! Black, flipped to the side to move.

use std::fmt;

use chess_core::{
    bishop_attacks, rook_attacks, Bitboard, Color, GameResult, GameState, PieceKind, Position,
};

use crate::weights::EvaluationWeights;

/// Score of a decided game, White-relative before perspective is applied.
pub const MATE_SCORE: i32 = 1_000_000;

/// Phase of the full starting material; larger totals are clamped.
pub const MAX_PHASE: i32 = 24;

/// What the search needs from an evaluation.
pub trait Evaluate {
    /// Score from the side to move's point of view.
    fn evaluate(&self, game: &GameState) -> i32;

    /// Value used to order captures.
    fn piece_value(&self, kind: PieceKind) -> i32;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluator {
    weights: EvaluationWeights,
}

/// Always zero. Benchmarks use it to measure the bare tree walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullEvaluator;

/// Material and table sums for one piece kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PieceTerms {
    pub material: i32,
    pub midgame: i32,
    pub endgame: i32,
}

/// Everything one side contributes to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationPart {
    /// Indexed by `PieceKind::idx()`.
    pub pieces: [PieceTerms; 6],
    pub phase: i32,
    pub pair: i32,
    pub tempo: i32,
    pub rook_files: i32,
    pub passed_pawns: i32,
    pub mobility: i32,
    pub king_safety: i32,
}

impl EvaluationPart {
    pub fn material(&self) -> i32 {
        self.pieces.iter().map(|p| p.material).sum()
    }

    pub fn midgame(&self) -> i32 {
        self.pieces.iter().map(|p| p.midgame).sum()
    }

    pub fn endgame(&self) -> i32 {
        self.pieces.iter().map(|p| p.endgame).sum()
    }

    /// Table sums blended by `phase` (0 = bare endgame, 24 = full middlegame).
    pub fn tapered(&self, phase: i32) -> i32 {
        (phase * self.midgame() + (MAX_PHASE - phase) * self.endgame()) / MAX_PHASE
    }

    pub fn modifiers(&self) -> i32 {
        self.pair + self.tempo + self.rook_files + self.passed_pawns + self.mobility + self.king_safety
    }

    pub fn score(&self, phase: i32) -> i32 {
        self.material() + self.tapered(phase) + self.modifiers()
    }
}

/// Full breakdown of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub white: EvaluationPart,
    pub black: EvaluationPart,
    /// Combined phase of both sides, clamped to [`MAX_PHASE`].
    pub phase: i32,
    pub game_over: bool,
    /// White minus Black.
    pub total: i32,
    /// `total` seen from the side to move.
    pub perspective: i32,
}

impl Evaluator {
    pub fn new(weights: EvaluationWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &EvaluationWeights {
        &self.weights
    }

    pub fn breakdown(&self, game: &GameState) -> Evaluation {
        let pos = game.position();
        let side = pos.side_to_move();

        if game.is_game_over() {
            let total = match game.result() {
                GameResult::WhiteWon => MATE_SCORE,
                GameResult::BlackWon => -MATE_SCORE,
                GameResult::Draw | GameResult::InProgress => 0,
            };
            return Evaluation {
                white: EvaluationPart::default(),
                black: EvaluationPart::default(),
                phase: 0,
                game_over: true,
                total,
                perspective: total * side.sign(),
            };
        }

        let white = self.side_part(pos, Color::White);
        let black = self.side_part(pos, Color::Black);
        let phase = (white.phase + black.phase).min(MAX_PHASE);
        let total = white.score(phase) - black.score(phase);
        Evaluation {
            white,
            black,
            phase,
            game_over: false,
            total,
            perspective: total * side.sign(),
        }
    }

    fn side_part(&self, pos: &Position, color: Color) -> EvaluationPart {
        let mut part = EvaluationPart::default();
        for kind in PieceKind::ALL {
            part.pieces[kind.idx()] = self.piece_terms(pos, color, kind);
        }

        let count = |kind| pos.pieces(color, kind).popcount() as i32;
        part.phase = count(PieceKind::Knight)
            + count(PieceKind::Bishop)
            + 2 * count(PieceKind::Rook)
            + 4 * count(PieceKind::Queen);

        let m = self.weights.modifiers();
        if count(PieceKind::Bishop) > 1 {
            part.pair += m.bishop_pair;
        }
        if count(PieceKind::Knight) > 1 {
            part.pair -= m.knight_pair;
        }
        if count(PieceKind::Rook) > 1 {
            part.pair -= m.rook_pair;
        }
        if pos.side_to_move() == color {
            part.tempo = m.tempo;
        }

        part.rook_files = self.rook_files(pos, color);
        part.passed_pawns = self.passed_pawns(pos, color);
        part.mobility = self.mobility(pos, color);
        part.king_safety = self.king_safety(pos, color);
        part
    }

    pub fn piece_terms(&self, pos: &Position, color: Color, kind: PieceKind) -> PieceTerms {
        let pieces = pos.pieces(color, kind);
        let mut terms = PieceTerms {
            material: pieces.popcount() as i32 * self.weights.material(kind),
            ..PieceTerms::default()
        };
        for sq in pieces {
            terms.midgame += self.weights.midgame(color, kind, sq);
            terms.endgame += self.weights.endgame(color, kind, sq);
        }
        terms
    }

    fn rook_files(&self, pos: &Position, color: Color) -> i32 {
        let m = self.weights.modifiers();
        let own_pawns = pos.pieces(color, PieceKind::Pawn);
        let enemy_pawns = pos.pieces(color.other(), PieceKind::Pawn);
        pos.pieces(color, PieceKind::Rook)
            .map(|sq| {
                let file = Bitboard::file(sq % 8);
                if (own_pawns & file).any() {
                    0
                } else if (enemy_pawns & file).any() {
                    m.half_open_rook_file
                } else {
                    m.open_rook_file
                }
            })
            .sum()
    }

    fn passed_pawns(&self, pos: &Position, color: Color) -> i32 {
        let enemy_pawns = pos.pieces(color.other(), PieceKind::Pawn);
        // Squares in front of enemy pawns (from their side) on their file and the neighbours
        let shadow = match color {
            Color::White => enemy_pawns.south().south_fill(),
            Color::Black => enemy_pawns.north().north_fill(),
        }
        .widen();
        (pos.pieces(color, PieceKind::Pawn) & !shadow)
            .map(|sq| self.weights.passed_pawn(color, sq))
            .sum()
    }

    fn mobility(&self, pos: &Position, color: Color) -> i32 {
        let m = self.weights.modifiers();
        let own = pos.occupancy(color);
        let occupied = pos.occupied();
        let queens = pos.pieces(color, PieceKind::Queen);
        let diagonal: u32 = (pos.pieces(color, PieceKind::Bishop) | queens)
            .map(|sq| (bishop_attacks(sq, occupied) & !own).popcount())
            .sum();
        let linear: u32 = (pos.pieces(color, PieceKind::Rook) | queens)
            .map(|sq| (rook_attacks(sq, occupied) & !own).popcount())
            .sum();
        diagonal as i32 * m.diagonal_mobility + linear as i32 * m.linear_mobility
    }

    fn king_safety(&self, pos: &Position, color: Color) -> i32 {
        let Some(king) = pos.king_sq(color) else {
            return 0;
        };
        let m = self.weights.modifiers();
        let zone = Bitboard::from_square(king).expand();
        let occupied = pos.occupied();
        let enemy = color.other();
        let queens = pos.pieces(enemy, PieceKind::Queen);

        let linear = (pos.pieces(enemy, PieceKind::Rook) | queens)
            .filter(|&sq| (rook_attacks(sq, occupied) & zone).any())
            .count();
        let diagonal = (pos.pieces(enemy, PieceKind::Bishop) | queens)
            .filter(|&sq| (bishop_attacks(sq, occupied) & zone).any())
            .count();
        // Sliders are counted through their occupancy-blocked attacks
        let units = linear * m.king_attack_linear + diagonal * m.king_attack_diagonal;
        -self.weights.king_safety(units)
    }
}

impl Evaluate for Evaluator {
    fn evaluate(&self, game: &GameState) -> i32 {
        self.breakdown(game).perspective
    }

    #[inline]
    fn piece_value(&self, kind: PieceKind) -> i32 {
        self.weights.material(kind)
    }
}

impl Evaluate for NullEvaluator {
    #[inline]
    fn evaluate(&self, _game: &GameState) -> i32 {
        0
    }

    #[inline]
    fn piece_value(&self, _kind: PieceKind) -> i32 {
        0
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.game_over {
            return write!(
                f,
                "game over: total {} (side to move {})",
                self.total, self.perspective
            );
        }

        writeln!(f, "{:<14}{:>8}{:>8}", "term", "white", "black")?;
        for kind in PieceKind::ALL {
            let (w, b) = (self.white.pieces[kind.idx()], self.black.pieces[kind.idx()]);
            writeln!(
                f,
                "{:<14}{:>8}{:>8}",
                format!("{kind:?}"),
                format!("{}/{}/{}", w.material, w.midgame, w.endgame),
                format!("{}/{}/{}", b.material, b.midgame, b.endgame)
            )?;
        }
        let rows = [
            ("phase", self.white.phase, self.black.phase),
            ("pairs", self.white.pair, self.black.pair),
            ("tempo", self.white.tempo, self.black.tempo),
            ("rook files", self.white.rook_files, self.black.rook_files),
            ("passed pawns", self.white.passed_pawns, self.black.passed_pawns),
            ("mobility", self.white.mobility, self.black.mobility),
            ("king safety", self.white.king_safety, self.black.king_safety),
            (
                "side total",
                self.white.score(self.phase),
                self.black.score(self.phase),
            ),
        ];
        for (name, w, b) in rows {
            writeln!(f, "{name:<14}{w:>8}{b:>8}")?;
        }
        write!(
            f,
            "phase {} total {} (side to move {})",
            self.phase, self.total, self.perspective
        )
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
