//! Evaluation weights: material values, piece-square tables and scalar modifiers.
//!
//! Tables are written once from White's point of view (a1 = index 0) and the
//! Black copies are derived by vertical mirroring when the weights are built.
//! Scalars can be overridden from a TOML document; the tables cannot.

use std::path::Path;

use chess_core::{Color, PieceKind};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeightsError {
    #[error("failed to read weights file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse weights: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid weight '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

// =============================================================================
// Canonical tables (White's view, rank 1 first)
// =============================================================================

#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,   0,   0,  0,  0,  0,
    -6, -4,  1, -24, -24,  1, -4, -6,
    -4, -4,  1,   5,   5,  1, -4, -4,
    -6, -4,  5,  10,  10,  5, -4, -6,
    -6, -4,  2,   8,   8,  2, -4, -6,
    -6, -4,  1,   2,   2,  1, -4, -6,
    -6, -4,  1,   1,   1,  1, -4, -6,
     0,  0,  0,   0,   0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -8, -12, -8, -8, -8, -8, -12, -8,
    -8,   0,  1,  2,  2,  1,   0, -8,
    -8,   0,  4,  4,  4,  4,   0, -8,
    -8,   0,  4,  8,  8,  4,   0, -8,
    -8,   0,  4,  8,  8,  4,   0, -8,
    -8,   0,  4,  4,  4,  4,   0, -8,
    -8,   0,  0,  0,  0,  0,   0, -8,
    -8,  -8, -8, -8, -8, -8,  -8, -8,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -4, -4, -12, -4, -4, -12, -4, -4,
    -4,  2,   1,  1,  1,   1,  2, -4,
    -4,  1,   2,  4,  4,   2,  1, -4,
    -4,  0,   4,  6,  6,   4,  0, -4,
    -4,  0,   4,  6,  6,   4,  0, -4,
    -4,  0,   2,  4,  4,   2,  0, -4,
    -4,  0,   0,  0,  0,   0,  0, -4,
    -4, -4,  -4, -4, -4,  -4, -4, -4,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,  0,  0,  2,  2,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    20, 20, 20, 20, 20, 20, 20, 20,
     5,  5,  5,  5,  5,  5,  5,  5,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -5, -5, -5, -5, -5, -5, -5, -5,
     0,  0,  1,  1,  1,  1,  0,  0,
     0,  0,  1,  2,  2,  1,  0,  0,
     0,  0,  2,  3,  3,  2,  0,  0,
     0,  0,  2,  3,  3,  2,  0,  0,
     0,  0,  1,  2,  2,  1,  0,  0,
     0,  0,  1,  1,  1,  1,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KING_MIDGAME_TABLE: [i32; 64] = [
     40,  50,  30,  10,  10,  30,  50,  40,
     30,  40,  20,   0,   0,  20,  40,  30,
     10,  20,   0, -20, -20,   0,  20,  10,
      0,  10, -10, -30, -30, -10,  10,   0,
    -10,   0, -20, -40, -40, -20,   0, -10,
    -20, -10, -30, -50, -50, -30, -10, -20,
    -30, -20, -40, -60, -60, -40, -20, -30,
    -40, -30, -50, -70, -70, -50, -30, -40,
];

#[rustfmt::skip]
const KING_ENDGAME_TABLE: [i32; 64] = [
    -72, -48, -36, -24, -24, -36, -48, -72,
    -48, -24, -12,   0,   0, -12, -24, -48,
    -36, -12,   0,  12,  12,   0, -12, -36,
    -24,   0,  12,  24,  24,  12,   0, -24,
    -24,   0,  12,  24,  24,  12,   0, -24,
    -36, -12,   0,  12,  12,   0, -12, -36,
    -48, -24, -12,   0,   0, -12, -24, -48,
    -72, -48, -36, -24, -24, -36, -48, -72,
];

/// Passed-pawn bonus by rank, from the pawn owner's side.
const PASSED_PAWN_BY_RANK: [i32; 8] = [0, 20, 20, 40, 60, 80, 100, 0];

/// Penalty by accumulated attack units on the king zone. Saturates at 500.
#[rustfmt::skip]
pub const KING_SAFETY_TABLE: [i32; 64] = [
      0,   0,   1,   2,   3,   5,   7,   9,  12,  15,
     18,  22,  26,  30,  35,  39,  44,  50,  56,  62,
     68,  75,  82,  85,  89,  97, 105, 113, 122, 131,
    140, 150, 169, 180, 191, 202, 213, 225, 237, 248,
    260, 272, 283, 295, 307, 319, 330, 342, 354, 366,
    377, 389, 401, 412, 424, 436, 448, 459, 471, 483,
    494, 500, 500, 500,
];

const fn passed_pawn_table() -> [i32; 64] {
    let mut table = [0; 64];
    let mut sq = 0;
    while sq < 64 {
        table[sq] = PASSED_PAWN_BY_RANK[sq / 8];
        sq += 1;
    }
    table
}

fn mirror(table: &[i32; 64]) -> [i32; 64] {
    std::array::from_fn(|sq| table[sq ^ 56])
}

// =============================================================================
// Overridable scalars
// =============================================================================

/// Centipawn values per piece kind. The king is never counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaterialValues {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
}

impl Default for MaterialValues {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
        }
    }
}

impl MaterialValues {
    fn to_array(self) -> [i32; 6] {
        [self.pawn, self.knight, self.bishop, self.rook, self.queen, 0]
    }
}

/// Flat bonuses and per-unit weights applied on top of material and tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Modifiers {
    pub bishop_pair: i32,
    /// Subtracted when a side holds two or more knights.
    pub knight_pair: i32,
    /// Subtracted when a side holds two or more rooks.
    pub rook_pair: i32,
    pub tempo: i32,
    pub open_rook_file: i32,
    pub half_open_rook_file: i32,
    /// Per reachable square for bishops and queens along diagonals.
    pub diagonal_mobility: i32,
    /// Per reachable square for rooks and queens along ranks and files.
    pub linear_mobility: i32,
    pub king_attack_linear: usize,
    pub king_attack_diagonal: usize,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            bishop_pair: 30,
            knight_pair: 8,
            rook_pair: 16,
            tempo: 10,
            open_rook_file: 10,
            half_open_rook_file: 5,
            diagonal_mobility: 3,
            linear_mobility: 2,
            king_attack_linear: 3,
            king_attack_diagonal: 2,
        }
    }
}

/// The TOML shape accepted by [`EvaluationWeights::from_toml`]; every field is optional.
///
/// ```toml
/// [material]
/// knight = 310
///
/// [modifiers]
/// tempo = 15
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightsConfig {
    pub material: MaterialValues,
    pub modifiers: Modifiers,
}

// =============================================================================
// Built weights
// =============================================================================

/// Immutable weight set handed to the evaluator at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationWeights {
    material: [i32; 6],
    modifiers: Modifiers,
    /// `[color][kind][square]`, Black already mirrored.
    midgame: [[[i32; 64]; 6]; 2],
    endgame: [[[i32; 64]; 6]; 2],
    passed_pawn: [[i32; 64]; 2],
}

impl Default for EvaluationWeights {
    fn default() -> Self {
        Self::from_config(WeightsConfig::default())
    }
}

impl EvaluationWeights {
    pub fn from_config(config: WeightsConfig) -> Self {
        let shared = [PAWN_TABLE, KNIGHT_TABLE, BISHOP_TABLE, ROOK_TABLE, QUEEN_TABLE];
        let mut white_mid = [[0; 64]; 6];
        let mut white_end = [[0; 64]; 6];
        for (kind, table) in shared.iter().enumerate() {
            white_mid[kind] = *table;
            white_end[kind] = *table;
        }
        white_mid[PieceKind::King.idx()] = KING_MIDGAME_TABLE;
        white_end[PieceKind::King.idx()] = KING_ENDGAME_TABLE;

        let passed = passed_pawn_table();
        Self {
            material: config.material.to_array(),
            modifiers: config.modifiers,
            midgame: [white_mid, white_mid.map(|t| mirror(&t))],
            endgame: [white_end, white_end.map(|t| mirror(&t))],
            passed_pawn: [passed, mirror(&passed)],
        }
    }

    /// Like [`from_config`](Self::from_config) but rejects negative material.
    pub fn try_from_config(config: WeightsConfig) -> Result<Self, WeightsError> {
        validate(&config)?;
        Ok(Self::from_config(config))
    }

    pub fn from_toml(text: &str) -> Result<Self, WeightsError> {
        Self::try_from_config(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, WeightsError> {
        let text = std::fs::read_to_string(path).map_err(|source| WeightsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    #[inline]
    pub fn material(&self, kind: PieceKind) -> i32 {
        self.material[kind.idx()]
    }

    #[inline]
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    #[inline]
    pub fn midgame(&self, color: Color, kind: PieceKind, sq: u8) -> i32 {
        self.midgame[color.idx()][kind.idx()][sq as usize]
    }

    #[inline]
    pub fn endgame(&self, color: Color, kind: PieceKind, sq: u8) -> i32 {
        self.endgame[color.idx()][kind.idx()][sq as usize]
    }

    #[inline]
    pub fn passed_pawn(&self, color: Color, sq: u8) -> i32 {
        self.passed_pawn[color.idx()][sq as usize]
    }

    /// Penalty for `units` attack units, clamped to the last table entry.
    #[inline]
    pub fn king_safety(&self, units: usize) -> i32 {
        KING_SAFETY_TABLE[units.min(KING_SAFETY_TABLE.len() - 1)]
    }
}

fn validate(config: &WeightsConfig) -> Result<(), WeightsError> {
    let m = &config.material;
    for (field, value) in [
        ("material.pawn", m.pawn),
        ("material.knight", m.knight),
        ("material.bishop", m.bishop),
        ("material.rook", m.rook),
        ("material.queen", m.queen),
    ] {
        if value < 0 {
            return Err(WeightsError::Invalid {
                field,
                reason: format!("must not be negative, got {value}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "weights_tests.rs"]
mod weights_tests;
