//! Attack sets for every piece type.
//!
//! Leaper tables (knight, king, pawn) and the eight directional rays are built
//! at compile time. Slider attacks walk a ray up to and including the first
//! blocker.

use crate::bitboard::Bitboard;
use crate::types::Color;

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Ray directions as (file, rank) steps, in the order of `Direction`.
const RAY_STEPS: [(i8, i8); 8] = KING_DELTAS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
    const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// Rays pointing towards higher square indices find their nearest blocker at the LSB.
    #[inline(always)]
    const fn ascending(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::NorthEast | Direction::East | Direction::NorthWest
        )
    }
}

const fn step(sq: u8, df: i8, dr: i8) -> Option<u8> {
    let f = (sq % 8) as i8 + df;
    let r = (sq / 8) as i8 + dr;
    if f < 0 || f > 7 || r < 0 || r > 7 {
        None
    } else {
        Some((r * 8 + f) as u8)
    }
}

const fn leaper_table(deltas: &[(i8, i8)]) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0u8;
    while sq < 64 {
        let mut bits = 0u64;
        let mut i = 0;
        while i < deltas.len() {
            if let Some(to) = step(sq, deltas[i].0, deltas[i].1) {
                bits |= 1u64 << to;
            }
            i += 1;
        }
        table[sq as usize] = Bitboard(bits);
        sq += 1;
    }
    table
}

static KNIGHT_ATTACKS: [Bitboard; 64] = leaper_table(&KNIGHT_DELTAS);
static KING_ATTACKS: [Bitboard; 64] = leaper_table(&KING_DELTAS);
static PAWN_ATTACKS: [[Bitboard; 64]; 2] = [
    leaper_table(&[(-1, 1), (1, 1)]),
    leaper_table(&[(-1, -1), (1, -1)]),
];

/// `RAYS[dir][sq]`: squares from `sq` towards `dir` up to the board edge, excluding `sq`.
static RAYS: [[Bitboard; 64]; 8] = {
    let mut rays = [[Bitboard::EMPTY; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let (df, dr) = RAY_STEPS[dir];
        let mut sq = 0u8;
        while sq < 64 {
            let mut bits = 0u64;
            let mut cur = step(sq, df, dr);
            while let Some(s) = cur {
                bits |= 1u64 << s;
                cur = step(s, df, dr);
            }
            rays[dir][sq as usize] = Bitboard(bits);
            sq += 1;
        }
        dir += 1;
    }
    rays
};

/// Squares a pawn of `color` on `sq` attacks.
#[inline(always)]
pub fn pawn_attacks(sq: u8, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.idx()][sq as usize]
}

#[inline(always)]
pub fn knight_attacks(sq: u8) -> Bitboard {
    KNIGHT_ATTACKS[sq as usize]
}

#[inline(always)]
pub fn king_attacks(sq: u8) -> Bitboard {
    KING_ATTACKS[sq as usize]
}

#[inline(always)]
pub fn ray(dir: Direction, sq: u8) -> Bitboard {
    RAYS[dir as usize][sq as usize]
}

#[inline]
fn ray_attacks(dir: Direction, sq: u8, occupied: Bitboard) -> Bitboard {
    let full = ray(dir, sq);
    let blocker = if dir.ascending() {
        (full & occupied).lsb()
    } else {
        (full & occupied).msb()
    };
    match blocker {
        Some(b) => full ^ ray(dir, b),
        None => full,
    }
}

#[inline]
pub fn bishop_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    Direction::DIAGONAL
        .iter()
        .fold(Bitboard::EMPTY, |acc, &d| acc | ray_attacks(d, sq, occupied))
}

#[inline]
pub fn rook_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    Direction::ORTHOGONAL
        .iter()
        .fold(Bitboard::EMPTY, |acc, &d| acc | ray_attacks(d, sq, occupied))
}

#[inline]
pub fn queen_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
#[path = "attacks_tests.rs"]
mod attacks_tests;
