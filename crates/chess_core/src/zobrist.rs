//! Zobrist keys for incremental position hashing.
//!
//! A position hash is the XOR of one key per (piece, square), one key for
//! Black to move, one key for the current castling-rights set and one key for
//! the en-passant file when an en-passant target exists.

use crate::types::Piece;

pub struct ZobristKeys {
    /// Indexed by [color][piece_kind][square].
    pieces: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    /// One key per castling-rights bitmask (0..16), so a rights change is a single XOR pair.
    castling: [u64; 16],
    en_passant: [u64; 8],
}

const fn xorshift64(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

impl ZobristKeys {
    pub const fn new() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;

        let mut pieces = [[[0u64; 64]; 6]; 2];
        let mut c = 0;
        while c < 2 {
            let mut k = 0;
            while k < 6 {
                let mut s = 0;
                while s < 64 {
                    state = xorshift64(state);
                    pieces[c][k][s] = state;
                    s += 1;
                }
                k += 1;
            }
            c += 1;
        }

        state = xorshift64(state);
        let black_to_move = state;

        let mut rights = [0u64; 4];
        let mut i = 0;
        while i < 4 {
            state = xorshift64(state);
            rights[i] = state;
            i += 1;
        }
        let mut castling = [0u64; 16];
        let mut mask = 0;
        while mask < 16 {
            let mut bit = 0;
            while bit < 4 {
                if mask & (1 << bit) != 0 {
                    castling[mask] ^= rights[bit];
                }
                bit += 1;
            }
            mask += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut f = 0;
        while f < 8 {
            state = xorshift64(state);
            en_passant[f] = state;
            f += 1;
        }

        Self {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    #[inline(always)]
    pub fn piece(&self, piece: Piece, sq: u8) -> u64 {
        self.pieces[piece.color.idx()][piece.kind.idx()][sq as usize]
    }

    #[inline(always)]
    pub fn black_to_move(&self) -> u64 {
        self.black_to_move
    }

    #[inline(always)]
    pub fn castling(&self, rights_mask: u8) -> u64 {
        self.castling[(rights_mask & 0x0F) as usize]
    }

    #[inline(always)]
    pub fn en_passant_file(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;
