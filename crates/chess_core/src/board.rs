//! Bitboard position with an incrementally maintained Zobrist hash.

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::error::{ChessError, ChessResult};
use crate::types::*;
use crate::zobrist::ZOBRIST;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Castling rights as a 4-bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KING: u8 = 0b0001;
    pub const WHITE_QUEEN: u8 = 0b0010;
    pub const BLACK_KING: u8 = 0b0100;
    pub const BLACK_QUEEN: u8 = 0b1000;
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline(always)]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn king_side(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_KING),
            Color::Black => self.has(Self::BLACK_KING),
        }
    }

    pub fn queen_side(self, color: Color) -> bool {
        match color {
            Color::White => self.has(Self::WHITE_QUEEN),
            Color::Black => self.has(Self::BLACK_QUEEN),
        }
    }
}

/// Rights that survive a move touching the square (as origin or destination).
static CASTLE_KEEP: [u8; 64] = {
    let mut keep = [0b1111u8; 64];
    keep[0] = !CastlingRights::WHITE_QUEEN & 0b1111;
    keep[4] = !(CastlingRights::WHITE_KING | CastlingRights::WHITE_QUEEN) & 0b1111;
    keep[7] = !CastlingRights::WHITE_KING & 0b1111;
    keep[56] = !CastlingRights::BLACK_QUEEN & 0b1111;
    keep[60] = !(CastlingRights::BLACK_KING | CastlingRights::BLACK_QUEEN) & 0b1111;
    keep[63] = !CastlingRights::BLACK_KING & 0b1111;
    keep
};

/// Rook relocation for a castling king landing on `king_to`.
pub(crate) fn castle_rook_squares(king_to: u8) -> Option<(u8, u8)> {
    match king_to {
        6 => Some((7, 5)),
        2 => Some((0, 3)),
        62 => Some((63, 61)),
        58 => Some((56, 59)),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pieces: [[Bitboard; 6]; 2],
    occupancy: [Bitboard; 2],
    board: [Option<Piece>; 64],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
}

/// Everything `unmake_move` needs to restore the position exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Undo {
    /// `None` only when the move was applied from an empty square.
    pub moved: Option<Piece>,
    pub captured: Option<Piece>,
    /// Differs from the destination for en-passant captures.
    pub captured_sq: u8,
    pub rook_move: Option<(u8, u8)>,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub hash: u64,
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position {
    fn empty() -> Self {
        Position {
            pieces: [[Bitboard::EMPTY; 6]; 2],
            occupancy: [Bitboard::EMPTY; 2],
            board: [None; 64],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    pub fn startpos() -> Self {
        let mut p = Self::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            let f = f as u8;
            p.put_piece(f, Piece::new(Color::White, kind));
            p.put_piece(8 + f, Piece::new(Color::White, PieceKind::Pawn));
            p.put_piece(48 + f, Piece::new(Color::Black, PieceKind::Pawn));
            p.put_piece(56 + f, Piece::new(Color::Black, kind));
        }
        p.castling = CastlingRights::ALL;
        p.hash = p.compute_hash();
        p
    }

    /// Parse Forsyth-Edwards Notation. The two move counters are optional.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 6 {
            return Err(ChessError::fen(fen, "expected 4 to 6 fields"));
        }

        let mut p = Self::empty();
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(ChessError::fen(fen, "expected 8 ranks"));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    if !(1..=8).contains(&d) {
                        return Err(ChessError::fen(fen, format!("bad empty-square count '{ch}'")));
                    }
                    file += d as u8;
                } else {
                    let piece = Piece::from_char(ch)
                        .ok_or_else(|| ChessError::fen(fen, format!("bad piece letter '{ch}'")))?;
                    if file >= 8 {
                        return Err(ChessError::fen(fen, format!("rank {} too long", rank + 1)));
                    }
                    p.put_piece(rank * 8 + file, piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(ChessError::fen(fen, format!("rank {} too long", rank + 1)));
                }
            }
            if file != 8 {
                return Err(ChessError::fen(fen, format!("rank {} too short", rank + 1)));
            }
        }

        p.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(ChessError::fen(fen, format!("bad side to move '{other}'"))),
        };

        if parts[2] != "-" {
            let mut bits = 0u8;
            for c in parts[2].chars() {
                bits |= match c {
                    'K' => CastlingRights::WHITE_KING,
                    'Q' => CastlingRights::WHITE_QUEEN,
                    'k' => CastlingRights::BLACK_KING,
                    'q' => CastlingRights::BLACK_QUEEN,
                    _ => return Err(ChessError::fen(fen, format!("bad castling letter '{c}'"))),
                };
            }
            p.castling = CastlingRights(bits);
        }

        p.en_passant = match parts[3] {
            "-" => None,
            s => match coord_to_sq(s) {
                Some(ep) if rank_of(ep) == 2 || rank_of(ep) == 5 => Some(ep),
                _ => return Err(ChessError::fen(fen, format!("bad en-passant square '{s}'"))),
            },
        };

        if let Some(hmc) = parts.get(4) {
            p.halfmove_clock = hmc
                .parse()
                .map_err(|_| ChessError::fen(fen, format!("bad halfmove clock '{hmc}'")))?;
        }
        if let Some(fmn) = parts.get(5) {
            p.fullmove_number = fmn
                .parse()
                .map_err(|_| ChessError::fen(fen, format!("bad fullmove number '{fmn}'")))?;
        }

        p.hash = p.compute_hash();
        Ok(p)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.board[(rank * 8 + file) as usize] {
                    Some(pc) => {
                        if empty > 0 {
                            out.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        out.push(pc.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling == CastlingRights::NONE {
            out.push('-');
        } else {
            for (flag, c) in [
                (CastlingRights::WHITE_KING, 'K'),
                (CastlingRights::WHITE_QUEEN, 'Q'),
                (CastlingRights::BLACK_KING, 'k'),
                (CastlingRights::BLACK_QUEEN, 'q'),
            ] {
                if self.castling.has(flag) {
                    out.push(c);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(ep) => out.push_str(&sq_to_coord(ep)),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.idx()][kind.idx()]
    }

    /// Pieces of `kind` for both colours.
    #[inline(always)]
    pub fn pieces_of_kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[0][kind.idx()] | self.pieces[1][kind.idx()]
    }

    #[inline(always)]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupancy[color.idx()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.occupancy[0] | self.occupancy[1]
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }

    #[inline(always)]
    pub fn king_sq(&self, color: Color) -> Option<u8> {
        self.pieces(color, PieceKind::King).lsb()
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline(always)]
    pub fn en_passant(&self) -> Option<u8> {
        self.en_passant
    }

    #[inline(always)]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Zobrist hash of the current position.
    #[inline(always)]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Hash recomputed from scratch. Always equals `hash()`.
    pub fn compute_hash(&self) -> u64 {
        let mut h = 0u64;
        for sq in self.occupied() {
            if let Some(pc) = self.board[sq as usize] {
                h ^= ZOBRIST.piece(pc, sq);
            }
        }
        if self.side_to_move == Color::Black {
            h ^= ZOBRIST.black_to_move();
        }
        h ^= ZOBRIST.castling(self.castling.bits());
        if let Some(ep) = self.en_passant {
            h ^= ZOBRIST.en_passant_file(file_of(ep));
        }
        h
    }

    // =========================================================================
    // Attack queries
    // =========================================================================

    pub fn is_square_attacked(&self, sq: u8, by: Color) -> bool {
        let occ = self.occupied();
        let queens = self.pieces(by, PieceKind::Queen);
        (pawn_attacks(sq, by.other()) & self.pieces(by, PieceKind::Pawn)).any()
            || (knight_attacks(sq) & self.pieces(by, PieceKind::Knight)).any()
            || (king_attacks(sq) & self.pieces(by, PieceKind::King)).any()
            || (bishop_attacks(sq, occ) & (self.pieces(by, PieceKind::Bishop) | queens)).any()
            || (rook_attacks(sq, occ) & (self.pieces(by, PieceKind::Rook) | queens)).any()
    }

    pub fn in_check(&self, color: Color) -> bool {
        match self.king_sq(color) {
            Some(k) => self.is_square_attacked(k, color.other()),
            None => false,
        }
    }

    // =========================================================================
    // Piece placement
    // =========================================================================

    #[inline]
    fn put_piece(&mut self, sq: u8, pc: Piece) {
        self.pieces[pc.color.idx()][pc.kind.idx()].set(sq);
        self.occupancy[pc.color.idx()].set(sq);
        self.board[sq as usize] = Some(pc);
        self.hash ^= ZOBRIST.piece(pc, sq);
    }

    #[inline]
    fn remove_piece(&mut self, sq: u8) -> Option<Piece> {
        let pc = self.board[sq as usize].take()?;
        self.pieces[pc.color.idx()][pc.kind.idx()].clear(sq);
        self.occupancy[pc.color.idx()].clear(sq);
        self.hash ^= ZOBRIST.piece(pc, sq);
        Some(pc)
    }

    // =========================================================================
    // Make / unmake
    // =========================================================================

    /// Apply a generator-provided move. A pawn reaching the last rank without an
    /// explicit promotion piece becomes a queen.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let us = self.side_to_move;
        let mut undo = Undo {
            moved: self.board[mv.from as usize],
            captured: None,
            captured_sq: mv.to,
            rook_move: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        };

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= ZOBRIST.en_passant_file(file_of(ep));
        }

        if let Some(moved) = undo.moved {
            if mv.is_en_passant {
                undo.captured_sq = match us {
                    Color::White => mv.to - 8,
                    Color::Black => mv.to + 8,
                };
            }
            undo.captured = self.remove_piece(undo.captured_sq);
            self.remove_piece(mv.from);

            let last_rank = match us {
                Color::White => 7,
                Color::Black => 0,
            };
            let placed = if moved.kind == PieceKind::Pawn && rank_of(mv.to) == last_rank {
                Piece::new(us, mv.promo.unwrap_or(PieceKind::Queen))
            } else {
                moved
            };
            self.put_piece(mv.to, placed);

            if mv.is_castle && moved.kind == PieceKind::King {
                if let Some((rf, rt)) = castle_rook_squares(mv.to) {
                    if let Some(rook) = self.remove_piece(rf) {
                        self.put_piece(rt, rook);
                        undo.rook_move = Some((rf, rt));
                    }
                }
            }

            let kept = CastlingRights(
                self.castling.0 & CASTLE_KEEP[mv.from as usize] & CASTLE_KEEP[mv.to as usize],
            );
            if kept != self.castling {
                self.hash ^= ZOBRIST.castling(self.castling.0) ^ ZOBRIST.castling(kept.0);
                self.castling = kept;
            }

            if moved.kind == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16 {
                let ep = (mv.from + mv.to) / 2;
                self.en_passant = Some(ep);
                self.hash ^= ZOBRIST.en_passant_file(file_of(ep));
            }

            if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
                self.halfmove_clock = 0;
            } else {
                self.halfmove_clock += 1;
            }
        } else {
            debug_assert!(false, "make_move from empty square: {mv}");
            self.halfmove_clock += 1;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = us.other();
        self.hash ^= ZOBRIST.black_to_move();
        undo
    }

    /// Revert `mv` using the record `make_move` returned for it.
    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.side_to_move = self.side_to_move.other();

        if let Some(moved) = undo.moved {
            if let Some((rf, rt)) = undo.rook_move {
                if let Some(rook) = self.remove_piece(rt) {
                    self.put_piece(rf, rook);
                }
            }
            self.remove_piece(mv.to);
            self.put_piece(mv.from, moved);
            if let Some(captured) = undo.captured {
                self.put_piece(undo.captured_sq, captured);
            }
        }

        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.hash = undo.hash;
    }

    /// Parse coordinate notation (`e2e4`, `e7e8q`) against this position.
    ///
    /// Castling and en-passant flags are inferred from the piece on the origin
    /// square. Legality is not checked.
    pub fn parse_move(&self, text: &str) -> ChessResult<Move> {
        let text = text.trim();
        if !(text.len() == 4 || text.len() == 5) || !text.is_ascii() {
            return Err(ChessError::mv(text, "expected 4 or 5 characters"));
        }
        let from = coord_to_sq(&text[0..2])
            .ok_or_else(|| ChessError::mv(text, "bad origin square"))?;
        let to = coord_to_sq(&text[2..4])
            .ok_or_else(|| ChessError::mv(text, "bad destination square"))?;
        let promo = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Some(k @ (PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen)) => {
                    Some(k)
                }
                _ => return Err(ChessError::mv(text, format!("bad promotion piece '{c}'"))),
            },
        };

        let piece = self
            .piece_at(from)
            .ok_or_else(|| ChessError::mv(text, "no piece on origin square"))?;
        if piece.color != self.side_to_move {
            return Err(ChessError::mv(text, "piece on origin square belongs to the opponent"));
        }

        let mut mv = Move::new(from, to);
        mv.promo = promo;
        mv.is_castle = piece.kind == PieceKind::King && file_of(from).abs_diff(file_of(to)) == 2;
        mv.is_en_passant = piece.kind == PieceKind::Pawn
            && Some(to) == self.en_passant
            && file_of(from) != file_of(to);
        Ok(mv)
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
