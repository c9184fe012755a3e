//! Legal move generation: bitboard pseudo-legal moves filtered by a
//! make / in-check / unmake pass.

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::board::Position;
use crate::types::*;

const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut moves = Vec::with_capacity(64);
    legal_moves_into(&mut scratch, &mut moves);
    moves
}

/// Allocation-free variant: fills `moves` (cleared first). `pos` is restored before returning.
pub fn legal_moves_into(pos: &mut Position, moves: &mut Vec<Move>) {
    moves.clear();
    pseudo_legal_moves_into(pos, moves);
    let us = pos.side_to_move();
    moves.retain(|&mv| {
        let undo = pos.make_move(mv);
        let legal = !pos.in_check(us);
        pos.unmake_move(mv, undo);
        legal
    });
}

/// True if the move removes an enemy piece (including en passant).
#[inline]
pub fn is_capture(pos: &Position, mv: Move) -> bool {
    mv.is_en_passant || pos.piece_at(mv.to).is_some()
}

/// Moves that quiescence search considers: captures and promotions.
#[inline]
pub fn is_capture_or_promotion(pos: &Position, mv: Move) -> bool {
    mv.promo.is_some() || is_capture(pos, mv)
}

pub fn pseudo_legal_moves_into(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let own = pos.occupancy(us);
    let enemy = pos.occupancy(us.other());
    let occ = own | enemy;

    gen_pawn_moves(pos, us, enemy, occ, moves);

    for from in pos.pieces(us, PieceKind::Knight) {
        push_targets(from, knight_attacks(from) & !own, moves);
    }
    for from in pos.pieces(us, PieceKind::Bishop) {
        push_targets(from, bishop_attacks(from, occ) & !own, moves);
    }
    for from in pos.pieces(us, PieceKind::Rook) {
        push_targets(from, rook_attacks(from, occ) & !own, moves);
    }
    for from in pos.pieces(us, PieceKind::Queen) {
        push_targets(from, queen_attacks(from, occ) & !own, moves);
    }
    if let Some(king) = pos.king_sq(us) {
        push_targets(king, king_attacks(king) & !own, moves);
        gen_castling(pos, us, king, occ, moves);
    }
}

#[inline]
fn push_targets(from: u8, targets: Bitboard, moves: &mut Vec<Move>) {
    moves.extend(targets.map(|to| Move::new(from, to)));
}

fn push_pawn_move(from: u8, to: u8, moves: &mut Vec<Move>) {
    let r = rank_of(to);
    if r == 0 || r == 7 {
        moves.extend(PROMOTIONS.iter().map(|&p| Move::with_promo(from, to, p)));
    } else {
        moves.push(Move::new(from, to));
    }
}

fn gen_pawn_moves(pos: &Position, us: Color, enemy: Bitboard, occ: Bitboard, moves: &mut Vec<Move>) {
    let pawns = pos.pieces(us, PieceKind::Pawn);
    let empty = !occ;

    let (single, double) = match us {
        Color::White => {
            let single = pawns.north() & empty;
            (single, (single & Bitboard(0x0000_0000_00FF_0000)).north() & empty)
        }
        Color::Black => {
            let single = pawns.south() & empty;
            (single, (single & Bitboard(0x0000_FF00_0000_0000)).south() & empty)
        }
    };
    let back = |to: u8, steps: u8| match us {
        Color::White => to - 8 * steps,
        Color::Black => to + 8 * steps,
    };

    for to in single {
        push_pawn_move(back(to, 1), to, moves);
    }
    for to in double {
        moves.push(Move::new(back(to, 2), to));
    }

    for from in pawns {
        let attacks = pawn_attacks(from, us);
        for to in attacks & enemy {
            push_pawn_move(from, to, moves);
        }
        if let Some(ep) = pos.en_passant() {
            if attacks.contains(ep) {
                let mut mv = Move::new(from, ep);
                mv.is_en_passant = true;
                moves.push(mv);
            }
        }
    }
}

fn gen_castling(pos: &Position, us: Color, king: u8, occ: Bitboard, moves: &mut Vec<Move>) {
    let rights = pos.castling();
    let home = match us {
        Color::White => 4,
        Color::Black => 60,
    };
    if king != home {
        return;
    }
    let them = us.other();
    let rook = Piece::new(us, PieceKind::Rook);

    let king_side_between = [home + 1, home + 2];
    let queen_side_between = [home - 1, home - 2, home - 3];
    // (right held, rook square, squares that must be empty, squares the king crosses)
    let sides: [(bool, u8, &[u8], [u8; 2]); 2] = [
        (rights.king_side(us), home + 3, &king_side_between, [home + 1, home + 2]),
        (rights.queen_side(us), home - 4, &queen_side_between, [home - 1, home - 2]),
    ];

    let mut checked = None;
    for (allowed, rook_sq, between, path) in sides {
        if !allowed || pos.piece_at(rook_sq) != Some(rook) {
            continue;
        }
        if between.iter().any(|&s| occ.contains(s)) {
            continue;
        }
        let in_check = *checked.get_or_insert_with(|| pos.is_square_attacked(king, them));
        if in_check || path.iter().any(|&s| pos.is_square_attacked(s, them)) {
            continue;
        }
        let mut mv = Move::new(king, path[1]);
        mv.is_castle = true;
        moves.push(mv);
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
