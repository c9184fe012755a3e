//! Coordinate-notation helpers shared by the protocol layer and tests.

use crate::{board::Position, movegen::legal_moves, types::Move};

pub fn move_to_uci(mv: Move) -> String {
    mv.to_string()
}

/// Space-separated move list, as used after `pv` in `info` lines.
pub fn moves_to_uci(moves: &[Move]) -> String {
    moves
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look `text` up among the legal moves of `pos`. A missing promotion letter
/// matches the queen promotion.
pub fn parse_legal_move(pos: &Position, text: &str) -> Option<Move> {
    let parsed = pos.parse_move(text).ok()?;
    legal_moves(pos).into_iter().find(|m| {
        m.from == parsed.from
            && m.to == parsed.to
            && match parsed.promo {
                Some(p) => m.promo == Some(p),
                None => m.promo.is_none() || m.promo == Some(crate::types::PieceKind::Queen),
            }
    })
}
