use crate::{board::Position, movegen::legal_moves_into, types::Move};

/// Number of leaf positions exactly `depth` plies below `pos`.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut buffers = vec![Vec::with_capacity(64); depth as usize];
    count(pos, depth, &mut buffers)
}

/// Per-root-move leaf counts, in generator order.
pub fn perft_divide(pos: &mut Position, depth: u8) -> Vec<(Move, u64)> {
    let mut roots = Vec::with_capacity(64);
    legal_moves_into(pos, &mut roots);
    if depth == 0 {
        return Vec::new();
    }
    let mut buffers = vec![Vec::with_capacity(64); depth as usize];
    roots
        .into_iter()
        .map(|mv| {
            let undo = pos.make_move(mv);
            let nodes = count(pos, depth - 1, &mut buffers);
            pos.unmake_move(mv, undo);
            (mv, nodes)
        })
        .collect()
}

// One move buffer per remaining ply keeps the recursion allocation-free.
fn count(pos: &mut Position, depth: u8, buffers: &mut [Vec<Move>]) -> u64 {
    if depth == 0 {
        return 1;
    }
    let Some((moves, deeper)) = buffers.split_first_mut() else {
        return 0;
    };
    legal_moves_into(pos, moves);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for &mv in moves.iter() {
        let undo = pos.make_move(mv);
        nodes += count(pos, depth - 1, deeper);
        pos.unmake_move(mv, undo);
    }
    nodes
}
