//! Iterative-deepening negamax with alpha-beta pruning, a transposition
//! table, killer moves and a capture-only quiescence search.

use std::time::Duration;

use chess_core::{
    is_capture_or_promotion, GameResult, GameState, IterationInfo, Move, PieceKind, SearchLimits,
    SearchReporter, SearchResult,
};
use tracing::{debug, trace};

use crate::eval::{Evaluate, MATE_SCORE};
use crate::killers::KillerMoveTable;
use crate::transposition::{Bound, TranspositionTable};

/// Window bound, far outside any reachable score.
pub const INFINITY: i32 = 1_000_000_000;

/// Default cap on the quiescence depth.
pub const DEFAULT_MAX_QUIESCENCE_DEPTH: u8 = 10;

/// Counters collected over one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchInfo {
    pub nodes: u64,
    pub quiescence_nodes: u64,
    pub max_depth_completed: u8,
    /// Transposition-table probes that found an entry for the position.
    pub cache_hits: u64,
    /// Probes that ended the node without searching it.
    pub cache_cutoffs: u64,
    pub elapsed: Duration,
}

impl SearchInfo {
    pub fn total_nodes(&self) -> u64 {
        self.nodes + self.quiescence_nodes
    }
}

/// One search over a game, borrowing the evaluator and the shared table.
pub struct Search<'a, E: Evaluate> {
    evaluator: &'a E,
    tt: &'a TranspositionTable,
    limits: SearchLimits,
    max_qdepth: u8,
    killers: KillerMoveTable,
    info: SearchInfo,
    /// Best line per ply for the iteration in progress.
    pv_table: Vec<Vec<Move>>,
    /// Best line of the last completed iteration, root move first.
    prev_pv: Vec<Move>,
    move_buffers: Vec<Vec<Move>>,
}

impl<'a, E: Evaluate> Search<'a, E> {
    pub fn new(evaluator: &'a E, tt: &'a TranspositionTable, limits: SearchLimits, max_qdepth: u8) -> Self {
        Self {
            evaluator,
            tt,
            limits,
            max_qdepth,
            killers: KillerMoveTable::new(),
            info: SearchInfo::default(),
            pv_table: Vec::new(),
            prev_pv: Vec::new(),
            move_buffers: Vec::new(),
        }
    }

    pub fn info(&self) -> &SearchInfo {
        &self.info
    }

    /// Deepen one ply at a time until the depth limit or cancellation and
    /// return the last completed iteration. Depth 1 always runs, so a game with
    /// legal moves always yields a move.
    pub fn run(&mut self, game: &mut GameState, reporter: &mut dyn SearchReporter) -> SearchResult {
        if game.legal_moves().is_empty() {
            return SearchResult {
                score: self.terminal_score(game, 0),
                ..SearchResult::default()
            };
        }

        let max_depth = self.limits.depth.max(1);
        let mut result = SearchResult::default();
        for depth in 1..=max_depth {
            if depth > 1 && self.limits.should_stop() {
                trace!(depth, "search stopped before starting depth");
                result.stopped = true;
                break;
            }

            let qdepth = (depth / 2).min(self.max_qdepth);
            self.killers.clear();
            let (score, cancelled) = self.alpha_beta(game, depth, qdepth, 0, -INFINITY, INFINITY);
            if cancelled && depth > 1 {
                trace!(depth, "search cancelled, keeping depth {}", depth - 1);
                result.stopped = true;
                break;
            }

            // Depth 1 cut off before any move finished has no real score
            let score = if score == -INFINITY {
                self.evaluator.evaluate(game)
            } else {
                score
            };
            let pv = self.pv_table[0].clone();
            self.info.max_depth_completed = depth;
            self.info.elapsed = self.limits.time_control.elapsed();

            let report = IterationInfo {
                depth,
                score,
                nodes: self.info.total_nodes(),
                elapsed: self.info.elapsed,
                pv: pv.clone(),
            };
            debug!(
                depth,
                score,
                nodes = report.nodes,
                nps = report.nps(),
                cache_hits = self.info.cache_hits,
                cache_cutoffs = self.info.cache_cutoffs,
                "completed depth"
            );
            reporter.report(&report);

            result = SearchResult {
                best_move: pv.first().copied(),
                score,
                depth,
                nodes: self.info.total_nodes(),
                pv: pv.clone(),
                stopped: cancelled,
            };
            self.prev_pv = pv;
            if cancelled {
                break;
            }
        }

        self.info.elapsed = self.limits.time_control.elapsed();
        result.nodes = self.info.total_nodes();
        result
    }

    fn ensure_ply(&mut self, ply: usize) {
        if self.pv_table.len() <= ply {
            self.pv_table.resize_with(ply + 1, Vec::new);
            self.move_buffers.resize_with(ply + 1, || Vec::with_capacity(64));
        }
    }

    /// Score of a finished game for the side to move; shorter mates score higher.
    fn terminal_score(&self, game: &GameState, ply: usize) -> i32 {
        let mate = MATE_SCORE - ply as i32;
        match game.result() {
            GameResult::InProgress => self.evaluator.evaluate(game),
            GameResult::Draw => 0,
            winner if winner == GameResult::winner(game.side_to_move()) => mate,
            _ => -mate,
        }
    }

    /// Negamax node. Returns the score and whether the search was cancelled
    /// somewhere below this node.
    fn alpha_beta(
        &mut self,
        game: &mut GameState,
        depth_left: u8,
        qdepth: u8,
        ply: usize,
        mut alpha: i32,
        mut beta: i32,
    ) -> (i32, bool) {
        self.ensure_ply(ply);
        self.pv_table[ply].clear();
        self.info.nodes += 1;

        // The root is searched even when the game already records a draw
        if depth_left == 0 || (ply > 0 && game.is_game_over()) {
            if game.is_game_over() {
                return (self.terminal_score(game, ply), false);
            }
            return (self.quiescence(game, alpha, beta, qdepth, ply), false);
        }

        let alpha_original = alpha;
        let hash = game.hash();
        if let Some(entry) = self.tt.load(hash) {
            self.info.cache_hits += 1;
            if entry.depth >= depth_left {
                let cutoff = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => {
                        alpha = alpha.max(entry.score);
                        alpha >= beta
                    }
                    Bound::Upper => {
                        beta = beta.min(entry.score);
                        alpha >= beta
                    }
                };
                if cutoff {
                    self.info.cache_cutoffs += 1;
                    if !is_capture_or_promotion(game.position(), entry.best_move) {
                        self.killers.update(ply, entry.best_move);
                    }
                    self.pv_table[ply].push(entry.best_move);
                    return (entry.score, false);
                }
            }
        }

        let mut moves = std::mem::take(&mut self.move_buffers[ply]);
        game.legal_moves_into(&mut moves);
        self.order_moves(&mut moves, ply);

        let mut best_score = -INFINITY;
        let mut best_move = None;
        let mut last_move = None;
        let mut cancelled = false;
        for &mv in moves.iter() {
            last_move = Some(mv);
            if self.limits.should_stop() {
                cancelled = true;
                break;
            }

            game.push_move(mv);
            let (child_score, child_cancelled) =
                self.alpha_beta(game, depth_left - 1, qdepth, ply + 1, -beta, -alpha);
            let popped = game.pop_move();
            debug_assert!(popped.is_ok());
            if child_cancelled {
                cancelled = true;
                break;
            }

            let score = -child_score;
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                let (head, tail) = self.pv_table.split_at_mut(ply + 1);
                head[ply].clear();
                head[ply].push(mv);
                head[ply].extend_from_slice(&tail[0]);
            }
            alpha = alpha.max(score);
            if alpha >= beta {
                if !is_capture_or_promotion(game.position(), mv) {
                    self.killers.update(ply, mv);
                }
                break;
            }
        }
        self.move_buffers[ply] = moves;

        let best_move = best_move.or(last_move);
        if let Some(mv) = best_move {
            if self.pv_table[ply].is_empty() {
                self.pv_table[ply].push(mv);
            }
            if !cancelled {
                let bound = if best_score <= alpha_original {
                    Bound::Upper
                } else if best_score >= beta {
                    Bound::Lower
                } else {
                    Bound::Exact
                };
                self.tt.insert_if_needed(hash, mv, best_score, depth_left, bound);
            }
        }
        (best_score, cancelled)
    }

    /// Principal-variation move first, then the two killers in slots 1 and 2.
    fn order_moves(&self, moves: &mut [Move], ply: usize) {
        if let Some(&pv_move) = self.prev_pv.get(ply) {
            if let Some(i) = moves.iter().position(|&m| m == pv_move) {
                moves.swap(0, i);
            }
        }
        for (slot, killer) in self.killers.fetch(ply).into_iter().enumerate() {
            let Some(killer) = killer else { continue };
            let target = slot + 1;
            if let Some(i) = moves.iter().position(|&m| m == killer) {
                if i > target {
                    moves.swap(target, i);
                }
            }
        }
    }

    /// Fail-hard capture search from a leaf.
    fn quiescence(&mut self, game: &mut GameState, mut alpha: i32, beta: i32, depth_left: u8, ply: usize) -> i32 {
        if game.is_game_over() {
            return self.terminal_score(game, ply);
        }

        let stand_pat = self.evaluator.evaluate(game);
        if depth_left == 0 {
            return stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        self.ensure_ply(ply);
        let mut captures = std::mem::take(&mut self.move_buffers[ply]);
        self.captures_in_order(game, &mut captures);

        let mut cutoff = false;
        for &mv in captures.iter() {
            game.push_move(mv);
            self.info.quiescence_nodes += 1;
            let score = -self.quiescence(game, -beta, -alpha, depth_left - 1, ply + 1);
            let popped = game.pop_move();
            debug_assert!(popped.is_ok());

            if score >= beta {
                cutoff = true;
                break;
            }
            alpha = alpha.max(score);
        }
        self.move_buffers[ply] = captures;
        if cutoff {
            beta
        } else {
            alpha
        }
    }

    /// Captures and promotions, most valuable victim first, then least
    /// valuable attacker.
    fn captures_in_order(&self, game: &mut GameState, moves: &mut Vec<Move>) {
        game.legal_moves_into(moves);
        let pos = game.position();
        moves.retain(|&mv| is_capture_or_promotion(pos, mv));
        moves.sort_by_cached_key(|&mv| {
            let victim = if mv.is_en_passant {
                Some(PieceKind::Pawn)
            } else {
                pos.piece_at(mv.to).map(|p| p.kind)
            };
            let victim_value = victim.map_or(0, |kind| self.evaluator.piece_value(kind));
            let attacker = pos.piece_at(mv.from).map_or(0, |p| p.kind.idx());
            (-victim_value, attacker)
        });
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
