use crate::difficulty::Difficulty;
use crate::ordering::order_moves;
use crate::transposition::{NodeType, Transposition, TranspositionTable};
use chess_core::eval::evaluate;
use chess_core::{rules, Move, Position, Zobrist};
use common::Error;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::instrument;

/// Large sentinel bounds for the root alpha-beta window (spec §4.4).
const INF: i32 = 1_000_000;

/// The score assigned to a position with no legal moves, biased by the
/// remaining depth so shorter mates are preferred over longer ones.
fn terminal_score(remaining_depth: u8) -> i32 {
    -100_000 - remaining_depth as i32
}

/// The outcome of [`best_move`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: i32,
    pub depth: u8,
}

/// Aggregated statistics across every Lazy-SMP worker of one search.
#[derive(Debug, Default)]
pub struct SearchStats {
    pub nodes_searched: AtomicU64,
}

fn negamax(
    position: &Position,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    tt: &TranspositionTable,
    pv_move: Option<Move>,
    stats: &SearchStats,
) -> i32 {
    stats.nodes_searched.fetch_add(1, Ordering::Relaxed);

    let hash: Zobrist = position.zobrist();
    let tt_entry = tt.get(hash);

    if let Some(entry) = tt_entry {
        if entry.depth >= depth {
            match entry.node_type {
                NodeType::Exact => return entry.score,
                NodeType::LowerBound if entry.score >= beta => return entry.score,
                NodeType::UpperBound if entry.score <= alpha => return entry.score,
                _ => {}
            }
        }
    }

    let mut moves = rules::legal_moves(position);

    if moves.is_empty() {
        return terminal_score(depth);
    }

    if depth == 0 {
        return evaluate(position);
    }

    let tt_best = tt_entry.and_then(|e| e.best);
    order_moves(position, &mut moves, tt_best, pv_move);

    let original_alpha = alpha;
    let mut best_score = -INF;
    let mut best_move = moves[0];

    for mov in moves {
        let next = position.make_move(mov);
        let score = -negamax(&next, depth - 1, -beta, -alpha, tt, None, stats);

        if score > best_score {
            best_score = score;
            best_move = mov;
        }

        alpha = alpha.max(best_score);
        if alpha >= beta {
            break;
        }
    }

    let node_type = if best_score >= beta {
        NodeType::LowerBound
    } else if best_score <= original_alpha {
        NodeType::UpperBound
    } else {
        NodeType::Exact
    };

    tt.insert(
        hash,
        Transposition {
            depth,
            score: best_score,
            best: Some(best_move),
            node_type,
        },
    );

    best_score
}

/// Iterative deepening from depth 1 up to `max_depth`, reusing the previous
/// iteration's best move to seed move ordering at the root.
///
/// The root ply is searched through `negamax` itself rather than a
/// special-cased loop, so it probes and stores the shared transposition
/// table exactly like every other node (spec §4.4's node contract applies
/// to the root too, and is what lets the next iteration's move ordering
/// pick up the root's TT-best move).
fn iterative_deepening(
    position: &Position,
    max_depth: u8,
    tt: &TranspositionTable,
    stats: &SearchStats,
) -> SearchResult {
    let moves = rules::legal_moves(position);
    debug_assert!(!moves.is_empty(), "caller checked for legal moves");

    let mut result = SearchResult {
        best_move: moves[0],
        score: evaluate(position),
        depth: 0,
    };

    for depth in 1..=max_depth {
        let score = negamax(position, depth, -INF, INF, tt, Some(result.best_move), stats);
        let best_move = tt.get(position.zobrist()).and_then(|e| e.best).unwrap_or(result.best_move);

        result = SearchResult { best_move, score, depth };
    }

    result
}

/// Searches for the strongest move in `position` at the given `difficulty`
/// (spec §4.4), launching Lazy-SMP workers that share one transposition
/// table and returning the highest-scoring move found by any of them.
///
/// Fails with [`Error::NoLegalMoves`] if `position` is terminal.
#[instrument(level = "trace", skip(position))]
pub fn best_move(position: &Position, difficulty: Difficulty) -> Result<SearchResult, Error> {
    if rules::legal_moves(position).is_empty() {
        return Err(Error::NoLegalMoves);
    }

    let max_depth = difficulty.max_depth();
    let worker_count = difficulty.worker_count_hint();
    let tt = TranspositionTable::with_megabyte_budget(64);
    let stats = SearchStats::default();

    // Lazy-SMP: N independent iterative-deepening workers share only `tt`.
    let results: Vec<SearchResult> = (0..worker_count)
        .into_par_iter()
        .map(|_| iterative_deepening(position, max_depth, &tt, &stats))
        .collect();

    let best = results
        .into_iter()
        .max_by_key(|r| r.score)
        .expect("worker_count is always at least one");

    tracing::debug!(nodes = stats.nodes_searched.load(Ordering::Relaxed), ?best, "search complete");

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_mate_in_one() {
        // White to move, Qh5xf7 is Scholar's Mate's final, checkmating move.
        let before = Position::from_fen(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        )
        .unwrap();

        let result = best_move(&before, Difficulty::Beginner).unwrap();
        assert_eq!(result.best_move.to_string(), "h5f7");
    }

    #[test]
    fn fails_with_no_legal_moves_in_checkmate() {
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(best_move(&pos, Difficulty::Beginner), Err(Error::NoLegalMoves));
    }

    #[test]
    fn deeper_difficulty_reports_deeper_depth() {
        let pos = Position::initial();
        let result = best_move(&pos, Difficulty::Beginner).unwrap();
        assert_eq!(result.depth, Difficulty::Beginner.max_depth());
    }
}
