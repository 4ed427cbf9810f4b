//! The computer's search: depth-limited minimax with alpha-beta pruning.
//!
//! The static evaluation is just the material captured along the line, computer captures
//! counting positive and player captures negative. A side without legal moves has lost.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::move_gen::find_moves;
use crate::position::{Move, Position, Side};

pub mod worker;

pub type Score = i32;

/// Score of a line where the player runs out of moves
pub const WIN_SCORE: Score = Score::MAX;
/// Score of a line where the computer runs out of moves
pub const LOSS_SCORE: Score = Score::MIN;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Score,
    pub nodes: u64,
}

/// Finds the computer's best move, searching `depth` plies beyond its own move.
/// Returns `None` if the computer cannot move.
pub fn calculate_best_move(position: &Position, depth: u16) -> Option<Move> {
    search_with_rng(position, depth, &mut rand::thread_rng()).map(|result| result.best_move)
}

/// Like `calculate_best_move`, but equal-score moves are picked using `rng`
pub fn search_with_rng<R: Rng + ?Sized>(
    position: &Position,
    depth: u16,
    rng: &mut R,
) -> Option<SearchResult> {
    search(position, depth, Some(rng), None)
}

/// The full search. Root moves are shuffled if an `rng` is given.
///
/// If `abort` is set during the search, it returns early with a meaningless result.
pub fn search<R: Rng + ?Sized>(
    position: &Position,
    depth: u16,
    rng: Option<&mut R>,
    abort: Option<&AtomicBool>,
) -> Option<SearchResult> {
    let start_time = Instant::now();
    let mut searcher = Searcher { abort, nodes: 0 };

    let mut moves = find_moves(position, Side::Pc);
    if let Some(rng) = rng {
        moves.shuffle(rng);
    }
    moves.sort_by_key(|mv| Reverse(mv.captured_value()));

    let mut best: Option<(usize, Score)> = None;
    let mut alpha = LOSS_SCORE;
    for (i, mv) in moves.iter().enumerate() {
        let score = searcher.minimax(
            mv,
            Score::from(mv.captured_value()),
            false,
            depth,
            alpha,
            WIN_SCORE,
        );
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
        if score == WIN_SCORE || searcher.is_aborted() {
            break;
        }
        alpha = alpha.max(score);
    }

    let (index, score) = best?;
    debug!(
        "Searched {} nodes to depth {} in {:.1}s, score {}",
        searcher.nodes,
        depth,
        start_time.elapsed().as_secs_f32(),
        score
    );
    Some(SearchResult {
        best_move: moves.swap_remove(index),
        score,
        nodes: searcher.nodes,
    })
}

struct Searcher<'a> {
    abort: Option<&'a AtomicBool>,
    nodes: u64,
}

impl Searcher<'_> {
    fn is_aborted(&self) -> bool {
        self.abort
            .is_some_and(|abort| abort.load(Ordering::Relaxed))
    }

    /// Score of the position after `mv`, with the computer to move if `maximizing`.
    /// `score` is the material captured so far along this line.
    fn minimax(
        &mut self,
        mv: &Move,
        score: Score,
        maximizing: bool,
        depth: u16,
        mut alpha: Score,
        mut beta: Score,
    ) -> Score {
        self.nodes += 1;
        if depth == 0 || self.is_aborted() {
            return score;
        }

        if maximizing {
            let mut moves = find_moves(mv.resulting_position(), Side::Pc);
            moves.sort_by_key(|child| Reverse(child.captured_value()));
            let mut best_score = LOSS_SCORE;
            for child in moves.iter() {
                let child_score = self.minimax(
                    child,
                    score + Score::from(child.captured_value()),
                    false,
                    depth - 1,
                    alpha,
                    beta,
                );
                best_score = best_score.max(child_score);
                alpha = alpha.max(child_score);
                if beta <= alpha {
                    break;
                }
            }
            best_score
        } else {
            let mut moves = find_moves(mv.resulting_position(), Side::Player);
            moves.sort_by_key(|child| Reverse(child.captured_value()));
            let mut best_score = WIN_SCORE;
            for child in moves.iter() {
                let child_score = self.minimax(
                    child,
                    score - Score::from(child.captured_value()),
                    true,
                    depth - 1,
                    alpha,
                    beta,
                );
                best_score = best_score.min(child_score);
                beta = beta.min(child_score);
                if beta <= alpha {
                    break;
                }
            }
            best_score
        }
    }
}
