//! A very simple implementation of the minmax search algorithm, without any pruning.
//! This is not used by the match at all, it is here to check the real search against.

use crate::move_gen::find_moves;
use crate::position::{Move, Position, Side};
use crate::search::{Score, LOSS_SCORE, WIN_SCORE};

/// Returns the computer's best move in `position` and its score, calculating up to `depth` plies
/// beyond the computer's own move. Ties are broken in favour of the first generated move.
pub fn minmax(position: &Position, depth: u16) -> (Option<Move>, Score) {
    let mut best: (Option<Move>, Score) = (None, LOSS_SCORE);
    for mv in find_moves(position, Side::Pc) {
        let score = minmax_score(&mv, Score::from(mv.captured_value()), Side::Player, depth);
        if best.0.is_none() || score > best.1 {
            best = (Some(mv), score);
        }
    }
    best
}

fn minmax_score(mv: &Move, score: Score, side_to_move: Side, depth: u16) -> Score {
    if depth == 0 {
        return score;
    }
    let child_scores = find_moves(mv.resulting_position(), side_to_move)
        .into_iter()
        .map(|child| match side_to_move {
            Side::Pc => minmax_score(
                &child,
                score + Score::from(child.captured_value()),
                Side::Player,
                depth - 1,
            ),
            Side::Player => minmax_score(
                &child,
                score - Score::from(child.captured_value()),
                Side::Pc,
                depth - 1,
            ),
        });
    match side_to_move {
        Side::Pc => child_scores.max().unwrap_or(LOSS_SCORE),
        Side::Player => child_scores.min().unwrap_or(WIN_SCORE),
    }
}
