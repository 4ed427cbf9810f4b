//! Legal move generation, including capture chains and the mandatory capture rule.

use arrayvec::ArrayVec;

use crate::position::side_trait::{PcTr, PlayerTr, SideTr};
use crate::position::{squares_iterator, Direction, Move, Piece, Position, Side, Square};

/// All legal moves for `side`. If any move captures, only capturing moves are returned.
pub fn find_moves(position: &Position, side: Side) -> Vec<Move> {
    let mut moves = vec![];
    match side {
        Side::Player => generate_moves_sidetr::<PlayerTr>(position, &mut moves),
        Side::Pc => generate_moves_sidetr::<PcTr>(position, &mut moves),
    }
    if moves.iter().any(Move::involved_capture) {
        moves.retain(Move::involved_capture);
    }
    moves
}

/// Number of leaf positions `depth` plies ahead, with `side` moving first
pub fn perft(position: &Position, side: Side, depth: u16) -> u64 {
    if depth == 0 {
        1
    } else {
        find_moves(position, side)
            .iter()
            .map(|mv| perft(mv.resulting_position(), !side, depth - 1))
            .sum()
    }
}

fn generate_moves_sidetr<Us: SideTr>(position: &Position, moves: &mut Vec<Move>) {
    for square in squares_iterator() {
        let Some(piece) = position[square] else {
            continue;
        };
        if !Us::piece_is_ours(piece) {
            continue;
        }
        for direction in piece_directions::<Us>(piece) {
            add_move_step::<Us>(moves, position, square, piece, direction, 0);
        }
    }
    debug_assert!(
        moves.iter().all(|mv| mv.origin(position, Us::side()).is_some()
            || mv.involved_capture()),
        "Generated a move without an origin square on board\n{:?}",
        position
    );
}

fn piece_directions<Us: SideTr>(piece: Piece) -> ArrayVec<Direction, 4> {
    if piece == Us::king_piece() {
        ArrayVec::from(Direction::ALL)
    } else {
        Us::forward_directions().into_iter().collect()
    }
}

/// Tries to move `piece` one step from `from` in `direction`, following capture chains.
/// `score` is the value captured so far in this chain, and is 0 iff nothing has been captured yet.
///
/// Returns true if the step was possible, in which case it has either been added to `moves`,
/// or extended by the recursion into longer captures.
fn add_move_step<Us: SideTr>(
    moves: &mut Vec<Move>,
    position: &Position,
    from: Square,
    piece: Piece,
    direction: Direction,
    score: u8,
) -> bool {
    let Some(neighbour) = from.go_direction(direction) else {
        return false;
    };

    let Some(target) = position[neighbour] else {
        // A simple step is a complete move on its own, it cannot end a chain
        if score > 0 {
            return false;
        }
        let mut resulting_position = position.clone();
        resulting_position[from] = None;
        resulting_position[neighbour] = Some(Us::piece_after_landing(piece, neighbour));
        moves.push(Move::new(resulting_position, false, 0));
        return true;
    };

    if Us::piece_is_ours(target) {
        return false;
    }
    let Some(landing) = neighbour.go_direction(direction) else {
        return false;
    };
    if position[landing].is_some() {
        return false;
    }
    // Pawns can only capture pawns
    if piece == Us::pawn_piece() && target != Us::opponent_pawn() {
        return false;
    }

    let mut resulting_position = position.clone();
    resulting_position[from] = None;
    resulting_position[neighbour] = None;
    let landed_piece = Us::piece_after_landing(piece, landing);
    resulting_position[landing] = Some(landed_piece);
    let score = score + target.value();

    // Chain directions are decided by the piece that started this jump,
    // so a pawn promoted on the back row stops there
    let mut extended = false;
    for next_direction in piece_directions::<Us>(piece) {
        if add_move_step::<Us>(
            moves,
            &resulting_position,
            landing,
            landed_piece,
            next_direction,
            score,
        ) {
            extended = true;
        }
    }

    if !extended {
        moves.push(Move::new(resulting_position, true, score));
    }
    true
}
