#[cfg(test)]
mod match_tests;

#[cfg(test)]
use crate::move_gen::find_moves;
#[cfg(test)]
use crate::position::{playable_squares, Move, Piece, Position, Side, Square};
#[cfg(test)]
use rand::seq::SliceRandom;
#[cfg(test)]
use rand::Rng;

#[cfg(test)]
fn position_from_diagram(diagram: &str) -> Position {
    diagram
        .parse()
        .unwrap_or_else(|err| panic!("Bad test diagram: {}\n{}", err, diagram))
}

#[cfg(test)]
fn square(name: &str) -> Square {
    name.parse().unwrap()
}

/// Plays random legal moves from the start position, calling `visit` with every position reached
/// and the side to move in it, until one side cannot move or `max_plies` have been played.
#[cfg(test)]
fn random_playout<R: Rng, F: FnMut(&Position, Side, &[Move])>(
    rng: &mut R,
    max_plies: usize,
    mut visit: F,
) {
    let mut position = Position::start_position();
    let mut side = Side::Player;
    for _ in 0..max_plies {
        let moves = find_moves(&position, side);
        visit(&position, side, &moves);
        let Some(mv) = moves.choose(rng) else {
            break;
        };
        position = mv.resulting_position().clone();
        side = !side;
    }
}

/// Checks everything that must hold for the legal moves of any position
#[cfg(test)]
fn check_move_invariants(position: &Position, side: Side, moves: &[Move]) {
    let any_capture = moves.iter().any(Move::involved_capture);
    for mv in moves {
        let after = mv.resulting_position();
        assert!(
            !any_capture || mv.involved_capture(),
            "Non-capturing move {:?} returned alongside captures on board\n{:?}",
            after,
            position
        );
        if !mv.involved_capture() {
            assert_eq!(mv.captured_value(), 0);
            let origin = mv.origin(position, side).unwrap();
            assert!(position[origin].is_some_and(|piece| piece.side() == side));
            assert!(mv.destination(position).is_some());
        }
        assert_eq!(
            position.material(!side) - after.material(!side),
            mv.captured_value() as u32,
            "Wrong captured value for move to\n{:?}from\n{:?}",
            after,
            position
        );
        assert_eq!(position.piece_count(side), after.piece_count(side));
        assert_eq!(
            after
                .pieces()
                .filter(|(square, piece)| {
                    *piece == Piece::PlayerPawn && square.row() == 0
                        || *piece == Piece::PcPawn && square.row() == 7
                })
                .count(),
            0,
            "Pawn was not promoted on\n{:?}",
            after
        );
        for (square, _) in after.pieces() {
            assert!(square.is_playable());
        }
    }
    assert!(playable_squares().count() == 32);
}
