//* Traits for the player/computer sides. Useful for writing functions that are generic over side,
//* like how the move generator is structured.

use crate::position::Direction::{NorthEast, NorthWest, SouthEast, SouthWest};
use crate::position::Piece::{PcKing, PcPawn, PlayerKing, PlayerPawn};
use crate::position::{Direction, Piece, Side, Square, BOARD_WIDTH};

pub(crate) trait SideTr {
    fn side() -> Side;

    fn pawn_piece() -> Piece;

    fn king_piece() -> Piece;

    fn opponent_pawn() -> Piece;

    /// The two diagonals a pawn moves and captures along
    fn forward_directions() -> [Direction; 2];

    /// The row where pawns are promoted
    fn promotion_row() -> u8;

    fn piece_is_ours(piece: Piece) -> bool;

    /// The piece after landing on `square`, promoted if it is a pawn reaching the back row
    fn piece_after_landing(piece: Piece, square: Square) -> Piece {
        if piece == Self::pawn_piece() && square.row() == Self::promotion_row() {
            Self::king_piece()
        } else {
            piece
        }
    }
}

pub(crate) struct PlayerTr {}

impl SideTr for PlayerTr {
    fn side() -> Side {
        Side::Player
    }

    fn pawn_piece() -> Piece {
        PlayerPawn
    }

    fn king_piece() -> Piece {
        PlayerKing
    }

    fn opponent_pawn() -> Piece {
        PcPawn
    }

    fn forward_directions() -> [Direction; 2] {
        [NorthWest, NorthEast]
    }

    fn promotion_row() -> u8 {
        0
    }

    fn piece_is_ours(piece: Piece) -> bool {
        piece == PlayerPawn || piece == PlayerKing
    }
}

pub(crate) struct PcTr {}

impl SideTr for PcTr {
    fn side() -> Side {
        Side::Pc
    }

    fn pawn_piece() -> Piece {
        PcPawn
    }

    fn king_piece() -> Piece {
        PcKing
    }

    fn opponent_pawn() -> Piece {
        PlayerPawn
    }

    fn forward_directions() -> [Direction; 2] {
        [SouthWest, SouthEast]
    }

    fn promotion_row() -> u8 {
        BOARD_WIDTH as u8 - 1
    }

    fn piece_is_ours(piece: Piece) -> bool {
        piece == PcPawn || piece == PcKing
    }
}
