//! Italian draughts board representation, along with all required data types.

use std::fmt;
use std::ops::{self, Index, IndexMut};
use std::str::FromStr;

use board_game_traits::Color;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use mv::Move;
pub use square::{playable_squares, squares_iterator, Square, BOARD_WIDTH, NUM_SQUARES};

use Piece::*;

mod mv;
pub(crate) mod side_trait;
mod square;

/// Score of capturing a pawn
pub const PAWN_VALUE: u8 = 1;
/// Score of capturing a king
pub const KING_VALUE: u8 = 2;

/// One of the two participants of a match. The player is the human at the bottom of the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Player,
    Pc,
}

impl Side {
    /// The colour the side's pieces are drawn in. The side that moves first plays white.
    pub fn color(self, first_player: Side) -> Color {
        if self == first_player {
            Color::White
        } else {
            Color::Black
        }
    }
}

impl ops::Not for Side {
    type Output = Side;

    fn not(self) -> Self::Output {
        match self {
            Side::Player => Side::Pc,
            Side::Pc => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Pc => write!(f, "computer"),
        }
    }
}

/// One of the four pieces. A king (dame) is a promoted pawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Piece {
    PcPawn,
    PcKing,
    PlayerPawn,
    PlayerKing,
}

impl Piece {
    pub const fn side(self) -> Side {
        match self {
            PcPawn | PcKing => Side::Pc,
            PlayerPawn | PlayerKing => Side::Player,
        }
    }

    pub const fn is_king(self) -> bool {
        matches!(self, PcKing | PlayerKing)
    }

    /// What capturing this piece is worth
    pub const fn value(self) -> u8 {
        if self.is_king() {
            KING_VALUE
        } else {
            PAWN_VALUE
        }
    }

    pub const fn to_char(self) -> char {
        match self {
            PcPawn => 'x',
            PcKing => 'X',
            PlayerPawn => 'o',
            PlayerKing => 'O',
        }
    }

    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            'x' => Some(PcPawn),
            'X' => Some(PcKing),
            'o' => Some(PlayerPawn),
            'O' => Some(PlayerKing),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::NorthWest,
        Direction::NorthEast,
        Direction::SouthWest,
        Direction::SouthEast,
    ];
}

/// The complete board, 64 cells indexed by `row * 8 + col`.
///
/// Positions are plain values: moves carry a full copy of the position they result in,
/// so nothing is ever mutated in place during move generation or search.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Position {
    cells: [Option<Piece>; NUM_SQUARES],
}

impl Index<Square> for Position {
    type Output = Option<Piece>;

    fn index(&self, square: Square) -> &Self::Output {
        &self.cells[square.index()]
    }
}

impl IndexMut<Square> for Position {
    fn index_mut(&mut self, square: Square) -> &mut Self::Output {
        &mut self.cells[square.index()]
    }
}

/// The starting layout: computer pawns on rows 0 to 2, player pawns on rows 5 to 7
impl Default for Position {
    fn default() -> Self {
        let mut position = Position::empty();
        for square in playable_squares() {
            position[square] = match square.row() {
                0..=2 => Some(PcPawn),
                5..=7 => Some(PlayerPawn),
                _ => None,
            };
        }
        position
    }
}

impl Position {
    pub fn start_position() -> Self {
        Self::default()
    }

    pub const fn empty() -> Self {
        Position {
            cells: [None; NUM_SQUARES],
        }
    }

    /// Builds a position from `(square, piece)` pairs.
    /// Fails if a piece is placed on a square that cannot hold pieces.
    pub fn from_pieces<I>(pieces: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (Square, Piece)>,
    {
        let mut position = Position::empty();
        for (square, piece) in pieces {
            if !square.is_playable() {
                return Err(format!("{:?} placed on non-playable square {}", piece, square));
            }
            position[square] = Some(piece);
        }
        Ok(position)
    }

    pub fn cells(&self) -> &[Option<Piece>; NUM_SQUARES] {
        &self.cells
    }

    /// Iterates over all occupied squares
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        squares_iterator().filter_map(move |square| self[square].map(|piece| (square, piece)))
    }

    pub fn piece_count(&self, side: Side) -> usize {
        self.pieces().filter(|(_, piece)| piece.side() == side).count()
    }

    /// Total capture value of the side's remaining pieces
    pub fn material(&self, side: Side) -> u32 {
        self.pieces()
            .filter(|(_, piece)| piece.side() == side)
            .map(|(_, piece)| piece.value() as u32)
            .sum()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_WIDTH as u8 {
            for col in 0..BOARD_WIDTH as u8 {
                match self[Square::from_row_col(row, col)] {
                    Some(piece) => write!(f, "{}", piece.to_char())?,
                    None => write!(f, ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        for row in 0..BOARD_WIDTH as u8 {
            write!(f, "{} ", BOARD_WIDTH as u8 - row)?;
            for col in 0..BOARD_WIDTH as u8 {
                match self[Square::from_row_col(row, col)] {
                    Some(piece) => write!(f, "[{}]", piece.to_char())?,
                    None => write!(f, "[ ]")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "   a  b  c  d  e  f  g  h")
    }
}

/// Parses the diagram written by `Display`: eight rows of eight cells, row 0 first
impl FromStr for Position {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != BOARD_WIDTH {
            return Err(format!(
                "Expected {} rows in position, got {}",
                BOARD_WIDTH,
                rows.len()
            ));
        }
        let mut position = Position::empty();
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().collect();
            if cells.len() != BOARD_WIDTH {
                return Err(format!(
                    "Expected {} cells on row {}, got \"{}\"",
                    BOARD_WIDTH, row, line
                ));
            }
            for (col, &ch) in cells.iter().enumerate() {
                let square = Square::from_row_col(row as u8, col as u8);
                if ch == '.' {
                    continue;
                }
                let piece = Piece::from_char(ch)
                    .ok_or_else(|| format!("Unknown piece '{}' on square {}", ch, square))?;
                if !square.is_playable() {
                    return Err(format!("Piece on non-playable square {}", square));
                }
                position[square] = Some(piece);
            }
        }
        Ok(position)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let diagram = String::deserialize(deserializer)?;
        diagram.parse().map_err(serde::de::Error::custom)
    }
}
