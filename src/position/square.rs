use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Direction::{self, *};

pub const BOARD_WIDTH: usize = 8;
pub const NUM_SQUARES: usize = BOARD_WIDTH * BOARD_WIDTH;

/// A location on the board. Can be used to index a `Position`.
///
/// Row 0 is the computer's back row, row 7 is the player's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Square {
    inner: u8,
}

impl Square {
    pub const fn from_u8(inner: u8) -> Self {
        assert!((inner as usize) < NUM_SQUARES);
        Square { inner }
    }

    /// Returns `None` for indices outside the board.
    pub fn from_index(index: usize) -> Option<Self> {
        if index < NUM_SQUARES {
            Some(Square { inner: index as u8 })
        } else {
            None
        }
    }

    pub const fn from_row_col(row: u8, col: u8) -> Self {
        assert!(row < BOARD_WIDTH as u8 && col < BOARD_WIDTH as u8);
        Square::from_u8(row * BOARD_WIDTH as u8 + col)
    }

    pub const fn into_inner(self) -> u8 {
        self.inner
    }

    pub const fn index(self) -> usize {
        self.inner as usize
    }

    pub const fn row(self) -> u8 {
        self.inner / BOARD_WIDTH as u8
    }

    pub const fn col(self) -> u8 {
        self.inner % BOARD_WIDTH as u8
    }

    /// Pieces only ever stand on one diagonal colour of the board.
    pub const fn is_playable(self) -> bool {
        (self.row() + self.col()) % 2 == 0
    }

    pub fn go_direction(self, direction: Direction) -> Option<Self> {
        let row = self.row() as i8 + direction.row_offset();
        let col = self.col() as i8 + direction.col_offset();
        if (0..BOARD_WIDTH as i8).contains(&row) && (0..BOARD_WIDTH as i8).contains(&col) {
            Some(Square::from_row_col(row as u8, col as u8))
        } else {
            None
        }
    }

    pub fn parse(input: &str) -> Result<Self, String> {
        input.parse()
    }
}

/// Iterates over all 64 squares, in index order
pub fn squares_iterator() -> impl Iterator<Item = Square> {
    (0..NUM_SQUARES as u8).map(Square::from_u8)
}

/// Iterates over the 32 squares pieces can stand on
pub fn playable_squares() -> impl Iterator<Item = Square> {
    squares_iterator().filter(|square| square.is_playable())
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.col()) as char,
            BOARD_WIDTH as u8 - self.row()
        )
    }
}

/// Accepts either algebraic notation (`c3`) or a raw board index (`42`)
impl FromStr for Square {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if let Ok(index) = input.parse::<usize>() {
            return Square::from_index(index)
                .ok_or_else(|| format!("Square index {} is outside the board", index));
        }
        let mut chars = input.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file @ 'a'..='h'), Some(rank @ '1'..='8'), None) => {
                let col = file as u8 - b'a';
                let row = BOARD_WIDTH as u8 - (rank as u8 - b'0');
                Ok(Square::from_row_col(row, col))
            }
            _ => Err(format!("Couldn't parse square \"{}\"", input)),
        }
    }
}

impl Direction {
    pub const fn row_offset(self) -> i8 {
        match self {
            NorthWest | NorthEast => -1,
            SouthWest | SouthEast => 1,
        }
    }

    pub const fn col_offset(self) -> i8 {
        match self {
            NorthWest | SouthWest => -1,
            NorthEast | SouthEast => 1,
        }
    }
}
