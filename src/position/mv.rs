use std::fmt::Write;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::position::{squares_iterator, Position, Side, Square};

/// A legal move for a position.
///
/// The move is stored as the complete position it results in, including every jump of a
/// capture chain. It does not remember which position it was generated from, so methods that
/// need it take the position before the move as an argument.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Move {
    resulting_position: Position,
    involved_capture: bool,
    captured_value: u8,
}

impl Move {
    pub(crate) fn new(resulting_position: Position, involved_capture: bool, captured_value: u8) -> Self {
        debug_assert!(involved_capture || captured_value == 0);
        Move {
            resulting_position,
            involved_capture,
            captured_value,
        }
    }

    pub fn resulting_position(&self) -> &Position {
        &self.resulting_position
    }

    pub fn into_resulting_position(self) -> Position {
        self.resulting_position
    }

    pub fn involved_capture(&self) -> bool {
        self.involved_capture
    }

    /// Pawns captured count 1, kings 2
    pub fn captured_value(&self) -> u8 {
        self.captured_value
    }

    /// The square the moving piece left.
    /// `None` if a king's capture chain ended on its own starting square.
    pub fn origin(&self, before: &Position, side: Side) -> Option<Square> {
        squares_iterator().find(|&square| {
            before[square].is_some_and(|piece| piece.side() == side)
                && self.resulting_position[square].is_none()
        })
    }

    /// The square the moving piece ended up on
    pub fn destination(&self, before: &Position) -> Option<Square> {
        squares_iterator()
            .find(|&square| before[square].is_none() && self.resulting_position[square].is_some())
    }

    /// Squares whose pieces were removed by this move
    pub fn captured_squares(&self, before: &Position, side: Side) -> Vec<Square> {
        squares_iterator()
            .filter(|&square| {
                before[square].is_some_and(|piece| piece.side() != side)
                    && self.resulting_position[square].is_none()
            })
            .collect()
    }

    /// Writes the move as `c3-d4`, or `c3xe5` for captures
    pub fn to_string(&self, before: &Position, side: Side) -> String {
        let mut string = String::new();
        match (self.origin(before, side), self.destination(before)) {
            (Some(origin), Some(destination)) => {
                let separator = if self.involved_capture { 'x' } else { '-' };
                write!(string, "{}{}{}", origin, separator, destination).unwrap();
            }
            // A king that captured its way back to its own square
            _ => write!(string, "x{}", self.captured_squares(before, side).len()).unwrap(),
        }
        string
    }
}
