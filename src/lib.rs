extern crate arrayvec;
extern crate board_game_traits;
extern crate rand;

pub mod match_manager;
pub mod minmax;
pub mod move_gen;
pub mod position;
pub mod search;
mod tests;
