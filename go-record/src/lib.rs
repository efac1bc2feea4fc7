pub mod board;
pub mod coords;
pub mod error;
pub mod game;
pub mod moves;
pub mod sgf;
pub mod stone;

/// A board intersection as `(col, row)`, origin at the top-left.
pub type Point = (u8, u8);

pub use board::{Board, BoardState, Captures, Placed};
pub use error::GoError;
pub use game::{DEFAULT_BOARD_SIZE, Game, MAX_BOARD_SIZE, MIN_BOARD_SIZE};
pub use moves::{Move, Vertex};
pub use sgf::{SgfError, SgfTree};
pub use stone::Stone;
