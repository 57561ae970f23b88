mod cell;
mod grid;

pub use cell::{Direction, MAX_COORD, Position};
pub use grid::Maze;
