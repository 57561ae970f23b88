use crate::map::{Direction, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Rat(Direction),
    Missile,
}

/// Drawing surface owned by the host. The registry erases stale cells,
/// then draws every rat, missile and scoreboard row.
pub trait Canvas {
    fn erase(&mut self, pos: Position);
    fn draw(&mut self, pos: Position, glyph: Glyph);
    fn score(&mut self, index: usize, name: &str, score: i32);
}
