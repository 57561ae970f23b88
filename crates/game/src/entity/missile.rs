use std::time::{Duration, Instant};

use crate::map::{Direction, Position};
use crate::simulation::{Clock, Countdown};

/// A projectile stepping one cell per advance interval. It knows nothing
/// about walls; the owning rat destroys it on impact.
#[derive(Debug, Clone)]
pub struct Missile {
    position: Position,
    direction: Direction,
    wipe: Position,
    advance: Countdown,
    clock: Clock,
}

impl Missile {
    pub fn new(position: Position, direction: Direction, interval: Duration, now: Instant) -> Self {
        Self {
            position,
            direction,
            wipe: position,
            advance: Countdown::new(interval),
            clock: Clock::new(now),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Last drawn cell, erased before the next draw.
    pub fn wipe_position(&self) -> Position {
        self.wipe
    }

    pub fn posdir(&self) -> (Position, Direction) {
        (self.position, self.direction)
    }

    #[inline]
    pub fn occupies(&self, pos: Position) -> bool {
        self.position == pos
    }

    /// Moves one cell once the advance interval has lapsed. Returns whether
    /// the missile moved. Missed intervals are not caught up.
    pub fn update(&mut self, now: Instant) -> bool {
        let delta = self.clock.delta(now);
        if !self.advance.poll(delta) {
            return false;
        }

        self.wipe = self.position;
        self.position = self.position.step(self.direction);
        true
    }

    pub(crate) fn settle(&mut self) {
        self.wipe = self.position;
    }

    /// Overwrites position and heading from a peer's STATE report.
    pub fn set_posdir(&mut self, position: Position, direction: Direction) {
        if position != self.position {
            self.wipe = self.position;
            self.position = position;
        }
        self.direction = direction;
    }
}
