use std::fmt;

pub const MAX_COORD: u16 = 0x7fff;

/// Compass heading of a rat or missile. "North" is increasing x and "east"
/// is increasing y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0,
    South = 1,
    East = 2,
    West = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::North),
            1 => Some(Self::South),
            2 => Some(Self::East),
            3 => Some(Self::West),
            _ => None,
        }
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn about_face(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }

    pub fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::South => Self::East,
            Self::East => Self::North,
            Self::West => Self::South,
        }
    }

    pub fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::South => Self::West,
            Self::East => Self::South,
            Self::West => Self::North,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub const fn new(x: u16, y: u16) -> Self {
        Self {
            x: x & MAX_COORD,
            y: y & MAX_COORD,
        }
    }

    /// One cell in `dir`. Coordinates wrap inside the 15-bit wire range, so
    /// stepping off the low edge lands far outside any maze.
    pub fn step(self, dir: Direction) -> Self {
        match dir {
            Direction::North => Self::new(self.x.wrapping_add(1), self.y),
            Direction::South => Self::new(self.x.wrapping_sub(1), self.y),
            Direction::East => Self::new(self.x, self.y.wrapping_add(1)),
            Direction::West => Self::new(self.x, self.y.wrapping_sub(1)),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_tables_are_consistent() {
        for dir in Direction::ALL {
            assert_eq!(dir.about_face().about_face(), dir);
            assert_eq!(dir.left().right(), dir);
            assert_eq!(dir.left().left(), dir.about_face());
        }
    }

    #[test]
    fn north_is_positive_x() {
        let pos = Position::new(3, 3);
        assert_eq!(pos.step(Direction::North), Position::new(4, 3));
        assert_eq!(pos.step(Direction::South), Position::new(2, 3));
        assert_eq!(pos.step(Direction::East), Position::new(3, 4));
        assert_eq!(pos.step(Direction::West), Position::new(3, 2));
    }

    #[test]
    fn step_wraps_inside_wire_range() {
        let pos = Position::new(0, 0);
        assert_eq!(pos.step(Direction::South).x, MAX_COORD);
        assert_eq!(pos.step(Direction::West).y, MAX_COORD);
    }
}
