use rand::Rng;

use super::cell::{Direction, Position};

const RANDOM_PROBES: usize = 64;

/// Immutable wall/open grid. Cells outside the grid count as walls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: u16,
    height: u16,
    walls: Vec<bool>,
}

impl Maze {
    pub fn open(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            walls: vec![false; width as usize * height as usize],
        }
    }

    pub fn bordered(width: u16, height: u16) -> Self {
        let mut maze = Self::open(width, height);
        for x in 0..width {
            for y in 0..height {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    maze.set_wall(x, y);
                }
            }
        }
        maze
    }

    /// Builds a maze from text. `rows[x]` holds the cells of column `x`,
    /// indexed by `y`; `*` marks a wall, anything else is open.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.len() as u16;
        let height = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u16;
        let mut maze = Self::open(width, height);
        for (x, row) in rows.iter().enumerate() {
            for (y, c) in row.chars().enumerate() {
                if c == '*' {
                    maze.set_wall(x as u16, y as u16);
                }
            }
        }
        maze
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) => self.walls[i],
            None => true,
        }
    }

    pub fn is_open(&self, pos: Position) -> bool {
        !self.is_wall(pos)
    }

    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width)
            .flat_map(move |x| (0..self.height).map(move |y| Position::new(x, y)))
            .filter(|pos| self.is_open(*pos))
    }

    /// Picks a random open cell for which `occupied` is false. Falls back to
    /// a full scan once random probing gives up, so a crowded maze still
    /// finds its last free cell.
    pub fn random_open_cell<R, F>(&self, rng: &mut R, occupied: F) -> Option<Position>
    where
        R: Rng + ?Sized,
        F: Fn(Position) -> bool,
    {
        if self.width == 0 || self.height == 0 {
            return None;
        }

        for _ in 0..RANDOM_PROBES {
            let pos = Position::new(
                rng.gen_range(0..self.width),
                rng.gen_range(0..self.height),
            );
            if self.is_open(pos) && !occupied(pos) {
                return Some(pos);
            }
        }

        let free: Vec<Position> = self.open_cells().filter(|pos| !occupied(*pos)).collect();
        if free.is_empty() {
            None
        } else {
            Some(free[rng.gen_range(0..free.len())])
        }
    }

    /// Heading that avoids staring at a wall from `pos`. The last open
    /// neighbour in north, south, east, west order wins.
    pub fn facing_open(&self, pos: Position) -> Direction {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.is_open(pos.step(*dir)))
            .last()
            .unwrap_or_default()
    }

    fn set_wall(&mut self, x: u16, y: u16) {
        if let Some(i) = self.index(Position::new(x, y)) {
            self.walls[i] = true;
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.x as usize * self.height as usize + pos.y as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn out_of_range_is_wall() {
        let maze = Maze::open(4, 4);
        assert!(maze.is_open(Position::new(3, 3)));
        assert!(maze.is_wall(Position::new(4, 1)));
        assert!(maze.is_wall(Position::new(1, 4)));
    }

    #[test]
    fn rows_index_by_x_then_y() {
        let maze = Maze::from_rows(&["***", "* .", "***"]);
        assert_eq!(maze.width(), 3);
        assert_eq!(maze.height(), 3);
        assert!(maze.is_open(Position::new(1, 1)));
        assert!(maze.is_open(Position::new(1, 2)));
        assert!(maze.is_wall(Position::new(1, 0)));
    }

    #[test]
    fn bordered_has_walled_edges() {
        let maze = Maze::bordered(5, 5);
        assert!(maze.is_wall(Position::new(0, 2)));
        assert!(maze.is_wall(Position::new(4, 2)));
        assert!(maze.is_open(Position::new(2, 2)));
        assert_eq!(maze.open_cells().count(), 9);
    }

    #[test]
    fn random_cell_skips_occupied() {
        let maze = Maze::from_rows(&["****", "*..*", "****"]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let taken = Position::new(1, 1);

        for _ in 0..20 {
            let pos = maze.random_open_cell(&mut rng, |p| p == taken).unwrap();
            assert_eq!(pos, Position::new(1, 2));
        }

        assert!(
            maze.random_open_cell(&mut rng, |p| p.x == 1)
                .is_none()
        );
    }

    #[test]
    fn facing_open_avoids_walls() {
        let maze = Maze::from_rows(&["***", "*.*", "*.*", "***"]);
        assert_eq!(maze.facing_open(Position::new(1, 1)), Direction::North);
        assert_eq!(maze.facing_open(Position::new(2, 1)), Direction::South);
    }
}
