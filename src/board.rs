use std::fmt;

/// Terrain of a single board cell. Boxes and the player are not tiles; they
/// are positioned on top of the board by [`crate::level::State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {
    Floor,
    Wall,
    Target,
}

impl Tile {
    pub fn is_wall(self) -> bool {
        self == Tile::Wall
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    /// Unit offset as `(row, col)`.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn from_char(ch: char) -> Option<Direction> {
        match ch.to_ascii_lowercase() {
            'w' | 'k' => Some(Direction::Up),
            's' | 'j' => Some(Direction::Down),
            'a' | 'h' => Some(Direction::Left),
            'd' | 'l' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// A board coordinate, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The static part of a level: a rectangular, row-major grid of tiles.
///
/// A board never changes once built. Rows are all `width` tiles long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: Vec<Tile>,
    width: usize,
    height: usize,
}

impl Board {
    /// Build a board from rows of equal length.
    pub(crate) fn from_rows(rows: Vec<Vec<Tile>>) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Board {
            tiles: rows.into_iter().flatten().collect(),
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    /// Tile at `pos`, or `None` when `pos` is off the board.
    pub fn tile(&self, pos: Position) -> Option<Tile> {
        if !self.contains(pos) {
            return None;
        }
        Some(self.tiles[pos.row * self.width + pos.col])
    }

    pub fn is_target(&self, pos: Position) -> bool {
        self.tile(pos) == Some(Tile::Target)
    }

    /// Move from `pos` one cell in `dir`.
    /// Returns `None` if the new position would leave the board.
    pub fn step(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let next = Position {
            row: pos.row.checked_add_signed(dr)?,
            col: pos.col.checked_add_signed(dc)?,
        };
        self.contains(next).then_some(next)
    }

    /// All target positions in row-major order.
    pub fn targets(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &tile)| tile == Tile::Target)
            .map(|(idx, _)| Position::new(idx / self.width, idx % self.width))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.tiles.chunks(self.width.max(1))
    }
}
