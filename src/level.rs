use crate::board::{Board, Position, Tile};
use std::fmt;
use std::io;
use tracing::debug;

/// Error type for level loading and selection.
#[derive(Debug)]
pub enum LevelError {
    /// IO error when reading from file
    Io(io::Error),
    /// Invalid level content
    InvalidLevel(String),
    /// Level selection outside the collection
    NotFound { index: usize, len: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(err) => write!(f, "IO error: {}", err),
            LevelError::InvalidLevel(msg) => write!(f, "Invalid level: {}", msg),
            LevelError::NotFound { index, len } => write!(
                f,
                "Level {} not found (collection contains {} levels)",
                index + 1,
                len
            ),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LevelError {
    fn from(err: io::Error) -> Self {
        LevelError::Io(err)
    }
}

impl From<String> for LevelError {
    fn from(err: String) -> Self {
        LevelError::InvalidLevel(err)
    }
}

/// Identity of a box, assigned in row-major order when the level is loaded.
///
/// Moves never reorder boxes, so an id refers to the same box for the whole
/// life of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(pub usize);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

/// The mutable part of a level: where the player and the boxes are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub(crate) player: Position,
    pub(crate) boxes: Vec<Position>,
}

impl State {
    pub fn new(player: Position, boxes: Vec<Position>) -> Self {
        State { player, boxes }
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Box positions, indexed by [`BoxId`].
    pub fn boxes(&self) -> &[Position] {
        &self.boxes
    }

    pub fn box_count(&self) -> usize {
        self.boxes.len()
    }

    pub fn box_at(&self, pos: Position) -> Option<BoxId> {
        self.boxes.iter().position(|&b| b == pos).map(BoxId)
    }

    pub fn has_box_at(&self, pos: Position) -> bool {
        self.boxes.contains(&pos)
    }

    pub fn box_position(&self, id: BoxId) -> Option<Position> {
        self.boxes.get(id.0).copied()
    }
}

/// A parsed level: the static board plus the state it starts from.
///
/// The initial state is never handed out mutably, so it can be restored any
/// number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    board: Board,
    initial: State,
}

impl Level {
    /// Parse a level from text.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` ` = Floor (empty space)
    /// - `.` = Target
    /// - `B` = Box
    /// - `X` = Box on target
    /// - `&` = Player
    ///
    /// Any other character is floor. Empty rows are skipped, and rows shorter
    /// than the widest row are padded with walls.
    pub fn from_text(text: &str) -> Result<Self, LevelError> {
        let lines: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();

        if lines.is_empty() {
            return Err("Empty level".to_string().into());
        }

        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut rows = Vec::with_capacity(lines.len());
        let mut player = None;
        let mut boxes = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            let padded = line
                .chars()
                .chain(std::iter::repeat('#'))
                .take(width);
            let mut tiles = Vec::with_capacity(width);
            for (col, ch) in padded.enumerate() {
                let pos = Position::new(row, col);
                let tile = match ch {
                    '#' => Tile::Wall,
                    '.' => Tile::Target,
                    'X' => {
                        boxes.push(pos);
                        Tile::Target
                    }
                    'B' => {
                        boxes.push(pos);
                        Tile::Floor
                    }
                    '&' => {
                        if let Some(first) = player {
                            return Err(format!(
                                "Multiple players found at {} and {}",
                                first, pos
                            )
                            .into());
                        }
                        player = Some(pos);
                        Tile::Floor
                    }
                    _ => Tile::Floor,
                };
                tiles.push(tile);
            }
            rows.push(tiles);
        }

        let player = player.ok_or_else(|| "No player found in level".to_string())?;
        let board = Board::from_rows(rows);

        debug!(
            width = board.width(),
            height = board.height(),
            boxes = boxes.len(),
            "parsed level"
        );

        Ok(Level {
            board,
            initial: State { player, boxes },
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    /// A fresh copy of the starting state.
    pub fn reset(&self) -> State {
        self.initial.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_level() {
        let input = "######\n\
                     #.  .#\n\
                     #    #\n\
                     # BB #\n\
                     #&   #\n\
                     ######";
        let level = Level::from_text(input).unwrap();

        assert_eq!(level.board().width(), 6);
        assert_eq!(level.board().height(), 6);
        assert_eq!(level.initial_state().player(), Position::new(4, 1));
        assert_eq!(
            level.initial_state().boxes(),
            &[Position::new(3, 2), Position::new(3, 3)]
        );
        assert_eq!(
            level.board().targets().collect::<Vec<_>>(),
            vec![Position::new(1, 1), Position::new(1, 4)]
        );
    }

    #[test]
    fn test_short_rows_padded_with_walls() {
        let input = "  ####\n\
                     ###  #\n\
                     #& B.##\n\
                     #####";
        let level = Level::from_text(input).unwrap();
        let board = level.board();

        assert_eq!(board.width(), 7);
        assert_eq!(board.height(), 4);
        assert!(board.rows().all(|row| row.len() == 7));
        assert_eq!(board.tile(Position::new(0, 6)), Some(Tile::Wall));
        assert_eq!(board.tile(Position::new(3, 5)), Some(Tile::Wall));
        // Leading spaces stay floor.
        assert_eq!(board.tile(Position::new(0, 0)), Some(Tile::Floor));
    }

    #[test]
    fn test_box_on_target() {
        let input = "#####\n\
                     #&XB.#\n\
                     #####";
        let level = Level::from_text(input).unwrap();

        assert_eq!(level.board().tile(Position::new(1, 2)), Some(Tile::Target));
        assert_eq!(level.board().tile(Position::new(1, 3)), Some(Tile::Floor));
        assert_eq!(level.initial_state().box_at(Position::new(1, 2)), Some(BoxId(0)));
        assert_eq!(level.initial_state().box_at(Position::new(1, 3)), Some(BoxId(1)));
    }

    #[test]
    fn test_unknown_characters_are_floor() {
        let input = "#####\n\
                     #&?$#\n\
                     #####";
        let level = Level::from_text(input).unwrap();
        assert_eq!(level.board().tile(Position::new(1, 2)), Some(Tile::Floor));
        assert_eq!(level.board().tile(Position::new(1, 3)), Some(Tile::Floor));
        assert_eq!(level.initial_state().box_count(), 0);
    }

    #[test]
    fn test_empty_rows_skipped() {
        let input = "\n####\n#&B.#\n\n####\n\n\n";
        let level = Level::from_text(input).unwrap();
        assert_eq!(level.board().height(), 3);
        assert_eq!(level.initial_state().player(), Position::new(1, 1));
    }

    #[test]
    fn test_crlf_line_breaks() {
        let level = Level::from_text("####\r\n#&.#\r\n####\r\n").unwrap();
        assert_eq!(level.board().width(), 4);
        assert_eq!(level.board().tile(Position::new(1, 2)), Some(Tile::Target));
    }

    #[test]
    fn test_no_player() {
        let input = "####\n\
                     #B.#\n\
                     ####";
        let result = Level::from_text(input);
        assert!(matches!(result, Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_multiple_players() {
        let input = "####\n\
                     #&&#\n\
                     ####";
        let result = Level::from_text(input);
        assert!(matches!(result, Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(Level::from_text(""), Err(LevelError::InvalidLevel(_))));
        assert!(matches!(Level::from_text("\n\n"), Err(LevelError::InvalidLevel(_))));
    }

    #[test]
    fn test_reset_returns_copy() {
        let level = Level::from_text("#####\n#&B.#\n#####").unwrap();
        let mut state = level.reset();
        state.player = Position::new(1, 2);
        state.boxes[0] = Position::new(1, 3);
        assert_eq!(level.initial_state().player(), Position::new(1, 1));
        assert_eq!(level.initial_state().boxes(), &[Position::new(1, 2)]);
        assert_eq!(&level.reset(), level.initial_state());
    }
}
