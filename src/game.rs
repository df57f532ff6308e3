use crate::board::{ALL_DIRECTIONS, Board, Direction, Position, Tile};
use crate::level::{BoxId, Level, State};
use crate::rules::{self, PlannedMove, Push};
use arrayvec::ArrayVec;
use std::fmt;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Solved,
}

/// Result of submitting a move to a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move was illegal or the level is already solved. Nothing changed.
    Rejected,
    /// The player moved, pushing at most one box.
    Moved {
        player: Position,
        push: Option<Push>,
        solved: bool,
    },
}

impl MoveOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MoveOutcome::Rejected)
    }

    pub fn solved(&self) -> bool {
        matches!(self, MoveOutcome::Moved { solved: true, .. })
    }
}

/// The live state of one level being played.
///
/// Owns its [`Level`] so that [`Game::reset`] can always restore the exact
/// starting position. Once solved, moves are rejected until the next reset.
#[derive(Debug, Clone)]
pub struct Game {
    level: Level,
    state: State,
    moves: usize,
    status: Status,
}

impl Game {
    pub fn new(level: Level) -> Self {
        let state = level.reset();
        let status = Self::status_of(&state, level.board());
        Game {
            level,
            state,
            moves: 0,
            status,
        }
    }

    fn status_of(state: &State, board: &Board) -> Status {
        if rules::is_solved(state, board) {
            Status::Solved
        } else {
            Status::InProgress
        }
    }

    /// Restore the level's starting position and clear the move counter.
    pub fn reset(&mut self) {
        self.state = self.level.reset();
        self.moves = 0;
        self.status = Self::status_of(&self.state, self.level.board());
        info!(status = ?self.status, "level reset");
    }

    pub fn is_legal(&self, dir: Direction) -> bool {
        self.status == Status::InProgress && rules::is_legal(&self.state, self.board(), dir)
    }

    /// All directions the player could move in right now.
    pub fn legal_moves(&self) -> ArrayVec<Direction, 4> {
        ALL_DIRECTIONS
            .iter()
            .copied()
            .filter(|&dir| self.is_legal(dir))
            .collect()
    }

    /// Move the player one cell in `dir`, pushing a box if one is in the way.
    ///
    /// Illegal moves, and any move after the level is solved, are ignored and
    /// do not count towards the move counter.
    pub fn apply_move(&mut self, dir: Direction) -> MoveOutcome {
        if self.status == Status::Solved {
            trace!(%dir, "move ignored, level already solved");
            return MoveOutcome::Rejected;
        }

        let Some(planned) = rules::plan_move(&self.state, self.level.board(), dir) else {
            trace!(%dir, player = %self.state.player, "move rejected");
            return MoveOutcome::Rejected;
        };

        self.commit(planned)
    }

    fn commit(&mut self, planned: PlannedMove) -> MoveOutcome {
        planned.apply_to(&mut self.state);
        self.moves += 1;
        self.status = Self::status_of(&self.state, self.level.board());
        let solved = self.status == Status::Solved;

        match planned.push {
            Some(push) => debug!(
                dir = %planned.direction,
                player = %planned.player_to,
                box_id = %push.box_id,
                from = %push.from,
                to = %push.to,
                moves = self.moves,
                "push"
            ),
            None => debug!(
                dir = %planned.direction,
                player = %planned.player_to,
                moves = self.moves,
                "walk"
            ),
        }
        if solved {
            info!(moves = self.moves, "level solved");
        }

        MoveOutcome::Moved {
            player: planned.player_to,
            push: planned.push,
            solved,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn board(&self) -> &Board {
        self.level.board()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn player(&self) -> Position {
        self.state.player
    }

    pub fn boxes(&self) -> &[Position] {
        &self.state.boxes
    }

    pub fn box_position(&self, id: BoxId) -> Option<Position> {
        self.state.box_position(id)
    }

    /// Number of accepted moves since the level was loaded or reset.
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_solved(&self) -> bool {
        self.status == Status::Solved
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, tiles) in self.board().rows().enumerate() {
            let mut line = String::with_capacity(tiles.len());
            for (col, &tile) in tiles.iter().enumerate() {
                let pos = Position::new(row, col);
                let ch = if pos == self.state.player {
                    '&'
                } else if self.state.has_box_at(pos) {
                    match tile {
                        Tile::Target => 'X',
                        _ => 'B',
                    }
                } else {
                    match tile {
                        Tile::Wall => '#',
                        Tile::Floor => ' ',
                        Tile::Target => '.',
                    }
                };
                line.push(ch);
            }
            // Trim trailing spaces to match the level text format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(text: &str) -> Game {
        Game::new(Level::from_text(text).unwrap())
    }

    #[test]
    fn test_new_game() {
        let game = game("#####\n\
                         #&B .#\n\
                         #####");
        assert_eq!(game.player(), Position::new(1, 1));
        assert_eq!(game.boxes(), &[Position::new(1, 2)]);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.status(), Status::InProgress);
    }

    #[test]
    fn test_push_into_wall_is_ignored() {
        let mut game = game("#####\n\
                             #&B#.#\n\
                             #####");
        let before = game.state().clone();

        assert!(!game.is_legal(Direction::Right));
        let outcome = game.apply_move(Direction::Right);

        assert!(outcome.is_rejected());
        assert!(!outcome.solved());
        assert_eq!(game.state(), &before);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_solve() {
        let mut game = game("#####\n\
                             #.B&#\n\
                             #   #\n\
                             #####");

        let outcome = game.apply_move(Direction::Left);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                player: Position::new(1, 2),
                push: Some(Push {
                    box_id: BoxId(0),
                    from: Position::new(1, 2),
                    to: Position::new(1, 1),
                }),
                solved: true,
            }
        );
        assert!(game.is_solved());
        assert_eq!(game.moves(), 1);

        // Illegal attempt after solving: still solved.
        let outcome = game.apply_move(Direction::Up);
        assert!(outcome.is_rejected());
        assert!(game.is_solved());
    }

    #[test]
    fn test_solved_is_terminal() {
        let mut game = game("######\n\
                             #.B& #\n\
                             #    #\n\
                             ######");
        assert!(game.apply_move(Direction::Left).solved());
        let frozen = game.state().clone();

        // Down and right would be legal on an unsolved board.
        assert!(game.apply_move(Direction::Down).is_rejected());
        assert!(game.apply_move(Direction::Right).is_rejected());
        assert_eq!(game.state(), &frozen);
        assert_eq!(game.moves(), 1);
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_reset_after_partial_play() {
        let mut game = game("#######\n\
                             #.    #\n\
                             #  B  #\n\
                             #   & #\n\
                             #######");
        let initial = game.level().initial_state().clone();

        assert!(!game.apply_move(Direction::Left).is_rejected());
        assert!(!game.apply_move(Direction::Up).is_rejected());
        assert!(!game.apply_move(Direction::Left).is_rejected());
        assert_eq!(game.moves(), 3);
        assert_ne!(game.state(), &initial);

        game.reset();
        assert_eq!(game.moves(), 0);
        assert_eq!(game.state(), &initial);
        assert_eq!(game.level().initial_state(), &initial);
        assert_eq!(game.status(), Status::InProgress);
    }

    #[test]
    fn test_reset_unlocks_solved_level() {
        let mut game = game("#####\n\
                             #.B&#\n\
                             #####");
        assert!(game.apply_move(Direction::Left).solved());
        game.reset();
        assert!(!game.is_solved());
        assert_eq!(game.boxes(), &[Position::new(1, 2)]);
        assert!(game.apply_move(Direction::Left).solved());
    }

    #[test]
    fn test_solved_at_load() {
        let game = game("#####\n\
                         #&X #\n\
                         #####");
        assert!(game.is_solved());
    }

    #[test]
    fn test_legal_moves() {
        let game = game("#####\n\
                         #&B #\n\
                         #   #\n\
                         #####");
        assert_eq!(
            game.legal_moves().as_slice(),
            &[Direction::Down, Direction::Right]
        );
    }

    #[test]
    fn test_display() {
        let input = "######\n\
                     #.  .#\n\
                     #    #\n\
                     # BX #\n\
                     #&   #\n\
                     ######";
        let game = game(input);
        assert_eq!(game.to_string().trim_end(), input);
    }

    #[test]
    fn test_display_pads_short_rows() {
        let game = game("####\n#&B.#\n####");
        assert_eq!(game.to_string(), "#####\n#&B.#\n#####\n");
    }
}
