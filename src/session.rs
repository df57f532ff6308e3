//! Session policy: which level is played next, how often it may be restarted,
//! and an in-memory log of what the player did.
//!
//! None of this affects move legality; the session only drives a [`Game`]
//! through its public operations.

use crate::board::{Direction, Position};
use crate::game::{Game, MoveOutcome};
use crate::level::LevelError;
use crate::levels::Levels;
use crate::rules::Push;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelOrder {
    #[default]
    Sequential,
    Shuffled,
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub order: LevelOrder,
    /// Seed for shuffling. A random one is drawn when absent.
    pub seed: Option<u64>,
    /// Restarts allowed per level visit. Unlimited when absent.
    pub max_restarts: Option<u32>,
    /// Number of leading levels played as practice before the main stage.
    pub practice_levels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Practice,
    Main,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Practice => write!(f, "practice"),
            Stage::Main => write!(f, "main"),
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Level(LevelError),
    RestartLimitReached { limit: u32 },
    NoPreviousLevel,
    /// There is no level after the current one.
    Finished,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Level(err) => write!(f, "{}", err),
            SessionError::RestartLimitReached { limit } => {
                write!(f, "Restart limit of {} reached for this level", limit)
            }
            SessionError::NoPreviousLevel => write!(f, "Already at the first level"),
            SessionError::Finished => write!(f, "No more levels in this session"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Level(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LevelError> for SessionError {
    fn from(err: LevelError) -> Self {
        SessionError::Level(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Restart,
    Move(Direction),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start => write!(f, "start"),
            Action::Restart => write!(f, "restart"),
            Action::Move(dir) => write!(f, "{}", dir),
        }
    }
}

/// One entry of the session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Index of the level in the collection.
    pub level: usize,
    pub action: Action,
    /// Player position after the action.
    pub player: Position,
    pub push: Option<Push>,
    /// Move counter after the action.
    pub moves: usize,
    /// Time since the session started.
    pub elapsed: Duration,
}

/// Per-level totals, indexed by play order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelStats {
    pub level: usize,
    pub visits: u32,
    pub restarts: u32,
    /// Accepted moves over all attempts.
    pub total_moves: usize,
    /// Moves of the attempt that solved the level.
    pub solved_in: Option<usize>,
}

pub struct Session {
    levels: Levels,
    config: SessionConfig,
    seed: u64,
    order: Vec<usize>,
    practice: usize,
    cursor: usize,
    game: Game,
    restarts: u32,
    stats: Vec<LevelStats>,
    history: Vec<ActionRecord>,
    started: Instant,
}

impl Session {
    /// Start a session at the first level of the play order.
    pub fn new(levels: Levels, config: SessionConfig) -> Result<Self, SessionError> {
        let first = levels.get(0)?.clone();
        let seed = config.seed.unwrap_or_else(rand::random);
        let practice = config.practice_levels.min(levels.len());

        let mut order: Vec<usize> = (0..levels.len()).collect();
        if config.order == LevelOrder::Shuffled {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            order[..practice].shuffle(&mut rng);
            order[practice..].shuffle(&mut rng);
        }
        info!(seed, order = ?order, practice, "session created");

        let stats = order
            .iter()
            .map(|&level| LevelStats {
                level,
                ..LevelStats::default()
            })
            .collect();

        let mut session = Session {
            levels,
            config,
            seed,
            order,
            practice,
            cursor: 0,
            game: Game::new(first),
            restarts: 0,
            stats,
            history: Vec::new(),
            started: Instant::now(),
        };
        session.select(0)?;
        Ok(session)
    }

    fn record(&mut self, action: Action, push: Option<Push>) {
        self.history.push(ActionRecord {
            level: self.level_index(),
            action,
            player: self.game.player(),
            push,
            moves: self.game.moves(),
            elapsed: self.started.elapsed(),
        });
    }

    /// Jump to a position in the play order (0-indexed).
    pub fn select(&mut self, position: usize) -> Result<(), SessionError> {
        let Some(&index) = self.order.get(position) else {
            return Err(LevelError::NotFound {
                index: position,
                len: self.order.len(),
            }
            .into());
        };
        let level = self.levels.get(index)?.clone();

        self.cursor = position;
        self.game = Game::new(level);
        self.restarts = 0;
        self.stats[position].visits += 1;
        info!(
            position,
            level = index,
            stage = %self.stage(),
            title = self.levels.title(index).unwrap_or(""),
            "level loaded"
        );
        self.record(Action::Start, None);
        Ok(())
    }

    pub fn next_level(&mut self) -> Result<(), SessionError> {
        if self.cursor + 1 >= self.order.len() {
            return Err(SessionError::Finished);
        }
        self.select(self.cursor + 1)
    }

    pub fn previous_level(&mut self) -> Result<(), SessionError> {
        if self.cursor == 0 {
            return Err(SessionError::NoPreviousLevel);
        }
        self.select(self.cursor - 1)
    }

    /// Reset the current level. Fails once the restart limit for this visit
    /// is used up; the game is left as it was.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if let Some(limit) = self.config.max_restarts {
            if self.restarts >= limit {
                warn!(limit, position = self.cursor, "restart limit reached");
                return Err(SessionError::RestartLimitReached { limit });
            }
        }
        self.game.reset();
        self.restarts += 1;
        self.stats[self.cursor].restarts += 1;
        self.record(Action::Restart, None);
        Ok(())
    }

    /// Forward a move to the game. Rejected moves leave no trace.
    pub fn apply_move(&mut self, dir: Direction) -> MoveOutcome {
        let outcome = self.game.apply_move(dir);
        if let MoveOutcome::Moved { push, solved, .. } = outcome {
            let stats = &mut self.stats[self.cursor];
            stats.total_moves += 1;
            if solved {
                stats.solved_in = Some(self.game.moves());
            }
            self.record(Action::Move(dir), push);
            if self.is_complete() {
                info!(levels = self.order.len(), "session complete");
            }
        }
        outcome
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Current position in the play order.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Index in the collection of the level being played.
    pub fn level_index(&self) -> usize {
        self.order[self.cursor]
    }

    pub fn title(&self) -> Option<&str> {
        self.levels.title(self.level_index())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stage(&self) -> Stage {
        if self.cursor < self.practice {
            Stage::Practice
        } else {
            Stage::Main
        }
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn restarts_remaining(&self) -> Option<u32> {
        self.config
            .max_restarts
            .map(|limit| limit.saturating_sub(self.restarts))
    }

    /// True once the last level of the play order is solved.
    pub fn is_complete(&self) -> bool {
        self.cursor + 1 == self.order.len() && self.game.is_solved()
    }

    pub fn stats(&self) -> &[LevelStats] {
        &self.stats
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }
}
