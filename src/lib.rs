//! A box-pushing puzzle engine.
//!
//! [`Level::from_text`] turns a text layout into a static [`Board`] and the
//! starting [`State`]. [`Game`] plays a level: it validates moves, pushes
//! boxes and reports when every box rests on a target. [`Session`] strings
//! several levels together.

pub mod board;
pub mod game;
pub mod level;
pub mod levels;
pub mod rules;
pub mod session;

pub use board::{Board, Direction, Position, Tile};
pub use game::{Game, MoveOutcome, Status};
pub use level::{BoxId, Level, LevelError, State};
pub use levels::Levels;
pub use rules::{Push, apply_move, is_legal, is_solved};
pub use session::{LevelOrder, Session, SessionConfig, SessionError, Stage};
