//! Move rules, independent of any game session.
//!
//! These functions never mutate their inputs. [`crate::game::Game`] builds
//! on [`plan_move`] to update its live state in place.

use crate::board::{Board, Direction, Position, Tile};
use crate::level::{BoxId, State};

/// A box displaced by a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Push {
    pub box_id: BoxId,
    pub from: Position,
    pub to: Position,
}

/// The effect a legal move would have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMove {
    pub direction: Direction,
    pub player_to: Position,
    pub push: Option<Push>,
}

impl PlannedMove {
    pub(crate) fn apply_to(&self, state: &mut State) {
        state.player = self.player_to;
        if let Some(push) = self.push {
            state.boxes[push.box_id.0] = push.to;
        }
    }
}

fn is_open(board: &Board, pos: Position) -> bool {
    matches!(board.tile(pos), Some(Tile::Floor | Tile::Target))
}

/// Work out what moving the player in `dir` would do, or `None` if the move
/// is illegal: the player would leave the board or walk into a wall, or the
/// box in the way is blocked by the edge, a wall or another box.
pub fn plan_move(state: &State, board: &Board, dir: Direction) -> Option<PlannedMove> {
    let target = board.step(state.player, dir)?;
    if !is_open(board, target) {
        return None;
    }

    let push = match state.box_at(target) {
        Some(box_id) => {
            let beyond = board.step(target, dir)?;
            if !is_open(board, beyond) || state.has_box_at(beyond) {
                return None;
            }
            Some(Push {
                box_id,
                from: target,
                to: beyond,
            })
        }
        None => None,
    };

    Some(PlannedMove {
        direction: dir,
        player_to: target,
        push,
    })
}

pub fn is_legal(state: &State, board: &Board, dir: Direction) -> bool {
    plan_move(state, board, dir).is_some()
}

/// Check if every box sits on a target. The player position is irrelevant.
pub fn is_solved(state: &State, board: &Board) -> bool {
    state.boxes.iter().all(|&b| board.is_target(b))
}

/// Apply a move to a copy of `state`.
///
/// An illegal move returns the state unchanged and `false`. Otherwise returns
/// the new state and whether it is solved.
pub fn apply_move(state: &State, board: &Board, dir: Direction) -> (State, bool) {
    match plan_move(state, board, dir) {
        Some(planned) => {
            let mut next = state.clone();
            planned.apply_to(&mut next);
            let solved = is_solved(&next, board);
            (next, solved)
        }
        None => (state.clone(), false),
    }
}
