//! Move legality and game status.
//!
//! Two kinds of move exist, chosen by what stands on the source cell:
//!
//! - a bare mover makes an L-shaped step onto an empty cell;
//! - a mover carrying the ball cannot step, but passes the ball along a row,
//!   column or diagonal to another mover of its side, provided no opposing
//!   piece stands in between.
//!
//! Illegal moves are reported as [`MoveError`] values and leave the board
//! untouched.

use std::fmt;

use thiserror::Error;

use crate::board::{Board, Color, Pos};
use crate::constants::{KNIGHT_STEPS, MAX_GOAL_DISTANCE};

/// A move from one cell to another.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
}

impl Move {
    pub const fn new(from: Pos, to: Pos) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// What an applied move did. Needed to undo it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveKind {
    /// A mover stepped to an empty cell.
    Step,
    /// The ball was passed to another mover.
    Pass,
}

/// Outcome of [`Board::status`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    InProgress,
    Won(Color),
}

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("{0} is off the board")]
    OutOfBounds(Pos),
    #[error("no piece on {0}")]
    EmptySource(Pos),
    #[error("the piece on {0} belongs to the other side")]
    NotYourPiece(Pos),
    #[error("a mover can only make an L-shaped step")]
    NotAKnightStep,
    #[error("the ball only travels along a row, column or diagonal")]
    NotALine,
    #[error("{0} is occupied")]
    Occupied(Pos),
    #[error("no friendly mover on {0} to receive the ball")]
    NoReceiver(Pos),
    #[error("the pass is blocked by an opposing piece on {0}")]
    Blocked(Pos),
    #[error("the game is already over")]
    GameOver,
}

impl Board {
    /// `Won(color)` once a side's ball carrier stands on its goal row.
    pub fn status(&self) -> Status {
        self.players()
            .iter()
            .find(|player| player.ball().y == player.color().goal_row())
            .map_or(Status::InProgress, |player| Status::Won(player.color()))
    }

    /// Check `mv` for the side to move without applying it.
    pub fn check_move(&self, mv: Move) -> Result<MoveKind, MoveError> {
        if self.status() != Status::InProgress {
            return Err(MoveError::GameOver);
        }
        self.check_move_for(mv, self.current())
    }

    /// Apply `mv` for the side to move. The turn is not switched.
    pub fn make_move(&mut self, mv: Move) -> Result<MoveKind, MoveError> {
        let kind = self.check_move(mv)?;
        self.relocate(mv.from, mv.to, kind);
        Ok(kind)
    }

    /// Revert a move previously applied with [`Board::make_move`].
    pub fn undo_move(&mut self, mv: Move, kind: MoveKind) {
        self.relocate(mv.to, mv.from, kind);
    }

    fn relocate(&mut self, from: Pos, to: Pos, kind: MoveKind) {
        match kind {
            MoveKind::Step => {
                if let Some(piece) = self.cell_mut(from).take_mover() {
                    self.cell_mut(to).put_mover(piece);
                    self.player_mut(piece.color()).relocate_mover(from, to);
                }
            }
            MoveKind::Pass => {
                if let Some(ball) = self.cell_mut(from).take_ball() {
                    self.cell_mut(to).put_ball(ball);
                    self.player_mut(ball.color()).set_ball(to);
                }
            }
        }
    }

    fn check_move_for(&self, mv: Move, color: Color) -> Result<MoveKind, MoveError> {
        for pos in [mv.from, mv.to] {
            if !pos.in_bounds() {
                return Err(MoveError::OutOfBounds(pos));
            }
        }
        let source = self.cell(mv.from);
        match source.owner() {
            None => Err(MoveError::EmptySource(mv.from)),
            Some(owner) if owner != color => Err(MoveError::NotYourPiece(mv.from)),
            Some(_) if source.has_ball() => self.check_pass(mv, color).map(|()| MoveKind::Pass),
            Some(_) => self.check_step(mv).map(|()| MoveKind::Step),
        }
    }

    fn check_step(&self, mv: Move) -> Result<(), MoveError> {
        let dx = mv.from.x.abs_diff(mv.to.x);
        let dy = mv.from.y.abs_diff(mv.to.y);
        if !matches!((dx, dy), (1, 2) | (2, 1)) {
            return Err(MoveError::NotAKnightStep);
        }
        if !self.cell(mv.to).is_empty() {
            return Err(MoveError::Occupied(mv.to));
        }
        Ok(())
    }

    fn check_pass(&self, mv: Move, color: Color) -> Result<(), MoveError> {
        let dx = mv.to.x as isize - mv.from.x as isize;
        let dy = mv.to.y as isize - mv.from.y as isize;
        let straight = (dx == 0) != (dy == 0);
        let diagonal = dx != 0 && dx.abs() == dy.abs();
        if !straight && !diagonal {
            return Err(MoveError::NotALine);
        }
        if self.cell(mv.to).owner() != Some(color) {
            return Err(MoveError::NoReceiver(mv.to));
        }

        let (step_x, step_y) = (dx.signum(), dy.signum());
        let mut pos = mv.from;
        while let Some(next) = pos.offset(step_x, step_y) {
            if next == mv.to {
                break;
            }
            if self.cell(next).pieces().any(|piece| piece.color() != color) {
                return Err(MoveError::Blocked(next));
            }
            pos = next;
        }
        Ok(())
    }

    /// Destinations the piece on `pos` may move to.
    ///
    /// A bare mover yields its legal L-shaped steps; a ball carrier yields
    /// the cells of its side's movers it can pass to. Legality is judged for
    /// the owner of the piece, whoever is to move.
    pub fn available_positions(&self, pos: Pos) -> Vec<Pos> {
        let Some(cell) = self.get(pos) else {
            return Vec::new();
        };
        let Some(owner) = cell.owner() else {
            return Vec::new();
        };

        if cell.has_ball() {
            self.player(owner)
                .movers()
                .iter()
                .copied()
                .filter(|&to| to != pos && self.check_pass(Move::new(pos, to), owner).is_ok())
                .collect()
        } else {
            KNIGHT_STEPS
                .iter()
                .filter_map(|&(dx, dy)| pos.offset(dx, dy))
                .filter(|&to| self.check_step(Move::new(pos, to)).is_ok())
                .collect()
        }
    }

    /// Every legal move of the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.status() != Status::InProgress {
            return Vec::new();
        }
        self.current_player()
            .movers()
            .iter()
            .flat_map(|&from| {
                self.available_positions(from)
                    .into_iter()
                    .map(move |to| Move::new(from, to))
            })
            .collect()
    }

    /// Rows between `pos` and `color`'s goal row, plus one for every
    /// occupied cell strictly between them in the same column.
    ///
    /// An off-board `pos` is `MAX_GOAL_DISTANCE` away.
    pub fn distance_to_goal(&self, pos: Pos, color: Color) -> u32 {
        if !pos.in_bounds() {
            return MAX_GOAL_DISTANCE;
        }
        let goal = color.goal_row();
        if pos.y == goal {
            return 0;
        }
        let (low, high) = if pos.y < goal { (pos.y, goal) } else { (goal, pos.y) };
        let obstructions = (low + 1..high)
            .filter(|&y| !self.cell(Pos::new(pos.x, y)).is_empty())
            .count();
        (high - low + obstructions) as u32
    }

    /// A pass that puts `color`'s ball on its goal row, if one exists.
    pub fn winning_move(&self, color: Color) -> Option<Move> {
        let goal = color.goal_row();
        let ball = self.player(color).ball();
        self.available_positions(ball)
            .into_iter()
            .find(|pos| pos.y == goal)
            .map(|to| Move::new(ball, to))
    }

    /// Whether `color`'s ball carrier can pass onto its goal row right now.
    pub fn can_win_in_one(&self, color: Color) -> bool {
        self.winning_move(color).is_some()
    }

    /// Whether the side not to move could win with its next move.
    ///
    /// Equivalent to handing the turn over, asking, and handing it back,
    /// without touching the board.
    pub fn can_opponent_win_next_move(&self) -> bool {
        self.can_win_in_one(self.current().opponent())
    }
}
