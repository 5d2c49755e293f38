//! Search state: a board snapshot plus the statistics MCTS keeps about it.

use crate::board::{Board, Color, Pos};
use crate::constants::LOSS_SENTINEL;
use crate::rules::Move;

/// A position in the search tree.
///
/// `player` is the side the move into this position is attributed to; a
/// simulated win for that side adds to `win_score`, a loss subtracts.
#[derive(Clone, Debug)]
pub struct State {
    board: Board,
    player: Color,
    visit_count: u32,
    win_score: f64,
}

impl State {
    pub fn new(board: Board, player: Color) -> Self {
        Self {
            board,
            player,
            visit_count: 0,
            win_score: 0.0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    pub fn player(&self) -> Color {
        self.player
    }

    pub fn opponent(&self) -> Color {
        self.player.opponent()
    }

    pub fn switch_player(&mut self) {
        self.player = self.player.opponent();
    }

    pub fn visit_count(&self) -> u32 {
        self.visit_count
    }

    pub fn win_score(&self) -> f64 {
        self.win_score
    }

    pub fn increment_visit(&mut self) {
        self.visit_count += 1;
    }

    /// Add `delta` to the score. A score marked lost stays lost.
    pub fn add_score(&mut self, delta: f64) {
        if !self.is_lost() {
            self.win_score += delta;
        }
    }

    /// Pin the score to the loss sentinel for good.
    pub fn mark_lost(&mut self) {
        self.win_score = LOSS_SENTINEL;
    }

    pub fn is_lost(&self) -> bool {
        self.win_score == LOSS_SENTINEL
    }

    /// Every state reachable by moving the piece on `pos`.
    ///
    /// Each child board has the move applied and the turn handed over, and
    /// is attributed to this state's opponent. Moves the side to move may
    /// not make are skipped.
    pub fn all_possible_states(&self, pos: Pos) -> Vec<(Move, State)> {
        self.board
            .available_positions(pos)
            .into_iter()
            .filter_map(|to| {
                let mv = Move::new(pos, to);
                let mut board = self.board.clone();
                board.make_move(mv).ok()?;
                board.switch_turn();
                Some((mv, State::new(board, self.opponent())))
            })
            .collect()
    }
}
