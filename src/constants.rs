//! Constants for board geometry, piece numbering and search parameters.
//!
//! The board is a fixed 7x8 grid addressed as `(x, y)` with `x` the column
//! and `y` the row. Row 0 is Black's home row and White's goal; row 7 is
//! White's home row and Black's goal.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of columns.
pub const WIDTH: usize = 7;

/// Number of rows.
pub const HEIGHT: usize = 8;

/// Movers owned by each side.
pub const MOVERS_PER_SIDE: usize = 5;

/// Column the ball starts on (the center of the home row).
pub const BALL_START_COLUMN: usize = WIDTH / 2;

/// Largest value `distance_to_goal` can return: every row to cross plus an
/// obstruction on every intermediate cell of the column.
pub const MAX_GOAL_DISTANCE: u32 = (HEIGHT - 1) as u32 + (HEIGHT - 2) as u32;

// =============================================================================
// Piece Numbering
// =============================================================================

/// Id of White's first mover. White movers are numbered 1..=5.
pub const WHITE_FIRST_MOVER_ID: u8 = 1;

/// Id of White's ball.
pub const WHITE_BALL_ID: u8 = 6;

/// Id of Black's first mover. Black movers are numbered 7..=11.
pub const BLACK_FIRST_MOVER_ID: u8 = 7;

/// Id of Black's ball.
pub const BLACK_BALL_ID: u8 = 12;

// =============================================================================
// Move Geometry
// =============================================================================

/// The eight L-shaped mover steps as `(dx, dy)`.
pub const KNIGHT_STEPS: [(isize, isize); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

// =============================================================================
// Evaluation
// =============================================================================

/// Score added (or subtracted) per simulated game outcome.
pub const WIN_SCORE: i32 = 10;

/// An opponent mover within this many rows of its goal row puts the
/// evaluator on defence.
pub const DEFENSIVE_DISTANCE: usize = 3;

/// Evaluation multiplier when the opponent is far from its goal.
pub const OFFENSIVE_MULTIPLIER: i32 = 10;

/// Evaluation of a position where the side to move can score (negated
/// when the opponent can). Above every positional evaluation.
pub const WIN_EVALUATION: i32 = (MAX_GOAL_DISTANCE as i32 + 1) * OFFENSIVE_MULTIPLIER + WIN_SCORE;

/// Evaluation multiplier when the opponent is near its goal.
pub const DEFENSIVE_MULTIPLIER: i32 = 2;

/// Evaluations above this favour keeping a strong ball position.
pub const PASS_THRESHOLD: i32 = 10;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCT exploration constant.
pub const UCT_C: f64 = 1.41;

/// UCT value of a node that has never been visited.
pub const UNVISITED_UCT: f64 = f64::MAX;

/// Score written onto a node whose position was found already lost.
pub const LOSS_SENTINEL: f64 = f64::MIN;

/// Milliseconds of search per unit of `2 * (level - 1) + 1`.
pub const LEVEL_TIME_UNIT_MS: u64 = 60;

/// Difficulty level used when none is given.
pub const DEFAULT_LEVEL: u32 = 3;

/// Plies after which a rollout is abandoned without a winner.
pub const MAX_ROLLOUT_PLIES: usize = 200;
