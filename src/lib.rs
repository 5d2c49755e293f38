//! Endtrack-Rust: rules and a time-boxed MCTS engine for End of the Track.
//!
//! End of the Track is played on a 7x8 board. Each side has five movers
//! that step like chess knights and one ball, passed between movers along
//! open rows, columns and diagonals. Whoever brings the ball to the far row
//! wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, piece numbering and search parameters
//! - [`board`] - Cells, pieces, players and board diagrams
//! - [`rules`] - Move validation, application and game status
//! - [`state`] - Board snapshots with search statistics
//! - [`tree`] - Arena search tree with backpropagation
//! - [`uct`] - UCT selection
//! - [`playout`] - Static evaluation and guided rollouts
//! - [`mcts`] - The timed search, its clock and background execution
//! - [`console`] - Text protocol for interactive play
//!
//! ## Example
//!
//! ```
//! use endtrack_rust::board::{Board, Color};
//! use endtrack_rust::mcts::{MctsPlayer, SearchConfig};
//!
//! let board = Board::new();
//! let mut player = MctsPlayer::new(SearchConfig::default().with_seed(7));
//! let outcome = player.find_next_move(&board, 1)?;
//! assert_eq!(outcome.board.current(), Color::Black);
//! println!("White plays {}", outcome.chosen);
//! # Ok::<(), endtrack_rust::mcts::SearchError>(())
//! ```

pub mod board;
pub mod console;
pub mod constants;
pub mod mcts;
pub mod playout;
pub mod rules;
pub mod state;
pub mod tree;
pub mod uct;
