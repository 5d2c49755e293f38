//! Time-boxed Monte Carlo Tree Search.
//!
//! One search per call to [`MctsPlayer::find_next_move`]:
//! - a tactical guard first answers an immediate winning threat by the
//!   opponent with a random blocking move, when one exists
//! - otherwise UCT selection, single expansion, a rollout from one random
//!   child and backpropagation repeat until the level's time budget is spent
//! - the most visited root child is played
//!
//! Time comes from an injected [`Clock`] and randomness from an injected
//! `fastrand::Rng`, so a search is reproducible under [`VirtualClock`] and a
//! fixed seed.

use std::cell::Cell;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};
use thiserror::Error;

use crate::board::{Board, Color};
use crate::constants::{LEVEL_TIME_UNIT_MS, MAX_ROLLOUT_PLIES, UCT_C};
use crate::playout::simulate;
use crate::rules::{Move, Status};
use crate::state::State;
use crate::tree::{NodeId, Tree};
use crate::uct::select_promising_node;

// =============================================================================
// Clocks
// =============================================================================

/// Source of elapsed time for the search deadline.
pub trait Clock {
    /// Time elapsed since some fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that moves forward by `step` every time it is read.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    elapsed: Cell<Duration>,
    step: Duration,
}

impl VirtualClock {
    pub fn new(step: Duration) -> Self {
        Self {
            elapsed: Cell::new(Duration::ZERO),
            step,
        }
    }

    /// Total time handed out so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        let now = self.elapsed.get();
        self.elapsed.set(now + self.step);
        now
    }
}

// =============================================================================
// Configuration and results
// =============================================================================

/// Tunable search parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// UCT exploration constant.
    pub exploration: f64,
    /// Plies after which a rollout counts as unfinished.
    pub max_rollout_plies: usize,
    /// Seed for the search's random generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: UCT_C,
            max_rollout_plies: MAX_ROLLOUT_PLIES,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_max_rollout_plies(mut self, plies: usize) -> Self {
        self.max_rollout_plies = plies;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("difficulty level must be at least 1, got {0}")]
    InvalidLevel(u32),
    #[error("the game is already over: {0} won")]
    GameOver(Color),
    #[error("the side to move has no legal move")]
    NoLegalMoves,
    #[error("failed to start the search thread")]
    Spawn(#[from] std::io::Error),
    #[error("the search thread panicked")]
    WorkerPanicked,
}

/// How the move was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Picked by the tactical guard to stop a one-move loss.
    Guarded,
    /// Picked by the timed tree search.
    Searched,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Board after the chosen move, with the other side to move.
    pub board: Board,
    pub chosen: Move,
    pub mode: SearchMode,
    pub iterations: u64,
    /// Visits of the root when the move was picked.
    pub root_visits: u32,
    /// Size of the tree when the move was picked.
    pub tree_nodes: usize,
}

/// Search time for a difficulty level: `60 ms * (2 * (level - 1) + 1)`.
pub fn time_budget(level: u32) -> Result<Duration, SearchError> {
    if level == 0 {
        return Err(SearchError::InvalidLevel(level));
    }
    let units = 2 * (u64::from(level) - 1) + 1;
    Ok(Duration::from_millis(LEVEL_TIME_UNIT_MS * units))
}

// =============================================================================
// Engine
// =============================================================================

/// Generate the children of `id`, once.
///
/// Every legal move of the side to move on the node's board becomes a
/// child. Finished games are never expanded.
pub fn expand(tree: &mut Tree, id: NodeId) {
    let node = tree.get(id);
    if node.expanded || node.state.board().status() != Status::InProgress {
        return;
    }

    let movers = *node.state.board().current_player().movers();
    let children: Vec<(Move, State)> = movers
        .iter()
        .flat_map(|&pos| node.state.all_possible_states(pos))
        .collect();

    for (mv, state) in children {
        tree.add_child(id, state, mv);
    }
    tree.get_mut(id).expanded = true;
}

pub struct MctsPlayer<C: Clock = SystemClock> {
    config: SearchConfig,
    rng: fastrand::Rng,
    clock: C,
    tree: Option<Tree>,
}

impl MctsPlayer<SystemClock> {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> MctsPlayer<C> {
    pub fn with_clock(config: SearchConfig, clock: C) -> Self {
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            config,
            rng,
            clock,
            tree: None,
        }
    }

    /// Replace the random generator.
    pub fn with_rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Tree of the last search, rerooted at the move it chose.
    pub fn last_tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    /// Choose a move for the side to move on `board`.
    ///
    /// Searches for `time_budget(level)` on this player's clock and returns
    /// the resulting board with the turn handed to the other side.
    pub fn find_next_move(
        &mut self,
        board: &Board,
        level: u32,
    ) -> Result<SearchOutcome, SearchError> {
        let budget = time_budget(level)?;
        if let Status::Won(winner) = board.status() {
            return Err(SearchError::GameOver(winner));
        }
        let deadline = self.clock.now() + budget;
        info!(
            "searching for {} at level {level} for {} ms",
            board.current(),
            budget.as_millis()
        );

        let mut tree = Tree::new(State::new(board.clone(), board.current().opponent()));

        if board.can_opponent_win_next_move() {
            if let Some(id) = self.guard(&mut tree) {
                return self.commit(tree, id, SearchMode::Guarded, 0);
            }
        }

        let mut iterations = 0u64;
        loop {
            self.iterate(&mut tree);
            iterations += 1;
            if self.clock.now() >= deadline {
                break;
            }
        }

        let chosen = tree
            .robust_child(tree.root())
            .ok_or(SearchError::NoLegalMoves)?;
        self.commit(tree, chosen, SearchMode::Searched, iterations)
    }

    /// Answer a one-move threat with a random move that leaves the opponent
    /// no immediate win. Leaves the root unexpanded when no such move exists.
    fn guard(&mut self, tree: &mut Tree) -> Option<NodeId> {
        let root = tree.root();
        expand(tree, root);

        let safe: Vec<NodeId> = tree
            .children(root)
            .iter()
            .copied()
            .filter(|&id| {
                let board = tree.get(id).state.board();
                board.status() != Status::InProgress || !board.can_win_in_one(board.current())
            })
            .collect();

        if safe.is_empty() {
            debug!("no move stops the opponent's threat, falling back to search");
            tree.clear_root_children();
            return None;
        }
        debug!(
            "{} of {} moves stop the opponent's threat",
            safe.len(),
            tree.children(root).len()
        );
        Some(safe[self.rng.usize(..safe.len())])
    }

    /// One select, expand, simulate, backpropagate round.
    fn iterate(&mut self, tree: &mut Tree) {
        let selected = select_promising_node(tree, self.config.exploration);
        expand(tree, selected);

        let explore = tree
            .random_child(selected, &mut self.rng)
            .unwrap_or(selected);

        let winner = match tree.get(explore).state.board().status() {
            Status::Won(winner) => {
                // the side to move here has already lost
                if let Some(parent) = tree.parent(explore) {
                    tree.get_mut(parent).state.mark_lost();
                }
                Some(winner)
            }
            Status::InProgress => {
                let state = tree.get(explore).state.clone();
                simulate(state, &mut self.rng, self.config.max_rollout_plies)
            }
        };
        tree.backpropagate(explore, winner);
    }

    fn commit(
        &mut self,
        mut tree: Tree,
        id: NodeId,
        mode: SearchMode,
        iterations: u64,
    ) -> Result<SearchOutcome, SearchError> {
        let node = tree.get(id);
        let chosen = node.mv.ok_or(SearchError::NoLegalMoves)?;
        let board = node.state.board().clone();
        let stats = tree.stats();
        info!(
            "{} plays {chosen} ({mode:?}, {iterations} iterations, {} nodes, depth {})",
            board.current().opponent(),
            stats.total_nodes,
            stats.max_depth
        );

        tree.reroot(id);
        self.tree = Some(tree);
        Ok(SearchOutcome {
            board,
            chosen,
            mode,
            iterations,
            root_visits: stats.root_visits,
            tree_nodes: stats.total_nodes,
        })
    }
}

// =============================================================================
// Background search
// =============================================================================

/// A search running on its own thread.
pub struct SearchHandle {
    handle: JoinHandle<Result<SearchOutcome, SearchError>>,
}

impl SearchHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the search to finish.
    pub fn join(self) -> Result<SearchOutcome, SearchError> {
        self.handle
            .join()
            .map_err(|_| SearchError::WorkerPanicked)?
    }
}

/// Run `find_next_move` on a background thread with the wall clock.
pub fn spawn_search(
    board: Board,
    level: u32,
    config: SearchConfig,
) -> Result<SearchHandle, SearchError> {
    spawn_search_with(board, level, config, SystemClock::new())
}

pub fn spawn_search_with<C>(
    board: Board,
    level: u32,
    config: SearchConfig,
    clock: C,
) -> Result<SearchHandle, SearchError>
where
    C: Clock + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("mcts-search".to_string())
        .spawn(move || MctsPlayer::with_clock(config, clock).find_next_move(&board, level))?;
    Ok(SearchHandle { handle })
}
