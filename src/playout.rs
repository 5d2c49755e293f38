//! Rollouts (guided random game simulation).
//!
//! A rollout plays shuffled legal moves filtered by a cheap static
//! evaluation: a move must never hand the opponent a one-move win, and it
//! must serve the priority the position calls for (blocking, advancing the
//! ball or keeping a strong pass).

use log::trace;

use crate::board::{Board, Color};
use crate::constants::{
    DEFENSIVE_DISTANCE, DEFENSIVE_MULTIPLIER, MAX_GOAL_DISTANCE, OFFENSIVE_MULTIPLIER,
    PASS_THRESHOLD, WIN_EVALUATION,
};
use crate::rules::{Move, Status};
use crate::state::State;

/// Static evaluation of `board` for the side to move.
///
/// `-WIN_EVALUATION` when the opponent threatens to win next move and
/// `WIN_EVALUATION` when the side to move has the ball on its goal row or can
/// pass onto it. Otherwise the closer the ball (or its best receiver) is to
/// the goal, the larger the value, scaled down when an opponent mover is
/// within `DEFENSIVE_DISTANCE` rows of its own goal row.
pub fn evaluate(board: &Board) -> i32 {
    let me = board.current();
    let opponent = me.opponent();

    if board.can_win_in_one(opponent) {
        return -WIN_EVALUATION;
    }

    let carrier = board.player(me).ball();
    if board.distance_to_goal(carrier, me) == 0 || board.can_win_in_one(me) {
        return WIN_EVALUATION;
    }

    let best = std::iter::once(carrier)
        .chain(board.available_positions(carrier))
        .map(|pos| board.distance_to_goal(pos, me))
        .min()
        .unwrap_or(MAX_GOAL_DISTANCE);

    let goal = opponent.goal_row();
    let defensive = board
        .player(opponent)
        .movers()
        .iter()
        .any(|pos| pos.y.abs_diff(goal) <= DEFENSIVE_DISTANCE);
    let multiplier = if defensive {
        DEFENSIVE_MULTIPLIER
    } else {
        OFFENSIVE_MULTIPLIER
    };

    (MAX_GOAL_DISTANCE + 1).saturating_sub(best) as i32 * multiplier
}

/// What a rollout ply is trying to achieve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Priority {
    /// The opponent threatens to win: any move that does not worsen things.
    Block,
    /// Improve the evaluation.
    Advance,
    /// The ball is well placed: keep it at least as good.
    Pass,
}

impl Priority {
    pub fn from_evaluation(evaluation: i32) -> Priority {
        if evaluation < 0 {
            Priority::Block
        } else if evaluation > PASS_THRESHOLD {
            Priority::Pass
        } else {
            Priority::Advance
        }
    }

    /// Whether moving from evaluation `before` to `after` serves this
    /// priority.
    pub fn accepts(self, before: i32, after: i32) -> bool {
        match self {
            Priority::Block | Priority::Pass => after >= before,
            Priority::Advance => after > before,
        }
    }
}

/// Outcome of one rollout ply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ply {
    /// A winning pass, or a move that serves the priority without allowing
    /// a one-move loss.
    Committed(Move),
    /// No move served the priority; the first safe move, or failing that
    /// the first legal one, was played.
    Fallback(Move),
    /// No legal move; the board is unchanged.
    Stalled,
}

impl Ply {
    pub fn played(self) -> Option<Move> {
        match self {
            Ply::Committed(mv) | Ply::Fallback(mv) => Some(mv),
            Ply::Stalled => None,
        }
    }
}

/// Play one move for the side to move on `board`.
///
/// A pass onto the goal row is always taken. The turn is not switched.
pub fn rollout_ply(board: &mut Board, rng: &mut fastrand::Rng) -> Ply {
    let me = board.current();
    if let Some(mv) = board.winning_move(me) {
        if board.make_move(mv).is_ok() {
            return Ply::Committed(mv);
        }
    }

    let mut moves = board.legal_moves();
    rng.shuffle(&mut moves);

    let before = evaluate(board);
    let priority = Priority::from_evaluation(before);
    let mut first_safe = None;
    let mut first_legal = None;

    for mv in moves {
        let Ok(kind) = board.make_move(mv) else {
            continue;
        };
        let safe = !board.can_opponent_win_next_move();
        if safe && priority.accepts(before, evaluate(board)) {
            return Ply::Committed(mv);
        }
        board.undo_move(mv, kind);

        if safe && first_safe.is_none() {
            first_safe = Some(mv);
        }
        if first_legal.is_none() {
            first_legal = Some(mv);
        }
    }

    match first_safe.or(first_legal) {
        Some(mv) => match board.make_move(mv) {
            Ok(_) => Ply::Fallback(mv),
            Err(_) => Ply::Stalled,
        },
        None => Ply::Stalled,
    }
}

/// Play out `state` until someone wins or `max_plies` plies have been
/// played.
///
/// Returns the winner, or `None` when the cap was hit first.
pub fn simulate(mut state: State, rng: &mut fastrand::Rng, max_plies: usize) -> Option<Color> {
    for ply in 0..max_plies {
        if let Status::Won(winner) = state.board().status() {
            return Some(winner);
        }
        state.switch_player();
        if rollout_ply(state.board_mut(), rng) == Ply::Stalled {
            trace!("rollout stalled at ply {ply}: {} has no move", state.board().current());
        }
        state.board_mut().switch_turn();
    }

    match state.board().status() {
        Status::Won(winner) => Some(winner),
        Status::InProgress => {
            trace!("rollout abandoned after {max_plies} plies");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Pos;
    use crate::constants::MAX_ROLLOUT_PLIES;

    fn threatened() -> Board {
        Board::from_diagram(
            "bbb....
             .......
             ...B...
             .......
             .......
             ......W
             .......
             .wwbww.",
            Color::White,
        )
        .unwrap()
    }

    fn winnable() -> Board {
        Board::from_diagram(
            "w.bBbbb
             .......
             .......
             W......
             .......
             .......
             .......
             .www...",
            Color::White,
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_initial_board() {
        // carrier seven rows out, nobody near their goal
        assert_eq!(evaluate(&Board::new()), 70);
    }

    #[test]
    fn test_evaluate_threats() {
        assert_eq!(evaluate(&threatened()), -WIN_EVALUATION);
        assert_eq!(evaluate(&winnable()), WIN_EVALUATION);
    }

    #[test]
    fn test_scoring_chance_outranks_any_position() {
        for multiplier in [OFFENSIVE_MULTIPLIER, DEFENSIVE_MULTIPLIER] {
            for distance in 1..=MAX_GOAL_DISTANCE {
                let positional = (MAX_GOAL_DISTANCE + 1 - distance) as i32 * multiplier;
                assert!(positional < WIN_EVALUATION);
                // setting up a winning pass always serves the priority
                let priority = Priority::from_evaluation(positional);
                assert!(priority.accepts(positional, WIN_EVALUATION), "{positional}");
            }
        }
    }

    #[test]
    fn test_evaluate_defensive() {
        // a Black mover two rows from row 7 puts White on defence
        let board = Board::from_diagram(
            ".bbBb..
             .......
             .......
             .......
             .......
             b......
             .......
             .wwWww.",
            Color::White,
        )
        .unwrap();
        assert_eq!(evaluate(&board), 14);
    }

    #[test]
    fn test_defence_counts_rows_only() {
        // b4 is three rows from row 7, though two White movers stand in
        // its column
        let board = Board::from_diagram(
            ".bbB..b
             .......
             .......
             .......
             b......
             w......
             w......
             ..wW.w.",
            Color::White,
        )
        .unwrap();
        assert_eq!(board.distance_to_goal(Pos::new(0, 4), Color::Black), 5);
        assert_eq!(evaluate(&board), 14);
    }

    #[test]
    fn test_priority() {
        assert_eq!(Priority::from_evaluation(-10), Priority::Block);
        assert_eq!(Priority::from_evaluation(10), Priority::Advance);
        assert_eq!(Priority::from_evaluation(0), Priority::Advance);
        assert_eq!(Priority::from_evaluation(11), Priority::Pass);

        assert!(Priority::Block.accepts(-10, -10));
        assert!(Priority::Pass.accepts(70, 70));
        assert!(!Priority::Pass.accepts(70, 60));
        assert!(!Priority::Advance.accepts(10, 10));
        assert!(Priority::Advance.accepts(10, 20));
    }

    #[test]
    fn test_rollout_ply_plays_a_legal_move() {
        let mut rng = fastrand::Rng::with_seed(11);
        let start = Board::new();
        let mut board = start.clone();
        let mv = rollout_ply(&mut board, &mut rng).played().unwrap();

        assert!(start.legal_moves().contains(&mv));
        let mut expected = start.clone();
        expected.make_move(mv).unwrap();
        assert_eq!(board, expected);
        assert_eq!(board.current(), Color::White);
    }

    #[test]
    fn test_rollout_ply_blocks_threat() {
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut board = threatened();
            let ply = rollout_ply(&mut board, &mut rng);
            assert!(matches!(ply, Ply::Committed(_)), "seed {seed}: {ply:?}");
            assert!(!board.can_opponent_win_next_move(), "seed {seed}");
        }
    }

    #[test]
    fn test_rollout_ply_takes_the_win() {
        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut board = winnable();
            assert_eq!(
                rollout_ply(&mut board, &mut rng),
                Ply::Committed(Move::new(Pos::new(0, 3), Pos::new(0, 0)))
            );
            assert_eq!(board.status(), Status::Won(Color::White));
        }
    }

    #[test]
    fn test_rollout_ply_stalls_when_game_is_over() {
        let over = Board::from_diagram(
            "Ww.b...
             .......
             .......
             .......
             ..w....
             .......
             ..b..w.
             .w..bbB",
            Color::Black,
        )
        .unwrap();
        let mut board = over.clone();
        let mut rng = fastrand::Rng::with_seed(1);
        assert_eq!(rollout_ply(&mut board, &mut rng), Ply::Stalled);
        assert_eq!(board, over);
        assert_eq!(
            simulate(State::new(over, Color::White), &mut rng, 10),
            Some(Color::White)
        );
    }

    #[test]
    fn test_simulate_respects_cap() {
        let mut rng = fastrand::Rng::with_seed(5);
        assert_eq!(simulate(State::new(Board::new(), Color::Black), &mut rng, 0), None);
    }

    #[test]
    fn test_simulate_is_reproducible() {
        let run = |seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            simulate(State::new(Board::new(), Color::Black), &mut rng, MAX_ROLLOUT_PLIES)
        };
        let first: Vec<Option<Color>> = (0..10).map(run).collect();
        let second: Vec<Option<Color>> = (0..10).map(run).collect();
        assert_eq!(first, second);
        assert!(first.iter().any(Option::is_some), "{first:?}");
    }

    #[test]
    fn test_rollouts_from_the_start_find_a_winner() {
        let mut white = 0;
        let mut black = 0;
        for seed in 0..40 {
            let mut rng = fastrand::Rng::with_seed(seed);
            match simulate(State::new(Board::new(), Color::Black), &mut rng, MAX_ROLLOUT_PLIES) {
                Some(Color::White) => white += 1,
                Some(Color::Black) => black += 1,
                None => {}
            }
        }
        assert!(white + black >= 20, "white {white}, black {black} of 40");
    }
}
