//! Integration tests for the End of the Track rules.
//!
//! Positions are set up with board diagrams: `.` empty, `w`/`b` a bare
//! mover and `W`/`B` a mover holding its side's ball. Row 0 (rank 8) is the
//! top line.

use assert_matches::assert_matches;

use endtrack_rust::board::{Board, Color, Pos};
use endtrack_rust::constants::{HEIGHT, MOVERS_PER_SIDE, WIDTH};
use endtrack_rust::rules::{Move, MoveError, MoveKind, Status};

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

fn p(s: &str) -> Pos {
    Pos::parse(s).unwrap_or_else(|| panic!("bad position {s}"))
}

fn mv(from: &str, to: &str) -> Move {
    Move::new(p(from), p(to))
}

fn diagram(text: &str, to_move: Color) -> Board {
    Board::from_diagram(text, to_move).unwrap()
}

/// Every piece is accounted for: five movers and one ball per side, each
/// ball sitting on a mover of its own color.
fn assert_consistent(board: &Board) {
    let mut movers = [0; 2];
    let mut balls = [0; 2];
    for cell in board.cells() {
        if let Some(mover) = cell.mover() {
            movers[usize::from(mover.color() == Color::Black)] += 1;
        }
        if let Some(ball) = cell.ball() {
            balls[usize::from(ball.color() == Color::Black)] += 1;
            assert_eq!(cell.owner(), Some(ball.color()), "loose ball on {}", cell.pos());
        }
    }
    assert_eq!(movers, [MOVERS_PER_SIDE; 2]);
    assert_eq!(balls, [1, 1]);

    for player in board.players() {
        assert!(board.cell(player.ball()).has_ball());
        for &pos in player.movers() {
            assert_eq!(board.cell(pos).owner(), Some(player.color()));
        }
    }
}

// =============================================================================
// Coordinates and setup
// =============================================================================

#[test]
fn test_position_text_round_trip() {
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let pos = Pos::new(x, y);
            assert_eq!(Pos::parse(&pos.to_string()), Some(pos));
        }
    }
    assert_eq!(p("a1"), Pos::new(0, 7));
    assert_eq!(p("g8"), Pos::new(6, 0));
    assert_eq!(Pos::parse("h1"), None);
    assert_eq!(Pos::parse("a9"), None);
    assert_eq!(Pos::parse("a0"), None);
}

#[test]
fn test_initial_layout() {
    let board = Board::new();
    assert_consistent(&board);
    assert_eq!(board.current(), Color::White);
    assert_eq!(board.status(), Status::InProgress);

    let white = board.player(Color::White);
    assert_eq!(white.id(), 1);
    assert_eq!(white.ball(), p("d1"));
    assert!(white.is_to_move());
    let black = board.player(Color::Black);
    assert_eq!(black.id(), 2);
    assert_eq!(black.ball(), p("d8"));
    assert!(!black.is_to_move());

    assert!(board.cell(p("a1")).is_empty());
    assert!(board.cell(p("g8")).is_empty());
    assert_eq!(board.cell(p("d1")).len(), 2);
}

#[test]
fn test_diagram_round_trip() {
    let board = diagram(
        ".bbBb..
         .......
         .......
         .......
         W.b.w..
         .......
         ..w....
         .w..w..",
        Color::White,
    );
    assert_consistent(&board);
    let again = Board::from_diagram(&board.to_string(), Color::White).unwrap();
    assert_eq!(again, board);
}

// =============================================================================
// Passing
// =============================================================================

#[test]
fn test_pass_blocked_by_opponent() {
    let mut board = diagram(
        ".bbBb..
         .......
         .......
         .......
         W.b.w..
         .......
         ..w....
         .w..w..",
        Color::White,
    );
    let before = board.clone();

    assert_matches!(
        board.make_move(Move::new(Pos::new(0, 4), Pos::new(4, 4))),
        Err(MoveError::Blocked(pos)) if pos == Pos::new(2, 4)
    );
    assert_eq!(board, before);
    assert_eq!(board.available_positions(Pos::new(0, 4)), vec![Pos::new(2, 6)]);

    assert_eq!(
        board.make_move(Move::new(Pos::new(0, 4), Pos::new(2, 6))),
        Ok(MoveKind::Pass)
    );
    assert_eq!(board.player(Color::White).ball(), Pos::new(2, 6));
    assert!(!board.cell(Pos::new(0, 4)).has_ball());
    assert_consistent(&board);
}

#[test]
fn test_pass_over_own_piece() {
    let board = diagram(
        ".bbBb..
         b......
         .......
         .......
         W.w.w..
         .......
         ..w....
         .w.....",
        Color::White,
    );
    let mut targets = board.available_positions(Pos::new(0, 4));
    targets.sort();
    assert_eq!(
        targets,
        vec![Pos::new(2, 4), Pos::new(2, 6), Pos::new(4, 4)]
    );
}

#[test]
fn test_pass_needs_a_receiver() {
    let mut board = Board::new();
    assert_matches!(board.make_move(mv("d1", "d4")), Err(MoveError::NoReceiver(_)));
    assert_matches!(board.make_move(mv("d1", "a1")), Err(MoveError::NoReceiver(_)));
    assert_matches!(board.make_move(mv("d1", "f2")), Err(MoveError::NotALine));
    assert_eq!(board.make_move(mv("d1", "b1")), Ok(MoveKind::Pass));
}

// =============================================================================
// Steps and turn handling
// =============================================================================

#[test]
fn test_step_validation() {
    let mut board = Board::new();
    assert_matches!(board.make_move(mv("a1", "b3")), Err(MoveError::EmptySource(_)));
    assert_matches!(board.make_move(mv("b8", "c6")), Err(MoveError::NotYourPiece(_)));
    assert_matches!(board.make_move(mv("b1", "b3")), Err(MoveError::NotAKnightStep));
    assert_matches!(
        board.make_move(Move::new(Pos::new(1, 7), Pos::new(0, 9))),
        Err(MoveError::OutOfBounds(_))
    );
    assert_eq!(board.make_move(mv("b1", "c3")), Ok(MoveKind::Step));
    assert_eq!(board.player(Color::White).movers()[0], p("c3"));
    assert_consistent(&board);
}

#[test]
fn test_turns_alternate_only_on_switch() {
    let mut board = Board::new();
    board.make_move(mv("b1", "c3")).unwrap();
    assert_eq!(board.current(), Color::White);
    board.switch_turn();
    assert_eq!(board.current(), Color::Black);
    assert!(board.is_current_players_piece(p("b8")));
    assert!(!board.is_current_players_piece(p("c3")));
    assert_matches!(board.make_move(mv("c3", "d5")), Err(MoveError::NotYourPiece(_)));
    assert_eq!(board.make_move(mv("b8", "c6")), Ok(MoveKind::Step));
}

// =============================================================================
// Winning
// =============================================================================

#[test]
fn test_win_by_pass_to_goal_row() {
    let mut board = diagram(
        "w.bBbbb
         .......
         .......
         W......
         .......
         .......
         .......
         .www...",
        Color::White,
    );
    assert!(board.can_win_in_one(Color::White));
    assert!(!board.can_win_in_one(Color::Black));

    board.switch_turn();
    assert!(board.can_opponent_win_next_move());
    board.switch_turn();
    assert!(!board.can_opponent_win_next_move());

    board.make_move(Move::new(Pos::new(0, 3), Pos::new(0, 0))).unwrap();
    assert_eq!(board.status(), Status::Won(Color::White));
    assert!(board.legal_moves().is_empty());

    board.switch_turn();
    assert_matches!(
        board.make_move(Move::new(Pos::new(2, 0), Pos::new(1, 2))),
        Err(MoveError::GameOver)
    );
}

#[test]
fn test_threat_check_leaves_board_untouched() {
    let board = diagram(
        "bbb....
         .......
         ...B...
         .......
         .......
         ......W
         .......
         .wwbww.",
        Color::White,
    );
    let copy = board.clone();
    assert!(board.can_opponent_win_next_move());
    assert_eq!(board, copy);
    assert_eq!(board.distance_to_goal(Pos::new(3, 2), Color::Black), 5);

    let blocked = diagram(
        "bbb....
         .......
         ...B...
         .......
         .......
         ...w...
         .......
         .wwbwW.",
        Color::White,
    );
    assert!(!blocked.can_opponent_win_next_move());
    assert_eq!(blocked.distance_to_goal(Pos::new(3, 2), Color::Black), 6);
}

// =============================================================================
// Random games
// =============================================================================

#[test]
fn test_random_games_keep_board_consistent() {
    let mut rng = fastrand::Rng::with_seed(2024);
    for _ in 0..20 {
        let mut board = Board::new();
        for _ in 0..150 {
            if board.status() != Status::InProgress {
                break;
            }
            let moves = board.legal_moves();
            if moves.is_empty() {
                board.switch_turn();
                continue;
            }
            let chosen = moves[rng.usize(..moves.len())];

            let before = board.clone();
            let kind = board.make_move(chosen).unwrap();
            assert_consistent(&board);

            let mut undone = board.clone();
            undone.undo_move(chosen, kind);
            assert_eq!(undone, before);

            board.switch_turn();
        }
    }
}
