//! Board representation: colors, coordinates, pieces, cells and players.
//!
//! Everything in a [`Board`] is an owned value, so `clone()` yields a fully
//! independent copy.

use std::fmt;

use thiserror::Error;

use crate::constants::{
    BALL_START_COLUMN, BLACK_BALL_ID, BLACK_FIRST_MOVER_ID, HEIGHT, MOVERS_PER_SIDE, WHITE_BALL_ID,
    WHITE_FIRST_MOVER_ID, WIDTH,
};

/// The two sides. White moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Numeric player id: 1 for White, 2 for Black.
    pub fn id(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Color> {
        match id {
            1 => Some(Color::White),
            2 => Some(Color::Black),
            _ => None,
        }
    }

    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row the side starts on.
    pub fn home_row(self) -> usize {
        match self {
            Color::White => HEIGHT - 1,
            Color::Black => 0,
        }
    }

    /// Row the side must bring its ball to.
    pub fn goal_row(self) -> usize {
        self.opponent().home_row()
    }

    fn index(self) -> usize {
        usize::from(self.id() - 1)
    }

    fn first_mover_id(self) -> u8 {
        match self {
            Color::White => WHITE_FIRST_MOVER_ID,
            Color::Black => BLACK_FIRST_MOVER_ID,
        }
    }

    fn ball_id(self) -> u8 {
        match self {
            Color::White => WHITE_BALL_ID,
            Color::Black => BLACK_BALL_ID,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A board coordinate: `x` is the column, `y` the row (row 0 at the top).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        self.x < WIDTH && self.y < HEIGHT
    }

    /// The position shifted by `(dx, dy)`, or `None` if that leaves the board.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Pos> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        let pos = Pos { x, y };
        pos.in_bounds().then_some(pos)
    }

    /// Parse a coordinate such as `"d1"`.
    ///
    /// Columns are letters `a`..`g` from the left. Ranks count from White's
    /// home row, so rank 1 is row 7 and rank 8 is row 0.
    pub fn parse(s: &str) -> Option<Pos> {
        let &[col, rank] = s.trim().as_bytes() else {
            return None;
        };
        let col = col.to_ascii_lowercase();
        if !(b'a'..b'a' + WIDTH as u8).contains(&col) || !(b'1'..=b'0' + HEIGHT as u8).contains(&rank) {
            return None;
        }
        Some(Pos::new(usize::from(col - b'a'), HEIGHT - usize::from(rank - b'0')))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.in_bounds() {
            return write!(f, "({}, {})", self.x, self.y);
        }
        write!(f, "{}{}", char::from(b'a' + self.x as u8), HEIGHT - self.y)
    }
}

/// A game piece. Movers step like chess knights; a ball rides a mover and
/// is passed along lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Piece {
    Mover { color: Color, id: u8 },
    Ball { color: Color, id: u8 },
}

impl Piece {
    pub fn color(self) -> Color {
        match self {
            Piece::Mover { color, .. } | Piece::Ball { color, .. } => color,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Piece::Mover { id, .. } | Piece::Ball { id, .. } => id,
        }
    }

    pub fn is_ball(self) -> bool {
        matches!(self, Piece::Ball { .. })
    }
}

/// One square of the board, holding a stack of up to two pieces: a mover
/// and, optionally, the ball riding on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pos: Pos,
    mover: Option<Piece>,
    ball: Option<Piece>,
}

impl Cell {
    pub fn new(pos: Pos) -> Self {
        Self {
            pos,
            mover: None,
            ball: None,
        }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mover.is_none()
    }

    /// Number of pieces stacked on the cell (0, 1 or 2).
    pub fn len(&self) -> usize {
        usize::from(self.mover.is_some()) + usize::from(self.ball.is_some())
    }

    pub fn mover(&self) -> Option<Piece> {
        self.mover
    }

    pub fn ball(&self) -> Option<Piece> {
        self.ball
    }

    #[inline]
    pub fn has_ball(&self) -> bool {
        self.ball.is_some()
    }

    /// Color of the pieces on the cell, if any.
    #[inline]
    pub fn owner(&self) -> Option<Color> {
        self.mover.map(Piece::color)
    }

    /// Pieces from the bottom of the stack up.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.mover.into_iter().chain(self.ball)
    }

    pub(crate) fn put_mover(&mut self, piece: Piece) {
        debug_assert!(self.mover.is_none(), "cell {} already holds a mover", self.pos);
        self.mover = Some(piece);
    }

    pub(crate) fn take_mover(&mut self) -> Option<Piece> {
        debug_assert!(self.ball.is_none(), "cannot lift a mover carrying the ball");
        self.mover.take()
    }

    pub(crate) fn put_ball(&mut self, piece: Piece) {
        debug_assert!(self.mover.is_some(), "a ball must rest on a mover");
        self.ball = Some(piece);
    }

    pub(crate) fn take_ball(&mut self) -> Option<Piece> {
        self.ball.take()
    }

    fn symbol(&self) -> char {
        match (self.owner(), self.has_ball()) {
            (None, _) => '.',
            (Some(Color::White), false) => 'w',
            (Some(Color::White), true) => 'W',
            (Some(Color::Black), false) => 'b',
            (Some(Color::Black), true) => 'B',
        }
    }
}

/// One side's pieces, tracked by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    id: u8,
    color: Color,
    /// Mover positions, indexed by mover id within the side
    movers: [Pos; MOVERS_PER_SIDE],
    /// Position of the mover currently carrying the ball
    ball: Pos,
    to_move: bool,
}

impl Player {
    fn new(color: Color, movers: [Pos; MOVERS_PER_SIDE], ball: Pos) -> Self {
        Self {
            id: color.id(),
            color,
            movers,
            ball,
            to_move: false,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn movers(&self) -> &[Pos; MOVERS_PER_SIDE] {
        &self.movers
    }

    pub fn ball(&self) -> Pos {
        self.ball
    }

    pub fn is_to_move(&self) -> bool {
        self.to_move
    }

    pub(crate) fn relocate_mover(&mut self, from: Pos, to: Pos) {
        if let Some(slot) = self.movers.iter_mut().find(|pos| **pos == from) {
            *slot = to;
        }
    }

    pub(crate) fn set_ball(&mut self, pos: Pos) {
        self.ball = pos;
    }
}

/// Errors from [`Board::from_diagram`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    #[error("expected {expected} rows, found {0}", expected = HEIGHT)]
    RowCount(usize),
    #[error("row {row} has {width} cells, expected {expected}", expected = WIDTH)]
    RowWidth { row: usize, width: usize },
    #[error("unknown symbol {symbol:?} at {pos}")]
    UnknownSymbol { symbol: char, pos: Pos },
    #[error("{color} has {found} movers, expected {expected}", expected = MOVERS_PER_SIDE)]
    MoverCount { color: Color, found: usize },
    #[error("{color} has {found} balls, expected exactly one")]
    BallCount { color: Color, found: usize },
}

/// The full game position: grid, both players and the side to move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; WIDTH]; HEIGHT],
    players: [Player; 2],
    current: Color,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The starting position: each side has movers on columns 1..=5 of its
    /// home row and the ball on the center one. White moves first.
    pub fn new() -> Self {
        let side = |color: Color| {
            let row = color.home_row();
            let movers = std::array::from_fn(|i| Pos::new(i + 1, row));
            (movers, Pos::new(BALL_START_COLUMN, row))
        };
        Self::assemble(side(Color::White), side(Color::Black), Color::White)
    }

    /// Build a board from a text diagram, one line per row from the top.
    ///
    /// `.` is an empty cell, `w`/`b` a bare mover and `W`/`B` a mover
    /// carrying its side's ball. Whitespace is ignored, so the output of
    /// `Display` can be fed back in.
    pub fn from_diagram(diagram: &str, to_move: Color) -> Result<Self, DiagramError> {
        let rows: Vec<Vec<char>> = diagram
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect();
        if rows.len() != HEIGHT {
            return Err(DiagramError::RowCount(rows.len()));
        }

        let mut movers: [Vec<Pos>; 2] = [Vec::new(), Vec::new()];
        let mut balls: [Vec<Pos>; 2] = [Vec::new(), Vec::new()];
        for (y, row) in rows.iter().enumerate() {
            if row.len() != WIDTH {
                return Err(DiagramError::RowWidth {
                    row: y,
                    width: row.len(),
                });
            }
            for (x, &symbol) in row.iter().enumerate() {
                let pos = Pos::new(x, y);
                let color = match symbol {
                    '.' => continue,
                    'w' | 'W' => Color::White,
                    'b' | 'B' => Color::Black,
                    _ => return Err(DiagramError::UnknownSymbol { symbol, pos }),
                };
                movers[color.index()].push(pos);
                if symbol.is_ascii_uppercase() {
                    balls[color.index()].push(pos);
                }
            }
        }

        let side = |color: Color| -> Result<([Pos; MOVERS_PER_SIDE], Pos), DiagramError> {
            let found = &movers[color.index()];
            let side_movers = <[Pos; MOVERS_PER_SIDE]>::try_from(found.as_slice()).map_err(|_| {
                DiagramError::MoverCount {
                    color,
                    found: found.len(),
                }
            })?;
            match balls[color.index()].as_slice() {
                [ball] => Ok((side_movers, *ball)),
                other => Err(DiagramError::BallCount {
                    color,
                    found: other.len(),
                }),
            }
        };
        Ok(Self::assemble(side(Color::White)?, side(Color::Black)?, to_move))
    }

    fn assemble(
        white: ([Pos; MOVERS_PER_SIDE], Pos),
        black: ([Pos; MOVERS_PER_SIDE], Pos),
        to_move: Color,
    ) -> Self {
        let mut board = Board {
            cells: std::array::from_fn(|y| std::array::from_fn(|x| Cell::new(Pos::new(x, y)))),
            players: [
                Player::new(Color::White, white.0, white.1),
                Player::new(Color::Black, black.0, black.1),
            ],
            current: to_move,
        };
        for color in [Color::White, Color::Black] {
            let player = board.players[color.index()].clone();
            for (slot, &pos) in player.movers.iter().enumerate() {
                board.cell_mut(pos).put_mover(Piece::Mover {
                    color,
                    id: color.first_mover_id() + slot as u8,
                });
            }
            board.cell_mut(player.ball).put_ball(Piece::Ball {
                color,
                id: color.ball_id(),
            });
        }
        board.players[to_move.index()].to_move = true;
        board
    }

    /// The cell at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is off the board; use [`Board::get`] for unchecked input.
    #[inline]
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.y][pos.x]
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        self.cells.get(pos.y)?.get(pos.x)
    }

    #[inline]
    pub(crate) fn cell_mut(&mut self, pos: Pos) -> &mut Cell {
        &mut self.cells[pos.y][pos.x]
    }

    /// All cells, row by row from the top.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    pub fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    pub(crate) fn player_mut(&mut self, color: Color) -> &mut Player {
        &mut self.players[color.index()]
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    /// The side to move.
    #[inline]
    pub fn current(&self) -> Color {
        self.current
    }

    pub fn current_player(&self) -> &Player {
        self.player(self.current)
    }

    /// Hand the move to the other side.
    pub fn switch_turn(&mut self) {
        self.players[self.current.index()].to_move = false;
        self.current = self.current.opponent();
        self.players[self.current.index()].to_move = true;
    }

    /// Whether `pos` holds a piece the side to move may pick up.
    pub fn is_current_players_piece(&self, pos: Pos) -> bool {
        self.get(pos)
            .and_then(Cell::owner)
            .is_some_and(|owner| owner == self.current)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{} ", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
