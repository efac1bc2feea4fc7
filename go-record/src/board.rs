use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::coords::{self, GTP_COLUMNS};
use crate::error::GoError;
use crate::moves::{Move, Vertex};
use crate::stone::Stone;

/// Stones removed from the board, indexed by the color that captured them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Captures {
    pub black: u32,
    pub white: u32,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stone: Stone) -> u32 {
        match stone {
            Stone::Black => self.black,
            Stone::White => self.white,
        }
    }

    fn add(&mut self, stone: Stone, count: u32) {
        match stone {
            Stone::Black => self.black += count,
            Stone::White => self.white += count,
        }
    }
}

/// What occupies a cell: the stone's color and the ply that put it there
/// (an index into the game's move list, `None` for setup stones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placed {
    pub stone: Stone,
    pub turn: Option<usize>,
}

impl From<&Move> for Placed {
    fn from(m: &Move) -> Self {
        Placed {
            stone: m.color,
            turn: m.turn,
        }
    }
}

/// Flat snapshot of a board, suitable for JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    pub board: Vec<i8>,
    pub cols: u8,
    pub rows: u8,
    pub captures: Captures,
}

/// The Go board stored as a flat, row-major array of cells.
///
/// Captures are resolved synchronously on every placement, so no group with
/// zero liberties survives between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    cells: Vec<Option<Placed>>,
    cols: u8,
    rows: u8,
    captures: Captures,
}

impl Board {
    /// Create an empty board with the given dimensions.
    pub fn with_dimensions(cols: u8, rows: u8) -> Self {
        Board {
            cells: vec![None; cols as usize * rows as usize],
            cols,
            rows,
            captures: Captures::new(),
        }
    }

    /// Build a board from a matrix of stone values (`rows` x `cols`, 1 black, -1 white, 0 empty),
    /// then remove every group left without liberties.
    pub fn from_matrix(matrix: Vec<Vec<i8>>) -> Result<Self, GoError> {
        let rows = matrix.len();
        let cols = matrix.first().map_or(0, |r| r.len());
        if matrix.iter().any(|row| row.len() != cols)
            || rows > u8::MAX as usize
            || cols > u8::MAX as usize
        {
            return Err(GoError::Inconsistent("malformed board matrix".to_string()));
        }

        let cells = matrix
            .into_iter()
            .flatten()
            .map(|v| Stone::from_int(v).map(|stone| Placed { stone, turn: None }))
            .collect();
        let mut board = Board {
            cells,
            cols: cols as u8,
            rows: rows as u8,
            captures: Captures::new(),
        };
        board.update_all();
        Ok(board)
    }

    /// Replay `moves` onto an empty board, resolving captures after each
    /// placement, and finish with a whole-board sweep.
    pub fn from_moves(cols: u8, rows: u8, moves: &[Move]) -> Result<Self, GoError> {
        let mut board = Board::with_dimensions(cols, rows);
        for m in moves.iter().filter(|m| !m.is_pass()) {
            board.add_move(m)?;
        }
        board.update_all();
        Ok(board)
    }

    // -- Accessors --

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn size(&self) -> (u8, u8) {
        (self.cols, self.rows)
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    pub fn cell(&self, point: Point) -> Option<Placed> {
        if self.on_board(point) {
            self.cells[self.idx(point)]
        } else {
            None
        }
    }

    pub fn stone_at(&self, point: Point) -> Option<Stone> {
        self.cell(point).map(|p| p.stone)
    }

    pub fn on_board(&self, (col, row): Point) -> bool {
        col < self.cols && row < self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// On the board and unoccupied.
    pub fn is_valid_pos(&self, point: Point) -> bool {
        self.check_placement(point).is_ok()
    }

    pub(crate) fn check_placement(&self, point: Point) -> Result<(), GoError> {
        if !self.on_board(point) {
            return Err(GoError::NotOnBoard(point));
        }
        if self.cell(point).is_some() {
            return Err(GoError::Overwrite(point));
        }
        Ok(())
    }

    pub fn state(&self) -> BoardState {
        BoardState {
            board: self
                .cells
                .iter()
                .map(|c| c.map_or(0, |p| p.stone.to_int()))
                .collect(),
            cols: self.cols,
            rows: self.rows,
            captures: self.captures.clone(),
        }
    }

    // -- Mutation --

    /// Put a move's stone on the board and resolve captures around it.
    /// Returns the points that were cleared.
    pub fn add_move(&mut self, m: &Move) -> Result<Vec<Point>, GoError> {
        let Vertex::Point(point) = m.vertex else {
            return Err(GoError::Inconsistent("a pass has no board position".to_string()));
        };
        self.check_placement(point)?;

        let i = self.idx(point);
        self.cells[i] = Some(Placed::from(m));
        Ok(self.update_board(point))
    }

    /// Take a move's stone off the board. The cell must still hold that move.
    pub fn remove_move(&mut self, m: &Move) -> Result<(), GoError> {
        let Vertex::Point(point) = m.vertex else {
            return Err(GoError::Inconsistent("a pass has no board position".to_string()));
        };
        match self.cell(point) {
            Some(placed) if placed == Placed::from(m) => {
                let i = self.idx(point);
                self.cells[i] = None;
                Ok(())
            }
            other => Err(GoError::Inconsistent(format!(
                "expected {} stone of turn {:?} at {point:?}, found {other:?}",
                m.color, m.turn
            ))),
        }
    }

    /// Clear an occupied point, returning what was there.
    pub fn remove_at(&mut self, point: Point) -> Result<Placed, GoError> {
        let placed = self
            .cell(point)
            .ok_or_else(|| GoError::Inconsistent(format!("no stone at {point:?}")))?;
        let i = self.idx(point);
        self.cells[i] = None;
        Ok(placed)
    }

    /// Resolve captures around `point`: the point itself and its neighbors.
    ///
    /// Groups of the color opposing the stone at `point` are evaluated and
    /// removed first; the stone's own group is then removed if it still has
    /// no liberties (self-capture). Returns the cleared points.
    pub fn update_board(&mut self, point: Point) -> Vec<Point> {
        if !self.on_board(point) {
            return Vec::new();
        }
        let mover = self.stone_at(point);
        let mut visited = vec![false; self.cells.len()];

        let mut dead = Vec::new();
        for n in self.neighbors(point) {
            match self.stone_at(n) {
                Some(s) if Some(s) != mover => {
                    self.collect_dead(n, &mut visited, &mut dead);
                }
                _ => {}
            }
        }
        self.clear(&dead);

        let mut removed = dead;
        if mover.is_some() {
            let mut own = Vec::new();
            self.collect_dead(point, &mut visited, &mut own);
            if !own.is_empty() {
                tracing::debug!("self-capture of {} stones at {point:?}", own.len());
            }
            self.clear(&own);
            removed.extend(own);
        }

        if !removed.is_empty() {
            tracing::debug!("play at {point:?} removed {} stones", removed.len());
        }
        removed
    }

    /// Evaluate every group on the board once and remove the ones without
    /// liberties in a single sweep. Returns the cleared points.
    pub fn update_all(&mut self) -> Vec<Point> {
        let mut visited = vec![false; self.cells.len()];
        let mut dead = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                self.collect_dead((col, row), &mut visited, &mut dead);
            }
        }
        self.clear(&dead);
        if !dead.is_empty() {
            tracing::debug!("board sweep removed {} stones", dead.len());
        }
        dead
    }

    /// A new board holding only the stones inside the rectangle spanned by
    /// two corners (inclusive, any order), re-based to a zero origin.
    pub fn sub_board(&self, a: Point, b: Point) -> Result<Board, GoError> {
        for corner in [a, b] {
            if !self.on_board(corner) {
                return Err(GoError::NotOnBoard(corner));
            }
        }
        let (min_c, max_c) = (a.0.min(b.0), a.0.max(b.0));
        let (min_r, max_r) = (a.1.min(b.1), a.1.max(b.1));

        let mut sub = Board::with_dimensions(max_c - min_c + 1, max_r - min_r + 1);
        for row in min_r..=max_r {
            for col in min_c..=max_c {
                let i = sub.idx((col - min_c, row - min_r));
                sub.cells[i] = self.cell((col, row));
            }
        }
        Ok(sub)
    }

    /// [`Board::sub_board`] with corners given as GTP vertices, e.g. `("D4", "K10")`.
    pub fn sub_board_gtp(&self, a: &str, b: &str) -> Result<Board, GoError> {
        let corner = |v: &str| {
            coords::gtp_to_coord(v, self.rows)?.ok_or_else(|| GoError::InvalidGtp(v.to_string()))
        };
        self.sub_board(corner(a)?, corner(b)?)
    }

    // -- Graph algorithms --

    /// Get the 4-connected neighbors that are on the board.
    pub fn neighbors(&self, (col, row): Point) -> ArrayVec<Point, 4> {
        let mut result = ArrayVec::new();
        if col > 0 {
            result.push((col - 1, row));
        }
        if col + 1 < self.cols {
            result.push((col + 1, row));
        }
        if row > 0 {
            result.push((col, row - 1));
        }
        if row + 1 < self.rows {
            result.push((col, row + 1));
        }
        result
    }

    /// Flood-fill connected group of same-colored stones.
    pub fn chain(&self, point: Point) -> Vec<Point> {
        let mut visited = vec![false; self.cells.len()];
        self.chain_from(point, &mut visited)
    }

    /// Distinct empty points adjacent to the group at `point`.
    pub fn liberties(&self, point: Point) -> Vec<Point> {
        let chain = self.chain(point);
        self.chain_liberties(&chain)
    }

    pub fn liberty_count(&self, point: Point) -> usize {
        self.liberties(point).len()
    }

    fn chain_liberties(&self, chain: &[Point]) -> Vec<Point> {
        let mut seen = vec![false; self.cells.len()];
        let mut libs = Vec::new();
        for &p in chain {
            for n in self.neighbors(p) {
                let ni = self.idx(n);
                if !seen[ni] && self.cells[ni].is_none() {
                    seen[ni] = true;
                    libs.push(n);
                }
            }
        }
        libs
    }

    /// Chain flood-fill using a shared visited bitset.
    fn chain_from(&self, point: Point, visited: &mut [bool]) -> Vec<Point> {
        let Some(stone) = self.stone_at(point) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut stack = vec![point];

        while let Some(p) = stack.pop() {
            let vi = self.idx(p);
            if visited[vi] {
                continue;
            }
            visited[vi] = true;
            result.push(p);
            for n in self.neighbors(p) {
                if self.stone_at(n) == Some(stone) && !visited[self.idx(n)] {
                    stack.push(n);
                }
            }
        }

        result
    }

    /// Append the group at `point` to `dead` if it has no liberties.
    fn collect_dead(&mut self, point: Point, visited: &mut [bool], dead: &mut Vec<Point>) {
        let Some(stone) = self.stone_at(point) else {
            return;
        };
        if visited[self.idx(point)] {
            return;
        }
        let chain = self.chain_from(point, visited);
        if self.chain_liberties(&chain).is_empty() {
            self.captures.add(stone.opp(), chain.len() as u32);
            dead.extend(chain);
        }
    }

    // -- Internal helpers --

    #[inline]
    fn idx(&self, (col, row): Point) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    fn clear(&mut self, points: &[Point]) {
        for &p in points {
            let i = self.idx(p);
            self.cells[i] = None;
        }
    }
}

/// Text diagram with GTP column letters and rows numbered from the bottom.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for &c in GTP_COLUMNS.iter().take(self.cols as usize) {
            write!(f, " {}", c as char)?;
        }
        for row in 0..self.rows {
            write!(f, "\n{:2}", self.rows - row)?;
            for col in 0..self.cols {
                let ch = match self.stone_at((col, row)) {
                    Some(Stone::Black) => 'B',
                    Some(Stone::White) => 'W',
                    None => '+',
                };
                write!(f, " {ch}")?;
            }
        }
        Ok(())
    }
}
