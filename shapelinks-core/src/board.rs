//! Board adapter interface and grid geometry
//!
//! The search core only talks to a board through [`GameBoard`]: occupancy,
//! win corridors, remaining pieces, apply/undo with strict stack discipline
//! and terminal-state detection. [`crate::game::Board`] is the reference
//! implementation.

use crate::pieces::{Move, PColor, PShape, Piece, Pos};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game result as seen by the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    InProgress,
    WonBy(PColor),
    Draw,
}

impl GameResult {
    pub fn is_terminal(self) -> bool {
        self != GameResult::InProgress
    }
}

/// Errors reported by board mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("column {col} is out of range (board has {cols} columns)")]
    ColumnOutOfRange { col: usize, cols: usize },
    #[error("column {0} is full")]
    ColumnFull(usize),
    #[error("{color} has no {shape:?} pieces left")]
    NoPiecesLeft { color: PColor, shape: PShape },
    #[error("no move to undo")]
    NothingToUndo,
    #[error("invalid board dimensions {rows}x{cols} with {in_sequence} in a row")]
    InvalidDimensions {
        rows: usize,
        cols: usize,
        in_sequence: usize,
    },
}

/// Narrow board interface consumed by the hasher, evaluators and search
pub trait GameBoard {
    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// Number of aligned pieces needed to win
    fn pieces_in_sequence(&self) -> usize;

    fn piece_at(&self, pos: Pos) -> Option<Piece>;

    /// Maximal straight runs of cells (rows, columns, diagonals) long enough to hold a win
    fn win_corridors(&self) -> &[Vec<Pos>];

    /// Pieces of `shape` that `color` still has in hand
    fn piece_count(&self, color: PColor, shape: PShape) -> usize;

    /// Color to move
    fn turn(&self) -> PColor;

    fn is_column_full(&self, col: usize) -> bool;

    /// Drop a piece of `shape` for the side to move; returns the cell it landed on
    fn do_move(&mut self, shape: PShape, col: usize) -> Result<Pos, BoardError>;

    /// Take back exactly the last applied move
    fn undo_move(&mut self) -> Result<Move, BoardError>;

    fn result(&self) -> GameResult;

    /// First legal move in column-major, shape-minor order
    fn first_legal_move(&self) -> Option<Move> {
        let turn = self.turn();
        (0..self.cols())
            .filter(|&col| !self.is_column_full(col))
            .flat_map(|col| PShape::ALL.into_iter().map(move |shape| Move::new(col, shape)))
            .find(|mv| self.piece_count(turn, mv.shape) > 0)
    }
}

/// Corridor directions as (row step, col step): horizontal, vertical, both diagonals
const CORRIDOR_STEPS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Enumerate every maximal straight line of at least `min_len` cells
pub fn compute_win_corridors(rows: usize, cols: usize, min_len: usize) -> Vec<Vec<Pos>> {
    let mut corridors = Vec::new();

    for &(dr, dc) in &CORRIDOR_STEPS {
        for row in 0..rows as isize {
            for col in 0..cols as isize {
                // Only start at cells whose predecessor is off the board
                let (prev_r, prev_c) = (row - dr, col - dc);
                if in_bounds(prev_r, prev_c, rows, cols) {
                    continue;
                }

                let mut line = Vec::new();
                let (mut r, mut c) = (row, col);
                while in_bounds(r, c, rows, cols) {
                    line.push(Pos::new(r as usize, c as usize));
                    r += dr;
                    c += dc;
                }

                if line.len() >= min_len {
                    corridors.push(line);
                }
            }
        }
    }

    corridors
}

fn in_bounds(row: isize, col: isize, rows: usize, cols: usize) -> bool {
    row >= 0 && col >= 0 && (row as usize) < rows && (col as usize) < cols
}
