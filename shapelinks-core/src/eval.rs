//! Static position evaluation
//!
//! Three interchangeable heuristics, selected by [`HeuristicMode`]. All of them
//! score a non-terminal position from one color's perspective and are
//! antisymmetric: swapping the perspective negates the score.

mod corridor;

pub use corridor::CorridorEvaluator;

use crate::board::GameBoard;
use crate::pieces::{PColor, Pos};
use serde::{Deserialize, Serialize};

/// Center weights for the standard 6x7 board with four in a row
const STANDARD_MATRIX: [[f32; 7]; 6] = [
    [3.0, 4.0, 5.0, 7.0, 5.0, 4.0, 3.0],
    [4.0, 6.0, 8.0, 10.0, 8.0, 6.0, 4.0],
    [5.0, 8.0, 11.0, 13.0, 11.0, 8.0, 5.0],
    [5.0, 8.0, 11.0, 13.0, 11.0, 8.0, 5.0],
    [4.0, 6.0, 8.0, 10.0, 8.0, 6.0, 4.0],
    [3.0, 4.0, 5.0, 7.0, 5.0, 4.0, 3.0],
];

/// Heuristic selector, numbered as in agent setup strings
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeuristicMode {
    /// Threat counting over win corridors
    Corridor = 1,
    /// Fixed center-weighted cell matrix
    CenterMatrix = 2,
    /// Radial falloff from the board center
    Centroid = 3,
}

impl Default for HeuristicMode {
    fn default() -> Self {
        HeuristicMode::Centroid
    }
}

impl HeuristicMode {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(HeuristicMode::Corridor),
            2 => Some(HeuristicMode::CenterMatrix),
            3 => Some(HeuristicMode::Centroid),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Evaluator chosen at configuration time
#[derive(Clone, Debug)]
pub enum Evaluator {
    Corridor(CorridorEvaluator),
    CenterMatrix(WeightedEvaluator),
    Centroid(WeightedEvaluator),
}

impl Evaluator {
    /// Build the evaluator for `mode` on the geometry of `board`
    pub fn new<B: GameBoard>(mode: HeuristicMode, board: &B, playable_factor: f32) -> Self {
        match mode {
            HeuristicMode::Corridor => Evaluator::Corridor(CorridorEvaluator::new(playable_factor)),
            HeuristicMode::CenterMatrix => Evaluator::CenterMatrix(WeightedEvaluator::matrix(board)),
            HeuristicMode::Centroid => Evaluator::Centroid(WeightedEvaluator::centroid(board)),
        }
    }

    pub fn mode(&self) -> HeuristicMode {
        match self {
            Evaluator::Corridor(_) => HeuristicMode::Corridor,
            Evaluator::CenterMatrix(_) => HeuristicMode::CenterMatrix,
            Evaluator::Centroid(_) => HeuristicMode::Centroid,
        }
    }

    /// Score `board` for `perspective`; only meaningful on non-terminal positions
    pub fn evaluate<B: GameBoard>(&self, board: &B, perspective: PColor) -> f32 {
        match self {
            Evaluator::Corridor(e) => e.evaluate(board, perspective),
            Evaluator::CenterMatrix(e) => e.evaluate(board, perspective),
            Evaluator::Centroid(e) => e.evaluate(board, perspective),
        }
    }
}

// ============================================================================
// CELL-WEIGHT EVALUATORS
// ============================================================================

/// Per-cell weights summed with a sign for color and again for shape
#[derive(Clone, Debug)]
pub struct WeightedEvaluator {
    cols: usize,
    weights: Vec<f32>,
    /// Add row + col to shape contributions
    index_bias: bool,
}

impl WeightedEvaluator {
    /// Center-weighted matrix. The standard board uses the classical table;
    /// other geometries count the win windows through each cell, which gives
    /// the same table on 6x7.
    pub fn matrix<B: GameBoard>(board: &B) -> Self {
        let (rows, cols) = (board.rows(), board.cols());
        let weights = if (rows, cols, board.pieces_in_sequence()) == (6, 7, 4) {
            STANDARD_MATRIX.iter().flatten().copied().collect()
        } else {
            window_counts(board)
        };
        Self {
            cols,
            weights,
            index_bias: true,
        }
    }

    /// `max_corner_distance - distance(cell, center)` for every cell
    pub fn centroid<B: GameBoard>(board: &B) -> Self {
        let (rows, cols) = (board.rows(), board.cols());
        let center_row = (rows / 2) as f32;
        let center_col = (cols / 2) as f32;
        let max_points = distance(center_row, center_col, 0.0, 0.0);

        let mut weights = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                weights.push(max_points - distance(center_row, center_col, row as f32, col as f32));
            }
        }

        Self {
            cols,
            weights,
            index_bias: false,
        }
    }

    pub fn weight(&self, pos: Pos) -> f32 {
        self.weights[pos.row * self.cols + pos.col]
    }

    pub fn evaluate<B: GameBoard>(&self, board: &B, perspective: PColor) -> f32 {
        let own_shape = perspective.shape();
        let mut h = 0.0f32;

        for row in 0..board.rows() {
            for col in 0..board.cols() {
                let pos = Pos::new(row, col);
                let piece = match board.piece_at(pos) {
                    Some(p) => p,
                    None => continue,
                };
                let w = self.weight(pos);

                if piece.color == perspective {
                    h += w;
                } else {
                    h -= w;
                }

                let shape_w = if self.index_bias {
                    w + (row + col) as f32
                } else {
                    w
                };
                if piece.shape == own_shape {
                    h += shape_w;
                } else {
                    h -= shape_w;
                }
            }
        }

        h
    }
}

fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

/// Number of win windows covering each cell
fn window_counts<B: GameBoard>(board: &B) -> Vec<f32> {
    let cols = board.cols();
    let k = board.pieces_in_sequence();
    let mut counts = vec![0.0f32; board.rows() * cols];
    for corridor in board.win_corridors() {
        for window in corridor.windows(k) {
            for pos in window {
                counts[pos.row * cols + pos.col] += 1.0;
            }
        }
    }
    counts
}

// ============================================================================
// TESTS
// ============================================================================
