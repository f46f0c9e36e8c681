//! Corridor-sequence heuristic
//!
//! Slides a window of `pieces_in_sequence` cells along every win corridor and
//! rewards windows that can still become a line for one color or one shape.

use crate::board::GameBoard;
use crate::pieces::{PColor, PShape, Pos};

/// Score for 1, 2 and 3 pieces of one color in a window
const RUN_VALUES: [f32; 3] = [20.0, 80.0, 200.0];

/// Extra score for 1, 2 and 3 pieces of one shape
const SHAPE_BONUS: [f32; 3] = [5.0, 20.0, 50.0];

/// Piece tally for one window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct WindowCounts {
    white: usize,
    red: usize,
    round: usize,
    square: usize,
}

impl WindowCounts {
    fn is_empty(&self) -> bool {
        self.white + self.red == 0
    }

    /// Single-owner run along one dimension, if any
    fn color_run(&self) -> Option<(PColor, usize)> {
        match (self.white, self.red) {
            (n, 0) if n > 0 => Some((PColor::White, n)),
            (0, n) if n > 0 => Some((PColor::Red, n)),
            _ => None,
        }
    }

    fn shape_run(&self) -> Option<(PShape, usize)> {
        match (self.round, self.square) {
            (n, 0) if n > 0 => Some((PShape::Round, n)),
            (0, n) if n > 0 => Some((PShape::Square, n)),
            _ => None,
        }
    }
}

/// Threat counter over win corridors
#[derive(Clone, Debug)]
pub struct CorridorEvaluator {
    /// Multiplier applied to run values when the window can be completed now
    playable_factor: f32,
}

impl CorridorEvaluator {
    pub fn new(playable_factor: f32) -> Self {
        Self { playable_factor }
    }

    pub fn evaluate<B: GameBoard>(&self, board: &B, perspective: PColor) -> f32 {
        let k = board.pieces_in_sequence();
        let mut eval = 0.0f32;

        for corridor in board.win_corridors() {
            for window in corridor.windows(k) {
                let (counts, playable) = tally(board, window);
                if !counts.is_empty() {
                    eval += self.score_window(board, perspective, counts, playable);
                }
            }
        }

        eval
    }

    fn score_window<B: GameBoard>(
        &self,
        board: &B,
        perspective: PColor,
        counts: WindowCounts,
        playable: bool,
    ) -> f32 {
        let factor = if playable { self.playable_factor } else { 1.0 };
        let color_run = counts.color_run();
        let shape_run = counts.shape_run();

        // Both colors and both shapes present: dead window
        if color_run.is_none() && shape_run.is_none() {
            return 0.0;
        }

        let mut h = 0.0f32;

        if let Some((color, n)) = color_run {
            let value = run_value(n) * factor;
            h += if color == perspective { value } else { -value };
        }

        if let Some((shape, n)) = shape_run {
            // The run only matters if its owner can still drop that shape
            let owner = shape.owner();
            if board.piece_count(owner, shape) == 0 {
                return 0.0;
            }
            let value = run_value(n) * factor + shape_bonus(n);
            h += if owner == perspective { value } else { -value };
        }

        h
    }
}

/// Count pieces in `window` and check that every cell is supported from below
fn tally<B: GameBoard>(board: &B, window: &[Pos]) -> (WindowCounts, bool) {
    let mut counts = WindowCounts::default();
    let mut playable = true;

    for &pos in window {
        if pos.row > 0 && board.piece_at(Pos::new(pos.row - 1, pos.col)).is_none() {
            playable = false;
        }
        if let Some(piece) = board.piece_at(pos) {
            match piece.color {
                PColor::White => counts.white += 1,
                PColor::Red => counts.red += 1,
            }
            match piece.shape {
                PShape::Round => counts.round += 1,
                PShape::Square => counts.square += 1,
            }
        }
    }

    (counts, playable)
}

/// Escalating value for `n` pieces; longer windows reuse the top value
fn run_value(n: usize) -> f32 {
    RUN_VALUES[n.clamp(1, RUN_VALUES.len()) - 1]
}

fn shape_bonus(n: usize) -> f32 {
    SHAPE_BONUS[n.clamp(1, SHAPE_BONUS.len()) - 1]
}
