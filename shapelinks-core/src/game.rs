//! Reference board: gravity grid with color and shape win lines

use crate::board::{compute_win_corridors, BoardError, GameBoard, GameResult};
use crate::pieces::{Move, PColor, PShape, Piece, Pos};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Board geometry and piece supply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub pieces_in_sequence: usize,
    /// Round pieces given to each player
    pub round_pieces: usize,
    /// Square pieces given to each player
    pub square_pieces: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 7,
            pieces_in_sequence: 4,
            round_pieces: 10,
            square_pieces: 11,
        }
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Game board (mutate in place, undo to restore)
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    pieces_in_sequence: usize,

    /// Cells, row-major with row 0 at the bottom
    cells: Vec<Option<Piece>>,

    /// Next free row per column
    heights: Vec<usize>,

    /// Pieces in hand, indexed [color][shape]
    counts: [[usize; 2]; 2],

    turn: PColor,
    history: Vec<Move>,
    corridors: Vec<Vec<Pos>>,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(config: &BoardConfig) -> Result<Self, BoardError> {
        let BoardConfig {
            rows,
            cols,
            pieces_in_sequence,
            round_pieces,
            square_pieces,
        } = *config;

        if rows == 0 || cols == 0 || pieces_in_sequence < 2 || pieces_in_sequence > rows.max(cols) {
            return Err(BoardError::InvalidDimensions {
                rows,
                cols,
                in_sequence: pieces_in_sequence,
            });
        }

        let per_player = [round_pieces, square_pieces];

        Ok(Self {
            rows,
            cols,
            pieces_in_sequence,
            cells: vec![None; rows * cols],
            heights: vec![0; cols],
            counts: [per_player, per_player],
            turn: PColor::White,
            history: Vec::new(),
            corridors: compute_win_corridors(rows, cols, pieces_in_sequence),
        })
    }

    /// Standard 6x7 board, four in a row
    pub fn standard() -> Self {
        let config = BoardConfig::default();
        Self {
            rows: config.rows,
            cols: config.cols,
            pieces_in_sequence: config.pieces_in_sequence,
            cells: vec![None; config.rows * config.cols],
            heights: vec![0; config.cols],
            counts: [[config.round_pieces, config.square_pieces]; 2],
            turn: PColor::White,
            history: Vec::new(),
            corridors: compute_win_corridors(config.rows, config.cols, config.pieces_in_sequence),
        }
    }

    /// Replay a sequence of moves from the starting position
    pub fn from_moves(config: &BoardConfig, moves: &[Move]) -> Result<Self, BoardError> {
        let mut board = Self::new(config)?;
        for mv in moves {
            board.do_move(mv.shape, mv.column)?;
        }
        Ok(board)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&h| h >= self.rows)
    }

    fn index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    // ========================================================================
    // WINNER DETECTION
    // ========================================================================

    /// Colors with a completed run, split into (shape claims, color claims)
    fn line_claims(&self) -> ([bool; 2], [bool; 2]) {
        let mut shape_claims = [false; 2];
        let mut color_claims = [false; 2];

        for corridor in &self.corridors {
            let mut color_run: Option<(PColor, usize)> = None;
            let mut shape_run: Option<(PShape, usize)> = None;

            for &pos in corridor {
                match self.piece_at(pos) {
                    Some(piece) => {
                        color_run = match color_run {
                            Some((c, n)) if c == piece.color => Some((c, n + 1)),
                            _ => Some((piece.color, 1)),
                        };
                        shape_run = match shape_run {
                            Some((s, n)) if s == piece.shape => Some((s, n + 1)),
                            _ => Some((piece.shape, 1)),
                        };

                        if let Some((c, n)) = color_run {
                            if n >= self.pieces_in_sequence {
                                color_claims[c.index()] = true;
                            }
                        }
                        if let Some((s, n)) = shape_run {
                            if n >= self.pieces_in_sequence {
                                shape_claims[s.owner().index()] = true;
                            }
                        }
                    }
                    None => {
                        color_run = None;
                        shape_run = None;
                    }
                }
            }
        }

        (shape_claims, color_claims)
    }
}

impl GameBoard for Board {
    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn pieces_in_sequence(&self) -> usize {
        self.pieces_in_sequence
    }

    fn piece_at(&self, pos: Pos) -> Option<Piece> {
        if pos.row >= self.rows || pos.col >= self.cols {
            return None;
        }
        self.cells[self.index(pos)]
    }

    fn win_corridors(&self) -> &[Vec<Pos>] {
        &self.corridors
    }

    fn piece_count(&self, color: PColor, shape: PShape) -> usize {
        self.counts[color.index()][shape.index()]
    }

    fn turn(&self) -> PColor {
        self.turn
    }

    fn is_column_full(&self, col: usize) -> bool {
        self.heights.get(col).map_or(true, |&h| h >= self.rows)
    }

    fn do_move(&mut self, shape: PShape, col: usize) -> Result<Pos, BoardError> {
        if col >= self.cols {
            return Err(BoardError::ColumnOutOfRange { col, cols: self.cols });
        }
        if self.heights[col] >= self.rows {
            return Err(BoardError::ColumnFull(col));
        }
        let color = self.turn;
        if self.counts[color.index()][shape.index()] == 0 {
            return Err(BoardError::NoPiecesLeft { color, shape });
        }

        let pos = Pos::new(self.heights[col], col);
        let idx = self.index(pos);
        self.cells[idx] = Some(Piece::new(color, shape));
        self.heights[col] += 1;
        self.counts[color.index()][shape.index()] -= 1;
        self.history.push(Move::new(col, shape));
        self.turn = color.other();

        Ok(pos)
    }

    fn undo_move(&mut self) -> Result<Move, BoardError> {
        let mv = self.history.pop().ok_or(BoardError::NothingToUndo)?;

        self.heights[mv.column] -= 1;
        let pos = Pos::new(self.heights[mv.column], mv.column);
        let idx = self.index(pos);
        let color = match self.cells[idx].take() {
            Some(piece) => piece.color,
            None => self.turn.other(),
        };
        self.counts[color.index()][mv.shape.index()] += 1;
        self.turn = color;

        Ok(mv)
    }

    fn result(&self) -> GameResult {
        let (shape_claims, color_claims) = self.line_claims();

        // A shape line beats a color line made by the same move
        let claims = if shape_claims.iter().any(|&c| c) {
            shape_claims
        } else {
            color_claims
        };

        match claims {
            [true, true] => GameResult::Draw,
            [true, false] => GameResult::WonBy(PColor::White),
            [false, true] => GameResult::WonBy(PColor::Red),
            [false, false] => {
                let in_hand: usize = self.counts[self.turn.index()].iter().sum();
                if self.is_full() || in_hand == 0 {
                    GameResult::Draw
                } else {
                    GameResult::InProgress
                }
            }
        }
    }
}

impl fmt::Display for Board {
    /// Top row first; `w`/`W` white round/square, `r`/`R` red round/square
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..self.rows).rev() {
            for col in 0..self.cols {
                let ch = match self.piece_at(Pos::new(row, col)) {
                    None => '.',
                    Some(Piece { color: PColor::White, shape: PShape::Round }) => 'w',
                    Some(Piece { color: PColor::White, shape: PShape::Square }) => 'W',
                    Some(Piece { color: PColor::Red, shape: PShape::Round }) => 'r',
                    Some(Piece { color: PColor::Red, shape: PShape::Square }) => 'R',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
