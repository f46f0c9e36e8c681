//! Piece colors, shapes and moves

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Player color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PColor {
    White = 0,
    Red = 1,
}

impl PColor {
    pub fn other(self) -> Self {
        match self {
            PColor::White => PColor::Red,
            PColor::Red => PColor::White,
        }
    }

    /// The shape this color plays for: White wins with rounds, Red with squares
    pub fn shape(self) -> PShape {
        match self {
            PColor::White => PShape::Round,
            PColor::Red => PShape::Square,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PColor::White => write!(f, "White"),
            PColor::Red => write!(f, "Red"),
        }
    }
}

/// Piece shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PShape {
    Round = 0,
    Square = 1,
}

impl PShape {
    /// Enumeration order used by move generation
    pub const ALL: [PShape; 2] = [PShape::Round, PShape::Square];

    pub fn other(self) -> Self {
        match self {
            PShape::Round => PShape::Square,
            PShape::Square => PShape::Round,
        }
    }

    /// The color that wins with a run of this shape
    pub fn owner(self) -> PColor {
        match self {
            PShape::Round => PColor::White,
            PShape::Square => PColor::Red,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A piece on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: PColor,
    pub shape: PShape,
}

impl Piece {
    pub const fn new(color: PColor, shape: PShape) -> Self {
        Self { color, shape }
    }
}

/// Board cell, row 0 is the bottom row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A placement: drop a piece of `shape` into `column`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub column: usize,
    pub shape: PShape,
}

impl Move {
    pub const fn new(column: usize, shape: PShape) -> Self {
        Self { column, shape }
    }

    /// Compact `<column><r|s>` form, the inverse of `FromStr`
    pub fn notation(&self) -> String {
        let shape = match self.shape {
            PShape::Round => 'r',
            PShape::Square => 's',
        };
        format!("{}{}", self.column, shape)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.shape {
            PShape::Round => "round",
            PShape::Square => "square",
        };
        write!(f, "{} piece at column {}", shape, self.column)
    }
}

/// Error parsing the compact `<column><r|s>` move notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid move '{0}': expected <column><r|s>, e.g. 3r")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Parse compact notation: column index followed by `r` (round) or `s` (square)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseMoveError(s.to_string());
        let shape = match s.chars().last().ok_or_else(err)? {
            'r' | 'R' => PShape::Round,
            's' | 'S' => PShape::Square,
            _ => return Err(err()),
        };
        let column = s[..s.len() - 1].parse::<usize>().map_err(|_| err())?;
        Ok(Move::new(column, shape))
    }
}
