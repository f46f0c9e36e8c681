//! Zobrist position hashing
//!
//! One random key per (color, shape, square). A position's fingerprint is the
//! XOR of the keys of its occupied squares, so placing or removing a piece is a
//! single XOR ([`Zobrist::toggle`]).

use crate::board::GameBoard;
use crate::pieces::{Piece, Pos};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Exclusive upper bound of sampled keys. Keys stay below `i64::MAX`, matching
/// the legacy key sequence for a given seed.
const KEY_RANGE: u64 = i64::MAX as u64;

/// Zobrist key table for one board geometry
#[derive(Clone, Debug)]
pub struct Zobrist {
    rows: usize,
    cols: usize,
    /// Keys indexed by [color][shape][square]
    keys: [[Vec<u64>; 2]; 2],
}

impl Zobrist {
    /// Build a deterministic table for a `rows x cols` board
    pub fn new(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        Self::with_rng(rows, cols, &mut rng)
    }

    /// Build a table from OS entropy
    pub fn from_entropy(rows: usize, cols: usize) -> Self {
        let mut rng = ChaCha20Rng::from_entropy();
        Self::with_rng(rows, cols, &mut rng)
    }

    fn with_rng<R: RngCore>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let squares = rows * cols;

        // Fill order: color, then shape, then square
        let white_round = random_keys(rng, squares);
        let white_square = random_keys(rng, squares);
        let red_round = random_keys(rng, squares);
        let red_square = random_keys(rng, squares);
        let white = [white_round, white_square];
        let red = [red_round, red_square];

        Self {
            rows,
            cols,
            keys: [white, red],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Key for one piece standing on one square
    pub fn key(&self, piece: Piece, pos: Pos) -> u64 {
        self.keys[piece.color.index()][piece.shape.index()][pos.row * self.cols + pos.col]
    }

    /// Add or remove `piece` at `pos` from an existing fingerprint
    pub fn toggle(&self, hash: u64, piece: Piece, pos: Pos) -> u64 {
        hash ^ self.key(piece, pos)
    }

    /// Full recomputation from the board contents
    pub fn hash<B: GameBoard>(&self, board: &B) -> u64 {
        let mut hash = 0u64;
        for row in 0..board.rows() {
            for col in 0..board.cols() {
                let pos = Pos::new(row, col);
                if let Some(piece) = board.piece_at(pos) {
                    hash ^= self.key(piece, pos);
                }
            }
        }
        hash
    }
}

fn random_keys<R: RngCore>(rng: &mut R, count: usize) -> Vec<u64> {
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(random_key(rng));
    }
    keys
}

/// Uniform draw in `[0, KEY_RANGE)`, rejecting the biased tail of the u64 range
fn random_key<R: RngCore>(rng: &mut R) -> u64 {
    let limit = u64::MAX - ((u64::MAX % KEY_RANGE) + 1) % KEY_RANGE;
    loop {
        let candidate = rng.next_u64();
        if candidate <= limit {
            return candidate % KEY_RANGE;
        }
    }
}
