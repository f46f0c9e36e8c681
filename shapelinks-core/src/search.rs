//! Negamax search with alpha-beta pruning, transposition cache and
//! time-bounded iterative deepening
//!
//! Scores are from the perspective of the side to move: `+inf` is a won
//! position, `-inf` a lost one, `0` a draw. Interruption (cancellation or the
//! deadline) unwinds the whole search as `Err(Halt)`; every board mutation is
//! undone on the way out by [`Applied`].

use std::ops::{Deref, DerefMut};

use thiserror::Error;
use tracing::{debug, warn};

use crate::board::{BoardError, GameBoard, GameResult};
use crate::control::{CancelToken, Deadline};
use crate::eval::Evaluator;
use crate::pieces::{Move, PColor, PShape, Piece, Pos};
use crate::tt::{Bound, TranspositionTable};
use crate::zobrist::Zobrist;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Best move and score of one searched node
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchResult {
    /// `None` for leaves, cache answers and interrupted searches
    pub best_move: Option<Move>,
    pub score: f32,
}

impl SearchResult {
    fn scored(score: f32) -> Self {
        Self {
            best_move: None,
            score,
        }
    }

    /// Sentinel for an interrupted search: no move, NaN score
    pub fn interrupted() -> Self {
        Self {
            best_move: None,
            score: f32::NAN,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.score.is_nan()
    }
}

/// Counters for one decision
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered (including cache answers and leaves)
    pub nodes: u64,
    /// Probes that found an entry deep enough to use
    pub tt_hits: u64,
    /// Nodes answered straight from the cache
    pub tt_cutoffs: u64,
    /// Deepest fully completed root pass
    pub completed_depth: u32,
}

/// How a top-level decision ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every requested pass finished
    Completed,
    /// The deadline stopped deepening
    TimedOut,
    /// The cancel signal was raised; the caller must not use the move
    Cancelled,
}

/// Result of a top-level decision
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub best_move: Option<Move>,
    /// Score of the last completed pass, NaN when none completed
    pub score: f32,
    pub outcome: Outcome,
    pub stats: SearchStats,
}

/// Which child keeps the best slot when scores are equal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TieBreak {
    /// Only a strictly better child replaces the incumbent
    First,
    /// An equal child replaces the incumbent
    Last,
}

/// Why a search stopped early
#[derive(Debug, Error)]
enum Halt {
    #[error("search cancelled")]
    Cancelled,
    #[error("deadline reached")]
    TimedOut,
    #[error(transparent)]
    Board(#[from] BoardError),
}

// ============================================================================
// SCOPED MOVE
// ============================================================================

/// A move applied to the board for the lifetime of this guard
struct Applied<'b, B: GameBoard> {
    board: &'b mut B,
}

impl<'b, B: GameBoard> Applied<'b, B> {
    fn new(board: &'b mut B, mv: Move) -> Result<(Self, Pos), BoardError> {
        let pos = board.do_move(mv.shape, mv.column)?;
        Ok((Self { board }, pos))
    }
}

impl<B: GameBoard> Deref for Applied<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.board
    }
}

impl<B: GameBoard> DerefMut for Applied<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.board
    }
}

impl<B: GameBoard> Drop for Applied<'_, B> {
    fn drop(&mut self) {
        if let Err(err) = self.board.undo_move() {
            warn!(%err, "failed to undo searched move");
        }
    }
}

// ============================================================================
// SEARCHER
// ============================================================================

/// Search state for one top-level decision
pub struct Searcher<'a> {
    zobrist: &'a Zobrist,
    tt: &'a mut TranspositionTable,
    evaluator: &'a Evaluator,
    cancel: &'a CancelToken,
    deadline: &'a Deadline,
    stats: SearchStats,
}

impl<'a> Searcher<'a> {
    pub fn new(
        zobrist: &'a Zobrist,
        tt: &'a mut TranspositionTable,
        evaluator: &'a Evaluator,
        cancel: &'a CancelToken,
        deadline: &'a Deadline,
    ) -> Self {
        Self {
            zobrist,
            tt,
            evaluator,
            cancel,
            deadline,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Negamax from `mover`'s perspective with window `(alpha, beta)`.
    /// Returns [`SearchResult::interrupted`] if cancelled or out of time.
    pub fn search<B: GameBoard>(
        &mut self,
        board: &mut B,
        mover: PColor,
        depth: u32,
        alpha: f32,
        beta: f32,
    ) -> SearchResult {
        let key = self.zobrist.hash(board);
        match self.negamax(board, key, mover, depth, alpha, beta) {
            Ok(result) => result,
            Err(halt) => {
                debug!(%halt, depth, "search interrupted");
                SearchResult::interrupted()
            }
        }
    }

    /// Deepen from depth 1 until `max_depth`, the deadline, or a proven result.
    /// A `max_depth` of 0 still runs the depth-1 pass.
    pub fn iterative_deepening<B: GameBoard>(&mut self, board: &mut B, max_depth: u32) -> Decision {
        let max_depth = max_depth.max(1);
        let key = self.zobrist.hash(board);
        let mut best: Option<SearchResult> = None;
        let mut outcome = Outcome::Completed;
        let mut depth = 1;

        while depth <= max_depth {
            if self.deadline.expired() {
                outcome = Outcome::TimedOut;
                break;
            }

            match self.root_pass(board, key, depth) {
                Ok(result) => {
                    self.stats.completed_depth = depth;
                    debug!(
                        depth,
                        score = result.score,
                        best = ?result.best_move,
                        nodes = self.stats.nodes,
                        "completed depth"
                    );
                    best = Some(result);
                    if result.best_move.is_none() || result.score.is_infinite() {
                        // Game over or forced result: deeper passes cannot change the value
                        break;
                    }
                }
                Err(Halt::Cancelled) => return self.cancelled(),
                Err(Halt::TimedOut) => {
                    outcome = Outcome::TimedOut;
                    break;
                }
                Err(Halt::Board(err)) => {
                    warn!(%err, depth, "board rejected a searched move");
                    break;
                }
            }

            depth += 1;
        }

        self.finish(board, best, outcome)
    }

    /// A single root pass at `depth`, at least one ply
    pub fn fixed_depth<B: GameBoard>(&mut self, board: &mut B, depth: u32) -> Decision {
        let depth = depth.max(1);
        let key = self.zobrist.hash(board);
        let (best, outcome) = match self.root_pass(board, key, depth) {
            Ok(result) => {
                self.stats.completed_depth = depth;
                (Some(result), Outcome::Completed)
            }
            Err(Halt::Cancelled) => return self.cancelled(),
            Err(Halt::TimedOut) => (None, Outcome::TimedOut),
            Err(Halt::Board(err)) => {
                warn!(%err, depth, "board rejected a searched move");
                (None, Outcome::Completed)
            }
        };
        self.finish(board, best, outcome)
    }

    // ========================================================================
    // NODE SEARCH
    // ========================================================================

    fn negamax<B: GameBoard>(
        &mut self,
        board: &mut B,
        key: u64,
        mover: PColor,
        depth: u32,
        mut alpha: f32,
        mut beta: f32,
    ) -> Result<SearchResult, Halt> {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        self.stats.nodes += 1;

        let original_alpha = alpha;

        if let Some(entry) = self.tt.probe(key) {
            if entry.usable_at(depth) {
                self.stats.tt_hits += 1;
                match entry.bound {
                    Bound::Exact => {
                        self.stats.tt_cutoffs += 1;
                        return Ok(SearchResult::scored(entry.score));
                    }
                    Bound::LowerBound => alpha = alpha.max(entry.score),
                    Bound::UpperBound => beta = beta.min(entry.score),
                }
                if alpha >= beta {
                    self.stats.tt_cutoffs += 1;
                    return Ok(SearchResult::scored(entry.score));
                }
            }
        }

        if let Some(score) = terminal_score(board, mover) {
            return Ok(SearchResult::scored(score));
        }

        if depth == 0 {
            return Ok(SearchResult::scored(self.evaluator.evaluate(board, mover)));
        }

        let best = self.expand(board, key, mover, depth, alpha, beta, TieBreak::Last)?;

        let bound = Bound::classify(best.score, original_alpha, beta);
        self.tt.store_if_not_shallower(key, depth, bound, best.score);

        Ok(best)
    }

    /// One root pass: the cache can only narrow the window, never answer it.
    /// The first child reaching the best score is kept: under fail-soft
    /// bounds a later equal score may only be an upper bound.
    fn root_pass<B: GameBoard>(&mut self, board: &mut B, key: u64, depth: u32) -> Result<SearchResult, Halt> {
        let mover = board.turn();
        if let Some(score) = terminal_score(board, mover) {
            return Ok(SearchResult::scored(score));
        }

        let original_alpha = f32::NEG_INFINITY;
        let mut alpha = original_alpha;
        let mut beta = f32::INFINITY;

        if let Some(entry) = self.tt.probe(key) {
            if entry.usable_at(depth) {
                self.stats.tt_hits += 1;
                match entry.bound {
                    Bound::LowerBound => alpha = alpha.max(entry.score),
                    Bound::UpperBound => beta = beta.min(entry.score),
                    Bound::Exact => {}
                }
            }
        }

        let best = self.expand(board, key, mover, depth, alpha, beta, TieBreak::First)?;

        let bound = Bound::classify(best.score, original_alpha, beta);
        self.tt.store_if_absent(key, depth, bound, best.score);

        Ok(best)
    }

    /// Search every child in column-major, shape-minor order.
    /// Stops as soon as `alpha >= beta`.
    #[allow(clippy::too_many_arguments)]
    fn expand<B: GameBoard>(
        &mut self,
        board: &mut B,
        key: u64,
        mover: PColor,
        depth: u32,
        mut alpha: f32,
        beta: f32,
        ties: TieBreak,
    ) -> Result<SearchResult, Halt> {
        let mut best = SearchResult::scored(f32::NEG_INFINITY);

        for col in 0..board.cols() {
            self.checkpoint()?;
            if board.is_column_full(col) {
                continue;
            }

            for shape in PShape::ALL {
                self.checkpoint()?;
                if board.piece_count(mover, shape) == 0 {
                    continue;
                }

                let mv = Move::new(col, shape);
                let score = {
                    let (mut child, pos) = Applied::new(board, mv)?;
                    let child_key = self.zobrist.toggle(key, Piece::new(mover, shape), pos);
                    -self
                        .negamax(&mut *child, child_key, mover.other(), depth - 1, -beta, -alpha)?
                        .score
                };

                let replace = best.best_move.is_none()
                    || match ties {
                        TieBreak::First => score > best.score,
                        TieBreak::Last => score >= best.score,
                    };
                if replace {
                    best = SearchResult {
                        best_move: Some(mv),
                        score,
                    };
                }
                if best.score > alpha {
                    alpha = best.score;
                }
                if alpha >= beta {
                    return Ok(best);
                }
            }
        }

        Ok(best)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// The single interruption point, run before every column and shape
    fn checkpoint(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            Err(Halt::Cancelled)
        } else if self.deadline.expired() {
            Err(Halt::TimedOut)
        } else {
            Ok(())
        }
    }

    fn cancelled(&self) -> Decision {
        debug!(nodes = self.stats.nodes, "decision cancelled");
        Decision {
            best_move: None,
            score: f32::NAN,
            outcome: Outcome::Cancelled,
            stats: self.stats,
        }
    }

    /// Fall back to the first legal move when no pass completed
    fn finish<B: GameBoard>(&self, board: &B, best: Option<SearchResult>, outcome: Outcome) -> Decision {
        let (best_move, score) = match best {
            Some(result) => (result.best_move, result.score),
            None => {
                let fallback = board.first_legal_move();
                if fallback.is_some() {
                    warn!(?fallback, ?outcome, "no completed search pass, playing first legal move");
                }
                (fallback, f32::NAN)
            }
        };

        Decision {
            best_move,
            score,
            outcome,
            stats: self.stats,
        }
    }
}

/// Score of a finished game for `mover`, `None` while it is in progress
fn terminal_score<B: GameBoard>(board: &B, mover: PColor) -> Option<f32> {
    match board.result() {
        GameResult::WonBy(winner) if winner == mover => Some(f32::INFINITY),
        GameResult::WonBy(_) => Some(f32::NEG_INFINITY),
        GameResult::Draw => Some(0.0),
        GameResult::InProgress => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ManualClock;
    use crate::eval::HeuristicMode;
    use crate::game::{Board, BoardConfig};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::Arc;
    use std::time::Duration;

    /// Full 4x4 board, three in a row, no line of any color or shape
    const DRAW_MOVES: [&str; 16] = [
        "0r", "2r", "1s", "3s", "2r", "0r", "3s", "1s", "0s", "2s", "1r", "3r", "2s", "0s", "3r", "1r",
    ];

    fn small_config() -> BoardConfig {
        BoardConfig {
            rows: 4,
            cols: 4,
            pieces_in_sequence: 3,
            round_pieces: 4,
            square_pieces: 4,
        }
    }

    fn board_from(config: &BoardConfig, moves: &[&str]) -> Board {
        let moves: Vec<Move> = moves.iter().map(|m| m.parse().unwrap()).collect();
        Board::from_moves(config, &moves).unwrap()
    }

    /// White has three rounds on the bottom row; column 3 wins
    fn white_to_win() -> Board {
        board_from(
            &BoardConfig::default(),
            &["0r", "6s", "1r", "6s", "2r", "5s"],
        )
    }

    struct Fixture {
        zobrist: Zobrist,
        tt: TranspositionTable,
        evaluator: Evaluator,
        cancel: CancelToken,
        deadline: Deadline,
    }

    impl Fixture {
        fn new<B: GameBoard>(board: &B, mode: HeuristicMode) -> Self {
            Self {
                zobrist: Zobrist::new(board.rows(), board.cols(), 42),
                tt: TranspositionTable::new(),
                evaluator: Evaluator::new(mode, board, 4.0),
                cancel: CancelToken::new(),
                deadline: Deadline::unbounded(),
            }
        }

        fn searcher(&mut self) -> Searcher<'_> {
            Searcher::new(
                &self.zobrist,
                &mut self.tt,
                &self.evaluator,
                &self.cancel,
                &self.deadline,
            )
        }
    }

    /// Plain negamax without pruning or cache
    fn full_width(board: &mut Board, evaluator: &Evaluator, mover: PColor, depth: u32) -> f32 {
        match board.result() {
            GameResult::WonBy(w) if w == mover => return f32::INFINITY,
            GameResult::WonBy(_) => return f32::NEG_INFINITY,
            GameResult::Draw => return 0.0,
            GameResult::InProgress => {}
        }
        if depth == 0 {
            return evaluator.evaluate(board, mover);
        }
        let mut best = f32::NEG_INFINITY;
        for col in 0..board.cols() {
            if board.is_column_full(col) {
                continue;
            }
            for shape in PShape::ALL {
                if board.piece_count(mover, shape) == 0 {
                    continue;
                }
                board.do_move(shape, col).unwrap();
                let score = -full_width(board, evaluator, mover.other(), depth - 1);
                board.undo_move().unwrap();
                best = best.max(score);
            }
        }
        best
    }

    /// Full-width value of playing `mv`, from the mover's side
    fn child_value(board: &mut Board, evaluator: &Evaluator, mv: Move, depth: u32) -> f32 {
        let mover = board.turn();
        board.do_move(mv.shape, mv.column).unwrap();
        let score = -full_width(board, evaluator, mover.other(), depth - 1);
        board.undo_move().unwrap();
        score
    }

    /// Minimax with a fixed point of view: maximise on `side`'s turns, minimise otherwise
    fn minimax(board: &mut Board, evaluator: &Evaluator, side: PColor, depth: u32) -> f32 {
        match board.result() {
            GameResult::WonBy(w) if w == side => return f32::INFINITY,
            GameResult::WonBy(_) => return f32::NEG_INFINITY,
            GameResult::Draw => return 0.0,
            GameResult::InProgress => {}
        }
        if depth == 0 {
            return evaluator.evaluate(board, side);
        }
        let turn = board.turn();
        let maximising = turn == side;
        let mut best = if maximising { f32::NEG_INFINITY } else { f32::INFINITY };
        for mv in legal_moves(board) {
            board.do_move(mv.shape, mv.column).unwrap();
            let score = minimax(board, evaluator, side, depth - 1);
            board.undo_move().unwrap();
            best = if maximising { best.max(score) } else { best.min(score) };
        }
        best
    }

    fn legal_moves(board: &Board) -> Vec<Move> {
        let turn = board.turn();
        let mut moves = Vec::new();
        for col in 0..board.cols() {
            if board.is_column_full(col) {
                continue;
            }
            for shape in PShape::ALL {
                if board.piece_count(turn, shape) > 0 {
                    moves.push(Move::new(col, shape));
                }
            }
        }
        moves
    }

    /// Up to `plies` random moves, stopping at a finished game
    fn random_position(config: &BoardConfig, plies: usize, rng: &mut ChaCha8Rng) -> Board {
        let mut board = Board::new(config).unwrap();
        for _ in 0..plies {
            if board.result().is_terminal() {
                break;
            }
            let mv = *legal_moves(&board).choose(rng).unwrap();
            board.do_move(mv.shape, mv.column).unwrap();
        }
        board
    }

    #[test]
    fn test_finds_immediate_win() {
        let mut board = white_to_win();
        let mut fx = Fixture::new(&board, HeuristicMode::Corridor);
        for depth in [1, 2, 3] {
            let result = fx.searcher().search(&mut board, PColor::White, depth, f32::NEG_INFINITY, f32::INFINITY);
            assert_eq!(result.score, f32::INFINITY, "depth {}", depth);
            let mv = result.best_move.unwrap();
            assert_eq!(mv.column, 3);

            board.do_move(mv.shape, mv.column).unwrap();
            assert_eq!(board.result(), GameResult::WonBy(PColor::White));
            board.undo_move().unwrap();
        }
    }

    #[test]
    fn test_board_restored_after_search() {
        let mut board = white_to_win();
        let before = board.to_string();
        let history = board.history().to_vec();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        fx.searcher().search(&mut board, PColor::White, 3, f32::NEG_INFINITY, f32::INFINITY);
        assert_eq!(board.to_string(), before);
        assert_eq!(board.history(), history.as_slice());
    }

    #[test]
    fn test_full_board_draw_scores_zero() {
        let mut board = board_from(&small_config(), &DRAW_MOVES);
        assert_eq!(board.result(), GameResult::Draw);

        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let turn = board.turn();
        let result = fx.searcher().search(&mut board, turn, 0, f32::NEG_INFINITY, f32::INFINITY);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.best_move, None);
    }

    #[test]
    fn test_negamax_symmetry_at_cutoff() {
        let mut board = board_from(&BoardConfig::default(), &["3r", "3s", "2s", "4r", "2r"]);
        for mode in [HeuristicMode::Corridor, HeuristicMode::CenterMatrix, HeuristicMode::Centroid] {
            let mut fx = Fixture::new(&board, mode);
            let white = fx.searcher().search(&mut board, PColor::White, 0, f32::NEG_INFINITY, f32::INFINITY);
            let red = fx.searcher().search(&mut board, PColor::Red, 0, f32::NEG_INFINITY, f32::INFINITY);
            assert_eq!(white.score, -red.score, "{:?}", mode);
        }
    }

    #[test]
    fn test_negamax_symmetry_below_the_root() {
        let mut board = board_from(&small_config(), &["1r", "2s", "0s"]);
        let mover = board.turn();
        for mode in [HeuristicMode::Corridor, HeuristicMode::CenterMatrix, HeuristicMode::Centroid] {
            for depth in [2, 3] {
                let mut fx = Fixture::new(&board, mode);
                fx.tt = TranspositionTable::disabled();
                let score = fx
                    .searcher()
                    .search(&mut board, mover, depth, f32::NEG_INFINITY, f32::INFINITY)
                    .score;

                let own = minimax(&mut board, &fx.evaluator, mover, depth);
                let opponent = minimax(&mut board, &fx.evaluator, mover.other(), depth);
                assert_eq!(score, own, "{:?} depth {}", mode, depth);
                assert_eq!(score, -opponent, "{:?} depth {}", mode, depth);
            }
        }
    }

    #[test]
    fn test_alpha_beta_matches_full_width() {
        let config = small_config();
        for (moves, depth) in [(&["1r", "2s"][..], 4), (&["0r", "1s", "1r", "2s"][..], 5)] {
            for mode in [HeuristicMode::Corridor, HeuristicMode::Centroid] {
                let mut board = board_from(&config, moves);
                let mut fx = Fixture::new(&board, mode);
                fx.tt = TranspositionTable::disabled();

                let mover = board.turn();
                let expected = full_width(&mut board, &fx.evaluator, mover, depth);
                let result = fx.searcher().search(&mut board, mover, depth, f32::NEG_INFINITY, f32::INFINITY);
                assert_eq!(result.score, expected, "{:?} {:?}", moves, mode);
                assert!(result.best_move.is_some());

                let decision = fx.searcher().fixed_depth(&mut board, depth);
                assert_eq!(decision.score, expected, "{:?} {:?}", moves, mode);
                let chosen = decision.best_move.unwrap();
                assert_eq!(child_value(&mut board, &fx.evaluator, chosen, depth), expected);
            }
        }
    }

    #[test]
    fn test_root_move_is_as_good_as_full_width() {
        // Children that fail low report upper bounds; none of them may
        // displace a move that really reaches the best score
        let config = small_config();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        for _ in 0..15 {
            let mut board = random_position(&config, 4, &mut rng);
            if board.result().is_terminal() {
                continue;
            }
            for mode in [HeuristicMode::Corridor, HeuristicMode::CenterMatrix, HeuristicMode::Centroid] {
                for depth in [2, 3, 4] {
                    let mut fx = Fixture::new(&board, mode);
                    fx.tt = TranspositionTable::disabled();
                    let mover = board.turn();
                    let expected = full_width(&mut board, &fx.evaluator, mover, depth);

                    let decision = fx.searcher().fixed_depth(&mut board, depth);
                    assert_eq!(decision.score, expected);
                    let chosen = decision.best_move.unwrap();
                    assert_eq!(
                        child_value(&mut board, &fx.evaluator, chosen, depth),
                        expected,
                        "{:?} depth {} chose {} on\n{}",
                        mode,
                        depth,
                        chosen,
                        board
                    );
                }
            }
        }
    }

    #[test]
    fn test_cache_does_not_change_value() {
        let config = small_config();
        let mut board = board_from(&config, &["1r", "2s", "0s"]);
        let mover = board.turn();

        let mut with_cache = Fixture::new(&board, HeuristicMode::Corridor);
        let mut without_cache = Fixture::new(&board, HeuristicMode::Corridor);
        without_cache.tt = TranspositionTable::disabled();

        let cached = with_cache.searcher().search(&mut board, mover, 6, f32::NEG_INFINITY, f32::INFINITY);
        let plain = without_cache.searcher().search(&mut board, mover, 6, f32::NEG_INFINITY, f32::INFINITY);

        assert_eq!(cached.score, plain.score);
        assert!(!with_cache.tt.is_empty());
        assert!(without_cache.tt.is_empty());

        let mut with_cache = Fixture::new(&board, HeuristicMode::Corridor);
        let cached = with_cache.searcher().fixed_depth(&mut board, 6);
        let plain = without_cache.searcher().fixed_depth(&mut board, 6);
        assert_eq!(cached.best_move, plain.best_move);
        assert_eq!(cached.score, plain.score);
    }

    #[test]
    fn test_exhaustive_endgame_with_and_without_cache() {
        // Ten pieces down; depth 6 reaches the end of every line
        let config = small_config();
        let mut board = board_from(&config, &DRAW_MOVES[..10]);
        let mover = board.turn();

        let mut with_cache = Fixture::new(&board, HeuristicMode::Centroid);
        let mut without_cache = Fixture::new(&board, HeuristicMode::Centroid);
        without_cache.tt = TranspositionTable::disabled();

        let cached = with_cache.searcher().search(&mut board, mover, 6, f32::NEG_INFINITY, f32::INFINITY);
        let plain = without_cache.searcher().search(&mut board, mover, 6, f32::NEG_INFINITY, f32::INFINITY);

        assert_eq!(cached.score, plain.score);
        assert_eq!(board.move_count(), 10);
    }

    #[test]
    fn test_cache_entry_trusted_only_when_deep_enough() {
        let mut board = board_from(&small_config(), &["1r", "2s"]);
        let mover = board.turn();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let key = fx.zobrist.hash(&board);
        fx.tt.store(key, 3, Bound::Exact, 50.0);

        // Stored depth 3 answers a depth-2 probe without expansion
        let mut searcher = fx.searcher();
        let result = searcher.search(&mut board, mover, 2, f32::NEG_INFINITY, f32::INFINITY);
        assert_eq!(result.score, 50.0);
        assert_eq!(result.best_move, None);
        assert_eq!(searcher.stats().nodes, 1);
        assert_eq!(searcher.stats().tt_cutoffs, 1);

        // A depth-5 probe ignores it and searches
        let mut searcher = fx.searcher();
        let result = searcher.search(&mut board, mover, 5, f32::NEG_INFINITY, f32::INFINITY);
        assert!(searcher.stats().nodes > 1);
        assert!(result.best_move.is_some());
        assert_eq!(fx.tt.probe(key).unwrap().depth, 5);
    }

    #[test]
    fn test_lower_bound_entry_prunes_when_window_closes() {
        let mut board = board_from(&small_config(), &["1r"]);
        let mover = board.turn();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let key = fx.zobrist.hash(&board);
        fx.tt.store(key, 4, Bound::LowerBound, 10.0);

        let mut searcher = fx.searcher();
        let result = searcher.search(&mut board, mover, 2, -5.0, 5.0);
        assert_eq!(result.score, 10.0);
        assert_eq!(searcher.stats().nodes, 1);
    }

    #[test]
    fn test_cancelled_search_returns_sentinel() {
        let mut board = white_to_win();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        fx.cancel.cancel();

        let result = fx.searcher().search(&mut board, PColor::White, 3, f32::NEG_INFINITY, f32::INFINITY);
        assert!(result.is_interrupted());
        assert_eq!(result.best_move, None);

        let decision = fx.searcher().iterative_deepening(&mut board, 4);
        assert_eq!(decision.outcome, Outcome::Cancelled);
        assert_eq!(decision.best_move, None);
    }

    #[test]
    fn test_iterative_deepening_completes() {
        let mut board = board_from(&small_config(), &["1r", "2s"]);
        let mut fx = Fixture::new(&board, HeuristicMode::Corridor);
        let decision = fx.searcher().iterative_deepening(&mut board, 3);
        assert_eq!(decision.outcome, Outcome::Completed);
        assert_eq!(decision.stats.completed_depth, 3);
        assert!(decision.best_move.is_some());
        assert!(decision.score.is_finite());
    }

    #[test]
    fn test_iterative_deepening_stops_on_forced_win() {
        let mut board = white_to_win();
        let mut fx = Fixture::new(&board, HeuristicMode::Corridor);
        let decision = fx.searcher().iterative_deepening(&mut board, 8);
        assert_eq!(decision.stats.completed_depth, 1);
        assert_eq!(decision.score, f32::INFINITY);
        assert_eq!(decision.best_move.map(|m| m.column), Some(3));
    }

    #[test]
    fn test_timeout_keeps_last_completed_depth() {
        let mut board = Board::standard();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        // One millisecond per clock read: depth 1 needs ~20 reads, depth 2 ~300
        let clock = Arc::new(ManualClock::ticking(Duration::from_millis(1)));
        fx.deadline = Deadline::start(clock, Duration::from_millis(100));

        let decision = fx.searcher().iterative_deepening(&mut board, 10);
        assert_eq!(decision.outcome, Outcome::TimedOut);
        assert_eq!(decision.stats.completed_depth, 1);
        let mv = decision.best_move.unwrap();
        assert!(!board.is_column_full(mv.column));
        assert_eq!(board.move_count(), 0);
    }

    #[test]
    fn test_timeout_before_depth_one_falls_back() {
        let mut board = Board::standard();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let clock = Arc::new(ManualClock::ticking(Duration::from_millis(1)));
        fx.deadline = Deadline::start(clock, Duration::ZERO);

        let decision = fx.searcher().iterative_deepening(&mut board, 5);
        assert_eq!(decision.outcome, Outcome::TimedOut);
        assert_eq!(decision.stats.completed_depth, 0);
        assert_eq!(decision.best_move, Some(Move::new(0, PShape::Round)));
        assert!(decision.score.is_nan());
    }

    #[test]
    fn test_fallback_skips_exhausted_shape() {
        let config = BoardConfig {
            round_pieces: 0,
            ..Default::default()
        };
        let board = Board::new(&config).unwrap();
        assert_eq!(board.first_legal_move(), Some(Move::new(0, PShape::Square)));
    }

    #[test]
    fn test_fixed_depth_decision() {
        let mut board = white_to_win();
        let mut fx = Fixture::new(&board, HeuristicMode::Corridor);
        let decision = fx.searcher().fixed_depth(&mut board, 2);
        assert_eq!(decision.outcome, Outcome::Completed);
        assert_eq!(decision.best_move.map(|m| m.column), Some(3));
        assert_eq!(decision.score, f32::INFINITY);
    }

    #[test]
    fn test_fixed_depth_zero_searches_one_ply() {
        let mut board = white_to_win();
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let decision = fx.searcher().fixed_depth(&mut board, 0);
        assert_eq!(decision.outcome, Outcome::Completed);
        assert_eq!(decision.stats.completed_depth, 1);
        assert_eq!(decision.best_move.map(|m| m.column), Some(3));

        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let decision = fx.searcher().iterative_deepening(&mut board, 0);
        assert_eq!(decision.stats.completed_depth, 1);
        assert_eq!(decision.best_move.map(|m| m.column), Some(3));
    }

    #[test]
    fn test_finished_game_has_no_move() {
        // White completed its row; Red still has pieces in hand
        let mut board = white_to_win();
        board.do_move(PShape::Round, 3).unwrap();
        assert_eq!(board.result(), GameResult::WonBy(PColor::White));

        let mut fx = Fixture::new(&board, HeuristicMode::Corridor);
        let decision = fx.searcher().fixed_depth(&mut board, 3);
        assert_eq!(decision.best_move, None);
        assert_eq!(decision.score, f32::NEG_INFINITY);

        let decision = fx.searcher().iterative_deepening(&mut board, 5);
        assert_eq!(decision.best_move, None);
        assert_eq!(decision.score, f32::NEG_INFINITY);
        assert_eq!(decision.outcome, Outcome::Completed);
        assert_eq!(decision.stats.completed_depth, 1);
    }

    #[test]
    fn test_root_pass_writes_only_when_absent() {
        let mut board = board_from(&small_config(), &["1r"]);
        let mut fx = Fixture::new(&board, HeuristicMode::Centroid);
        let key = fx.zobrist.hash(&board);
        fx.tt.store(key, 1, Bound::UpperBound, -100.0);

        fx.searcher().fixed_depth(&mut board, 2);
        let entry = fx.tt.probe(key).unwrap();
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.score, -100.0);
    }
}
