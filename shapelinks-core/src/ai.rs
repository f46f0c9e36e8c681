//! Search agent: one per player per game
//!
//! Owns the hasher and the transposition cache for the lifetime of a game and
//! turns a board into a move with the configured search driver.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::board::GameBoard;
use crate::config::{AgentConfig, SearchMode};
use crate::control::{CancelToken, Clock, Deadline, SystemClock};
use crate::eval::Evaluator;
use crate::pieces::{Move, Pos};
use crate::search::{Decision, Outcome, SearchStats, Searcher};
use crate::tt::TranspositionTable;
use crate::zobrist::Zobrist;

// ============================================================================
// SEARCH AGENT
// ============================================================================

pub struct SearchAgent {
    config: AgentConfig,
    name: String,
    zobrist: Zobrist,
    tt: TranspositionTable,
    clock: Arc<dyn Clock>,
    decisions: u32,
    last_stats: SearchStats,
}

impl SearchAgent {
    pub fn new(config: AgentConfig, rows: usize, cols: usize) -> Self {
        let zobrist = make_hasher(&config, rows, cols);
        Self {
            name: config.name(),
            config,
            zobrist,
            tt: TranspositionTable::new(),
            clock: Arc::new(SystemClock::new()),
            decisions: 0,
            last_stats: SearchStats::default(),
        }
    }

    pub fn for_board<B: GameBoard>(config: AgentConfig, board: &B) -> Self {
        Self::new(config, board.rows(), board.cols())
    }

    /// Replace the time source used for deadlines
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Positions currently cached
    pub fn cache_len(&self) -> usize {
        self.tt.len()
    }

    /// Choose a move for the side to move, `None` if cancelled or no move exists
    pub fn decide<B: GameBoard>(&mut self, board: &mut B, cancel: &CancelToken) -> Option<Move> {
        let decision = self.think(board, cancel);
        match decision.outcome {
            Outcome::Cancelled => None,
            _ => decision.best_move,
        }
    }

    /// Full decision record: move, score, outcome and counters
    pub fn think<B: GameBoard>(&mut self, board: &mut B, cancel: &CancelToken) -> Decision {
        let first = self.decisions == 0;
        self.decisions += 1;

        if self.config.opening_book && first {
            if let Some(mv) = opening_move(board) {
                debug!(agent = %self.name, %mv, "opening book");
                self.last_stats = SearchStats::default();
                return Decision {
                    best_move: Some(mv),
                    score: f32::NAN,
                    outcome: Outcome::Completed,
                    stats: self.last_stats,
                };
            }
        }

        if self.zobrist.dimensions() != (board.rows(), board.cols()) {
            warn!(
                agent = %self.name,
                rows = board.rows(),
                cols = board.cols(),
                "board geometry changed, resetting hasher and cache"
            );
            self.zobrist = make_hasher(&self.config, board.rows(), board.cols());
            self.tt = TranspositionTable::new();
        }

        let evaluator = Evaluator::new(self.config.heuristic, board, self.config.playable_factor);
        let deadline = Deadline::start(self.clock.clone(), self.config.budget());
        let mut searcher = Searcher::new(&self.zobrist, &mut self.tt, &evaluator, cancel, &deadline);

        let decision = match self.config.search_mode {
            SearchMode::IterativeDeepening => searcher.iterative_deepening(board, self.config.max_depth),
            SearchMode::FixedDepth => searcher.fixed_depth(board, self.config.max_depth),
        };

        self.last_stats = decision.stats;
        debug!(
            agent = %self.name,
            best = ?decision.best_move,
            score = decision.score,
            outcome = ?decision.outcome,
            depth = decision.stats.completed_depth,
            nodes = decision.stats.nodes,
            tt_hits = decision.stats.tt_hits,
            tt_cutoffs = decision.stats.tt_cutoffs,
            cached = self.tt.len(),
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "decision"
        );

        decision
    }
}

impl fmt::Display for SearchAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for SearchAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchAgent")
            .field("name", &self.name)
            .field("decisions", &self.decisions)
            .field("cached", &self.tt.len())
            .finish()
    }
}

fn make_hasher(config: &AgentConfig, rows: usize, cols: usize) -> Zobrist {
    match config.seed {
        Some(seed) => Zobrist::new(rows, cols, seed),
        None => Zobrist::from_entropy(rows, cols),
    }
}

/// Middle column with the mover's own shape, while its bottom cell is empty
fn opening_move<B: GameBoard>(board: &B) -> Option<Move> {
    let col = board.cols() / 2;
    let turn = board.turn();
    let shape = turn.shape();
    if board.piece_at(Pos::new(0, col)).is_none() && board.piece_count(turn, shape) > 0 {
        Some(Move::new(col, shape))
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
