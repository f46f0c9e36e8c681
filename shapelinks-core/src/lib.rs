//! SHAPELINKS Core - Game rules and search engine
//!
//! This crate provides the decision engine for a gravity-based connection
//! game where lines can be made of one color or of one shape:
//! - Pieces, moves and the board trait the search runs against
//! - A reference board with win-corridor geometry and shape-priority rules
//! - Zobrist position hashing and an unbounded transposition cache
//! - Three static evaluators (corridor threats, center matrix, centroid)
//! - Negamax with alpha-beta pruning and time-bounded iterative deepening
//! - A configurable search agent

pub mod pieces;
pub mod board;
pub mod game;
pub mod zobrist;
pub mod tt;
pub mod eval;
pub mod control;
pub mod search;
pub mod config;
pub mod ai;

// Re-exports for convenient access
pub use pieces::{Move, PColor, PShape, Piece, Pos};
pub use board::{BoardError, GameBoard, GameResult};
pub use game::{Board, BoardConfig};
pub use zobrist::Zobrist;
pub use tt::{Bound, TranspositionTable, TtEntry};
pub use eval::{Evaluator, HeuristicMode};
pub use control::{CancelToken, Clock, Deadline, ManualClock, SystemClock};
pub use search::{Decision, Outcome, SearchResult, SearchStats, Searcher};
pub use config::{AgentConfig, ConfigError, SearchMode, DEFAULT_MAX_DEPTH};
pub use ai::SearchAgent;
