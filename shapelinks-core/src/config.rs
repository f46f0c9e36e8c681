//! Agent configuration
//!
//! Agents are configured from a short setup string `"<maxDepth>,<heuristicMode>"`
//! plus match-level settings (time limit, search mode).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::eval::HeuristicMode;

/// Depth used when the setup string gives none we can use
pub const DEFAULT_MAX_DEPTH: u32 = 4;

/// Per-decision time limit in milliseconds
pub const DEFAULT_TIME_LIMIT_MS: u64 = 3600;

/// Reserved for returning the move before the limit
pub const DEFAULT_TIME_MARGIN_MS: u64 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid depth '{0}'")]
    InvalidDepth(String),

    #[error("depth must be at least 1, got {0}")]
    NonPositiveDepth(i64),

    #[error("invalid heuristic mode '{0}'")]
    InvalidMode(String),

    #[error("unknown heuristic mode {0} (expected 1, 2 or 3)")]
    UnknownMode(i64),
}

/// Search driver used by an agent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Deepen until the deadline or the maximum depth
    IterativeDeepening,
    /// One pass at the configured depth
    FixedDepth,
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::IterativeDeepening
    }
}

/// Everything an agent needs besides the board
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub max_depth: u32,
    pub heuristic: HeuristicMode,
    pub search_mode: SearchMode,
    pub time_limit_ms: u64,
    pub time_margin_ms: u64,
    /// Play the middle column on the agent's first decision
    pub opening_book: bool,
    /// Corridor heuristic multiplier for immediately playable windows
    pub playable_factor: f32,
    /// Hasher seed (None = from entropy)
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::iterative(DEFAULT_MAX_DEPTH, HeuristicMode::default())
    }
}

impl AgentConfig {
    /// Iterative-deepening agent with the opening book
    pub fn iterative(max_depth: u32, heuristic: HeuristicMode) -> Self {
        Self {
            max_depth,
            heuristic,
            search_mode: SearchMode::IterativeDeepening,
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            time_margin_ms: DEFAULT_TIME_MARGIN_MS,
            opening_book: true,
            playable_factor: 4.0,
            seed: None,
        }
    }

    /// Fixed-depth agent, no opening book
    pub fn fixed(depth: u32, heuristic: HeuristicMode) -> Self {
        Self {
            search_mode: SearchMode::FixedDepth,
            opening_book: false,
            playable_factor: 2.0,
            ..Self::iterative(depth, heuristic)
        }
    }

    /// Parse a setup string, reporting the first problem found
    pub fn try_parse(setup: &str) -> Result<Self, ConfigError> {
        let (depth, mode) = match setup.split_once(',') {
            Some((depth, mode)) => (depth, Some(mode)),
            None => (setup, None),
        };

        let max_depth = parse_depth(depth)?;
        let heuristic = match mode {
            Some(mode) => parse_mode(mode)?,
            None => HeuristicMode::default(),
        };

        Ok(Self::iterative(max_depth, heuristic))
    }

    /// Parse a setup string, substituting defaults for anything unusable
    pub fn from_setup(setup: &str) -> Self {
        let (depth, mode) = match setup.split_once(',') {
            Some((depth, mode)) => (depth, Some(mode)),
            None => (setup, None),
        };

        let max_depth = parse_depth(depth).unwrap_or_else(|err| {
            warn!(%err, setup, default = DEFAULT_MAX_DEPTH, "using default depth");
            DEFAULT_MAX_DEPTH
        });
        let heuristic = match mode.map(parse_mode) {
            Some(Ok(mode)) => mode,
            Some(Err(err)) => {
                warn!(%err, setup, "using default heuristic");
                HeuristicMode::default()
            }
            None => HeuristicMode::default(),
        };

        Self::iterative(max_depth, heuristic)
    }

    /// Switch to a single pass at `max_depth`
    pub fn into_fixed_depth(self) -> Self {
        Self {
            search_mode: SearchMode::FixedDepth,
            opening_book: false,
            playable_factor: 2.0,
            ..self
        }
    }

    pub fn with_time_limit(mut self, time_limit_ms: u64) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Search budget per decision: the time limit minus the margin
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms.saturating_sub(self.time_margin_ms))
    }

    /// Agent name as shown in match reports
    pub fn name(&self) -> String {
        let prefix = match self.search_mode {
            SearchMode::IterativeDeepening => "IDS",
            SearchMode::FixedDepth => "NegamaxTT",
        };
        format!("{}_D{}T{}", prefix, self.max_depth, self.heuristic.code())
    }
}

fn parse_depth(s: &str) -> Result<u32, ConfigError> {
    let depth: i64 = s
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidDepth(s.to_string()))?;
    if depth < 1 {
        return Err(ConfigError::NonPositiveDepth(depth));
    }
    u32::try_from(depth).map_err(|_| ConfigError::InvalidDepth(s.to_string()))
}

fn parse_mode(s: &str) -> Result<HeuristicMode, ConfigError> {
    let code: i64 = s
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidMode(s.to_string()))?;
    HeuristicMode::from_code(code).ok_or(ConfigError::UnknownMode(code))
}
