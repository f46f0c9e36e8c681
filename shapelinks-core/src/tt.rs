//! Transposition cache
//!
//! Maps a Zobrist fingerprint to the best knowledge gathered about that
//! position. Entries are never evicted: the table lives as long as the agent
//! that owns it and is reused across every decision of one game. Fingerprint
//! collisions are not detected.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// How a cached score relates to the true value of the position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    /// Score is the value of the position
    Exact,
    /// Value is at least the score (search failed high)
    LowerBound,
    /// Value is at most the score (search failed low)
    UpperBound,
}

impl Bound {
    /// Classify a fail-soft result against the window it was searched with
    pub fn classify(score: f32, original_alpha: f32, beta: f32) -> Self {
        if score <= original_alpha {
            Bound::UpperBound
        } else if score >= beta {
            Bound::LowerBound
        } else {
            Bound::Exact
        }
    }
}

/// Cached search result for one position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TtEntry {
    /// Remaining depth the score was searched to
    pub depth: u32,
    pub bound: Bound,
    pub score: f32,
}

impl TtEntry {
    /// Entry is deep enough to answer a probe at `depth`
    pub fn usable_at(&self, depth: u32) -> bool {
        self.depth >= depth
    }
}

/// Unbounded fingerprint -> entry map
#[derive(Clone, Debug, Default)]
pub struct TranspositionTable {
    entries: FxHashMap<u64, TtEntry>,
    disabled: bool,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table whose probes always miss and whose stores are dropped
    pub fn disabled() -> Self {
        Self {
            entries: FxHashMap::default(),
            disabled: true,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        if self.disabled {
            return None;
        }
        self.entries.get(&key).copied()
    }

    /// Insert or overwrite unconditionally
    pub fn store(&mut self, key: u64, depth: u32, bound: Bound, score: f32) {
        if self.disabled {
            return;
        }
        self.entries.insert(key, TtEntry { depth, bound, score });
    }

    /// Write only when nothing is cached for `key` yet
    pub fn store_if_absent(&mut self, key: u64, depth: u32, bound: Bound, score: f32) {
        if self.disabled {
            return;
        }
        self.entries
            .entry(key)
            .or_insert(TtEntry { depth, bound, score });
    }

    /// Write when nothing is cached or the cached entry is not deeper
    pub fn store_if_not_shallower(&mut self, key: u64, depth: u32, bound: Bound, score: f32) {
        match self.probe(key) {
            Some(existing) if depth < existing.depth => {}
            _ => self.store(key, depth, bound, score),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
