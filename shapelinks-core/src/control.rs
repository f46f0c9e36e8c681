//! Cooperative cancellation and wall-clock budgets

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag; cloning shares the flag
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Real time
#[derive(Clone, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Test clock: moves only when advanced, plus an optional tick on every read
#[derive(Debug, Default)]
pub struct ManualClock {
    now_micros: AtomicU64,
    tick_micros: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `now()` call advances the clock by `tick` after reading it
    pub fn ticking(tick: Duration) -> Self {
        Self {
            now_micros: AtomicU64::new(0),
            tick_micros: tick.as_micros() as u64,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_micros
            .fetch_add(by.as_micros() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let micros = self.now_micros.fetch_add(self.tick_micros, Ordering::Relaxed);
        Duration::from_micros(micros)
    }
}

/// Time budget for one decision
#[derive(Clone)]
pub struct Deadline {
    clock: Arc<dyn Clock>,
    start: Duration,
    budget: Option<Duration>,
}

impl Deadline {
    /// Start the budget now
    pub fn start(clock: Arc<dyn Clock>, budget: Duration) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            budget: Some(budget),
        }
    }

    /// A deadline that never expires
    pub fn unbounded() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            start: Duration::ZERO,
            budget: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start)
    }

    pub fn expired(&self) -> bool {
        match self.budget {
            Some(budget) => self.elapsed() > budget,
            None => false,
        }
    }
}

impl std::fmt::Debug for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deadline")
            .field("start", &self.start)
            .field("budget", &self.budget)
            .finish()
    }
}
