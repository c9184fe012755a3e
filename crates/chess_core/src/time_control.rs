//! Search limits, the shared cancellation token, and clock-based time allocation.
//!
//! Search only ever sees a [`TimeControl`]: a stop flag plus an optional
//! deadline. How the deadline was chosen (fixed move time, moves-to-go,
//! increments) is decided up front by [`GoParams::allocate`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{ChessError, ChessResult};
use crate::types::Color;

/// Moves assumed to remain when the clock gives no `movestogo`.
pub const DEFAULT_MOVES_TO_GO: u32 = 30;
/// Upper bound on the reserve kept back on the clock.
pub const MIN_TIME_LEFT: Duration = Duration::from_secs(3);
/// Depth used when `go` does not name one.
pub const DEFAULT_MAX_DEPTH: u8 = 40;

/// Search limits that control when an engine should stop searching.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum iterative-deepening depth in plies
    pub depth: u8,
    /// Time budget for this move (None = until stopped)
    pub move_time: Option<Duration>,
    pub time_control: TimeControl,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            move_time: None,
            time_control: TimeControl::new(None),
        }
    }

    pub fn depth_and_time(depth: u8, move_time: Duration) -> Self {
        Self {
            depth,
            move_time: Some(move_time),
            time_control: TimeControl::new(Some(move_time)),
        }
    }

    pub fn time(move_time: Duration) -> Self {
        Self::depth_and_time(DEFAULT_MAX_DEPTH, move_time)
    }

    /// Cancellation check. Latches the stop flag once the deadline has passed.
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.time_control.check_time()
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self::depth(4)
    }
}

/// Cloneable cancellation token. Clones share the stop flag, so a protocol
/// thread can stop a running search.
#[derive(Debug, Clone)]
pub struct TimeControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    time_limit: Option<Duration>,
}

impl TimeControl {
    /// Token whose clock starts now.
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            start: Instant::now(),
            time_limit,
        }
    }

    /// Restart the clock and clear the stop flag.
    pub fn restart(&mut self) {
        self.start = Instant::now();
        self.stopped.store(false, Ordering::SeqCst);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Returns true when the search must stop, latching the flag on deadline expiry.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.time_limit {
            Some(limit) if self.start.elapsed() >= limit => {
                self.stop();
                true
            }
            _ => false,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time until the deadline (None without one).
    pub fn remaining(&self) -> Option<Duration> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed()))
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

// =============================================================================
// Clock allocation
// =============================================================================

/// Engine-side timing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSettings {
    /// Subtracted from the remaining clock to absorb transport latency
    pub move_overhead: Duration,
    /// Hard ceiling on any single move
    pub max_time: Duration,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            move_overhead: Duration::from_millis(200),
            max_time: Duration::from_secs(30),
        }
    }
}

/// Arguments of a `go` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub movetime: Option<Duration>,
    pub depth: Option<u8>,
    pub infinite: bool,
}

impl GoParams {
    /// Parse the tokens following `go`. Unknown keywords are skipped.
    pub fn parse(tokens: &[&str]) -> ChessResult<Self> {
        fn value<'a>(tokens: &[&'a str], i: usize, key: &str) -> ChessResult<&'a str> {
            tokens.get(i + 1).copied().ok_or_else(|| ChessError::InvalidArgument {
                key: key.to_string(),
                reason: "missing value".to_string(),
            })
        }
        fn number<T: std::str::FromStr>(raw: &str, key: &str) -> ChessResult<T> {
            raw.parse().map_err(|_| ChessError::InvalidArgument {
                key: key.to_string(),
                reason: format!("not a number: {raw}"),
            })
        }
        // Clocks may be reported negative after a flag fall.
        fn millis(raw: &str, key: &str) -> ChessResult<Duration> {
            let ms: i64 = number(raw, key)?;
            Ok(Duration::from_millis(ms.max(0) as u64))
        }

        let mut go = GoParams::default();
        let mut i = 0;
        while i < tokens.len() {
            let key = tokens[i];
            match key {
                "wtime" => go.wtime = Some(millis(value(tokens, i, key)?, key)?),
                "btime" => go.btime = Some(millis(value(tokens, i, key)?, key)?),
                "winc" => go.winc = Some(millis(value(tokens, i, key)?, key)?),
                "binc" => go.binc = Some(millis(value(tokens, i, key)?, key)?),
                "movetime" => go.movetime = Some(millis(value(tokens, i, key)?, key)?),
                "movestogo" => go.movestogo = Some(number(value(tokens, i, key)?, key)?),
                "depth" => go.depth = Some(number(value(tokens, i, key)?, key)?),
                "infinite" => {
                    go.infinite = true;
                    i += 1;
                    continue;
                }
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        Ok(go)
    }

    /// Time budget for `side`, or None when the search runs until stopped.
    pub fn allocate(&self, side: Color, settings: &TimeSettings) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(movetime) = self.movetime {
            return Some(movetime.saturating_sub(settings.move_overhead).min(settings.max_time));
        }

        let (clock, inc) = match side {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        };
        let Some(clock) = clock else {
            return Some(settings.max_time);
        };
        let inc = inc.unwrap_or(Duration::ZERO);

        let moves_to_go = self.movestogo.filter(|&m| m > 0).unwrap_or(DEFAULT_MOVES_TO_GO);
        let periods = moves_to_go.saturating_sub(1).max(1);

        let time_left = clock.saturating_sub(settings.move_overhead);
        let reserve = MIN_TIME_LEFT.min(time_left / 2);
        // Absurd increments saturate instead of overflowing
        let budget = time_left.saturating_add(inc.saturating_mul(moves_to_go - 1)) / periods;

        Some(budget.min(time_left - reserve).min(settings.max_time))
    }

    /// Limits for the search this command starts.
    pub fn search_limits(&self, side: Color, settings: &TimeSettings) -> SearchLimits {
        let depth = self.depth.unwrap_or(DEFAULT_MAX_DEPTH);
        match self.allocate(side, settings) {
            Some(budget) => SearchLimits::depth_and_time(depth, budget),
            None => SearchLimits::depth(depth),
        }
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
