//! Timeout helpers used across the crate.
//!
//! Every blocking call takes a [`Timeout`]: block forever, return at once
//! (poll), or wait a bounded number of milliseconds.

use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default command timeout in milliseconds used when a caller doesn't
/// provide an explicit timeout.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Granularity at which blocking waits re-check their abort handle.
pub const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long a blocking call may wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Timeout {
    /// Block until data arrives or the call is aborted.
    Forever,
    /// Non-blocking: check once and return.
    Immediate,
    Millis(u64),
}

impl Timeout {
    pub fn deadline(self) -> Deadline {
        match self {
            Timeout::Forever => Deadline(None),
            Timeout::Immediate => Deadline(Some(Instant::now())),
            Timeout::Millis(n) => Deadline(Some(Instant::now() + ms(n))),
        }
    }

    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Timeout::Forever => None,
            Timeout::Immediate => Some(Duration::ZERO),
            Timeout::Millis(n) => Some(ms(n)),
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::Millis(DEFAULT_COMMAND_TIMEOUT_MS)
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        if d.is_zero() {
            Timeout::Immediate
        } else {
            Timeout::Millis(d.as_millis() as u64)
        }
    }
}

/// Point in time after which a blocking call gives up; `None` never expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn expired(&self) -> bool {
        matches!(self.0, Some(at) if Instant::now() >= at)
    }

    /// Time left, capped to `cap` so waits can re-check abort state.
    pub fn next_wait(&self, cap: Duration) -> Duration {
        match self.0 {
            None => cap,
            Some(at) => at.saturating_duration_since(Instant::now()).min(cap),
        }
    }
}

/// Convert milliseconds to Duration.
pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Convenience: default command timeout.
pub fn default_command_timeout() -> Timeout {
    Timeout::default()
}
