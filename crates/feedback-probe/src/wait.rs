//! Wait mechanisms
//!
//! Condition-based polling with explicit timeout budgets. Every wait either
//! observes its condition or fails with a bounded error; nothing sleeps for a
//! fixed amount of time hoping the page caught up.

use crate::result::{ProbeError, ProbeResult};
use std::time::{Duration, Instant};

/// Default timeout for element actionability (5 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 5_000;

/// Default timeout for navigation and load states (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value produced by the condition
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was checked
    pub attempts: u32,
}

/// Poll `probe` until it yields `Some`, or the timeout elapses.
///
/// The probe is always evaluated at least once, even with a zero timeout.
/// Errors from the probe abort the wait immediately.
///
/// # Errors
///
/// Returns `Timeout` when the budget is exhausted, or the probe's own error.
pub fn poll_until<T, F>(mut probe: F, options: &WaitOptions) -> ProbeResult<WaitResult<T>>
where
    F: FnMut() -> ProbeResult<Option<T>>,
{
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        if let Some(value) = probe()? {
            return Ok(WaitResult {
                value,
                elapsed: start.elapsed(),
                attempts,
            });
        }
        let elapsed = start.elapsed();
        if elapsed >= options.timeout() {
            return Err(ProbeError::Timeout {
                ms: options.timeout_ms,
            });
        }
        std::thread::sleep(options.poll_interval().min(options.timeout() - elapsed));
    }
}

/// Wait for a predicate to return true
///
/// # Errors
///
/// Returns `Timeout` if the predicate never holds within the budget
pub fn wait_until<F>(mut predicate: F, options: &WaitOptions) -> ProbeResult<Duration>
where
    F: FnMut() -> bool,
{
    poll_until(|| Ok(predicate().then_some(())), options).map(|r| r.elapsed)
}

/// Tracks a per-scenario time budget across many operations
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a new budget now
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    /// Time elapsed since start
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the budget is spent
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// Budget in milliseconds
    #[must_use]
    pub fn budget_ms(&self) -> u64 {
        self.budget.as_millis() as u64
    }

    /// Fail with `Timeout` once the budget is spent
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if expired
    pub fn check(&self) -> ProbeResult<()> {
        if self.is_expired() {
            Err(ProbeError::Timeout {
                ms: self.budget_ms(),
            })
        } else {
            Ok(())
        }
    }
}
