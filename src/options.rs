//! Retry options for a single `test`/`run` call.
//!
//! [`Options`] is an immutable snapshot built with `with_*` methods and passed
//! by value, so concurrent calls on one runner never share retry state.

use std::time::Duration;

use crate::error::{Result, WaitError};

/// Default initial interval between attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
/// Default cap on the interval between attempts.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);
/// Default number of attempts per location.
pub const DEFAULT_ATTEMPTS: u32 = 5;
/// Default growth factor of the interval.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
/// Default randomization factor (±50 %).
pub const DEFAULT_JITTER: f64 = 0.5;

/// Retry configuration applied independently to each location.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use waitfor::Options;
///
/// let opts = Options::default()
///     .with_interval(Duration::from_secs(1))
///     .with_attempts(10);
/// assert_eq!(opts.attempts(), 10);
/// assert_eq!(opts.max_interval(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Options {
    interval: Duration,
    max_interval: Duration,
    multiplier: f64,
    jitter: f64,
    attempts: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: DEFAULT_JITTER,
            attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl Options {
    /// Set the initial interval between the first and second attempt.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the cap on the interval between attempts.
    pub fn with_max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = max_interval;
        self
    }

    /// Set the factor the interval grows by after every failed attempt.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the randomization factor applied symmetrically to each interval.
    ///
    /// `0.5` means each delay is drawn from `[d * 0.5, d * 1.5]`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the maximum number of attempts per location.
    ///
    /// `0` selects the default of [`DEFAULT_ATTEMPTS`]. It never means
    /// "unlimited"; bound the call with a context deadline for that.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = if attempts == 0 {
            DEFAULT_ATTEMPTS
        } else {
            attempts
        };
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_interval(&self) -> Duration {
        self.max_interval
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reject combinations the backoff cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(WaitError::InvalidArgument(format!(
                "multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(WaitError::InvalidArgument(format!(
                "jitter must be within [0, 1], got {}",
                self.jitter
            )));
        }
        if self.max_interval < self.interval {
            return Err(WaitError::InvalidArgument(format!(
                "max interval ({:?}) is shorter than interval ({:?})",
                self.max_interval, self.interval
            )));
        }
        Ok(())
    }
}
