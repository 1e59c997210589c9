//! Exponential backoff with jitter, and the per-location retry loop.
//!
//! The loop runs one readiness check immediately, then sleeps between
//! attempts. Both the check and the sleep race against the shared
//! [`WaitContext`], so cancellation ends a location promptly instead of
//! waiting out the remaining interval.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::context::WaitContext;
use crate::error::{Result, WaitError};
use crate::options::Options;
use crate::resource::Resource;

/// Compute the un-jittered delay after the `failures`-th failed attempt
/// (1-indexed).
///
/// Delay formula: `min(interval * multiplier^(failures - 1), max_interval)`
pub fn compute_delay(
    failures: u32,
    interval: Duration,
    max_interval: Duration,
    multiplier: f64,
) -> Duration {
    let exponent = failures.saturating_sub(1).min(64) as i32;
    let secs = interval.as_secs_f64() * multiplier.powi(exponent);
    if !secs.is_finite() || secs >= max_interval.as_secs_f64() {
        return max_interval;
    }
    Duration::from_secs_f64(secs)
}

/// Spread `delay` symmetrically by `jitter` using `sample` in `[0, 1]`.
///
/// `sample = 0.0` yields `delay * (1 - jitter)`, `sample = 1.0` yields
/// `delay * (1 + jitter)`. The result never exceeds `max_interval`.
pub fn apply_jitter(delay: Duration, jitter: f64, sample: f64, max_interval: Duration) -> Duration {
    if jitter <= 0.0 {
        return delay.min(max_interval);
    }
    let base = delay.as_secs_f64();
    let low = base * (1.0 - jitter);
    let high = base * (1.0 + jitter);
    let secs = low + (high - low) * sample.clamp(0.0, 1.0);
    Duration::from_secs_f64(secs.max(0.0)).min(max_interval)
}

/// Stateful delay generator for one location.
#[derive(Debug, Clone)]
pub struct Backoff {
    options: Options,
    failures: u32,
}

impl Backoff {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            failures: 0,
        }
    }

    /// Delay to wait after the next failure.
    pub fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = compute_delay(
            self.failures,
            self.options.interval(),
            self.options.max_interval(),
            self.options.multiplier(),
        );
        let sample = if self.options.jitter() > 0.0 {
            rand::rng().random::<f64>()
        } else {
            0.0
        };
        apply_jitter(
            delay,
            self.options.jitter(),
            sample,
            self.options.max_interval(),
        )
    }
}

/// Run `resource.check` until it succeeds, attempts run out, or `ctx` ends.
///
/// Returns the number of attempts made on success.
pub async fn retry(
    location: &str,
    resource: &dyn Resource,
    ctx: &WaitContext,
    options: Options,
) -> Result<u32> {
    let mut backoff = Backoff::new(options);
    let max_attempts = options.attempts();
    let mut attempt = 0;

    loop {
        if let Some(reason) = ctx.err() {
            return Err(WaitError::Cancelled(reason));
        }

        attempt += 1;
        debug!(location, attempt, max_attempts, "Checking resource");

        let outcome = tokio::select! {
            result = resource.check(ctx) => result,
            reason = ctx.done() => return Err(WaitError::Cancelled(reason)),
        };

        let err = match outcome {
            Ok(()) => return Ok(attempt),
            Err(err) => err,
        };

        if attempt >= max_attempts {
            return Err(WaitError::Exhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let delay = backoff.next_delay();
        warn!(
            location,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Resource not ready, retrying"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            reason = ctx.done() => return Err(WaitError::Cancelled(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CancelReason, ErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails `fail_times` times, then succeeds. Records when each check ran.
    struct Flaky {
        fail_times: u32,
        calls: AtomicU32,
        seen: Mutex<Vec<Instant>>,
    }

    impl Flaky {
        fn new(fail_times: u32) -> Self {
            Self {
                fail_times,
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Resource for Flaky {
        async fn check(&self, _ctx: &WaitContext) -> Result<()> {
            self.seen.lock().unwrap().push(Instant::now());
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(WaitError::not_ready(format!("failure #{}", n + 1)))
            } else {
                Ok(())
            }
        }
    }

    fn fast_options() -> Options {
        Options::default()
            .with_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(4))
            .with_multiplier(2.0)
            .with_jitter(0.0)
    }

    #[test]
    fn test_compute_delay_growth_and_cap() {
        let i = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        assert_eq!(compute_delay(1, i, max, 2.0), Duration::from_secs(1));
        assert_eq!(compute_delay(2, i, max, 2.0), Duration::from_secs(2));
        assert_eq!(compute_delay(3, i, max, 2.0), Duration::from_secs(4));
        assert_eq!(compute_delay(4, i, max, 2.0), Duration::from_secs(8));
        assert_eq!(compute_delay(5, i, max, 2.0), max);
        assert_eq!(compute_delay(500, i, max, 2.0), max);
    }

    #[test]
    fn test_compute_delay_default_multiplier() {
        let d = compute_delay(2, Duration::from_secs(2), Duration::from_secs(60), 1.5);
        assert_eq!(d, Duration::from_secs(3));
    }

    #[test]
    fn test_apply_jitter_bounds() {
        let d = Duration::from_secs(10);
        let max = Duration::from_secs(60);
        assert_eq!(apply_jitter(d, 0.5, 0.0, max), Duration::from_secs(5));
        assert_eq!(apply_jitter(d, 0.5, 1.0, max), Duration::from_secs(15));
        assert_eq!(apply_jitter(d, 0.0, 0.7, max), d);
        // Never exceeds the cap even when jitter pushes above it.
        assert_eq!(apply_jitter(max, 0.5, 1.0, max), max);
    }

    #[test]
    fn test_backoff_with_jitter_stays_in_range() {
        let opts = Options::default()
            .with_interval(Duration::from_secs(4))
            .with_max_interval(Duration::from_secs(60))
            .with_jitter(0.5);
        let mut backoff = Backoff::new(opts);
        for _ in 0..50 {
            let d = backoff.next_delay();
            assert!(d <= Duration::from_secs(60));
        }
        let mut first = Backoff::new(opts);
        let d = first.next_delay();
        assert!(d >= Duration::from_secs(2) && d <= Duration::from_secs(6));
    }

    #[test]
    fn test_backoff_without_jitter_is_non_decreasing() {
        let mut backoff = Backoff::new(fast_options());
        let delays: Vec<_> = (0..6).map(|_| backoff.next_delay()).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let resource = Flaky::new(3);
        let ctx = WaitContext::new();
        let opts = fast_options().with_attempts(5);

        let attempts = retry("flaky://x", &resource, &ctx, opts).await.unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(resource.calls.load(Ordering::SeqCst), 4);

        let seen = resource.seen.lock().unwrap();
        let gaps: Vec<_> = seen.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_attempts() {
        let resource = Flaky::new(u32::MAX);
        let ctx = WaitContext::new();

        let err = retry("flaky://x", &resource, &ctx, fast_options().with_attempts(3))
            .await
            .unwrap_err();
        assert_eq!(resource.calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, WaitError::Exhausted { attempts: 3, .. }));
        assert!(err.to_string().contains("failure #3"));
        assert_eq!(err.kind(), ErrorKind::Readiness);
    }

    #[tokio::test]
    async fn test_retry_does_not_check_when_already_cancelled() {
        let resource = Flaky::new(0);
        let ctx = WaitContext::new();
        ctx.cancel();

        let err = retry("flaky://x", &resource, &ctx, fast_options())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Cancelled(CancelReason::Cancelled)));
        assert_eq!(resource.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_backoff_short() {
        let resource = Flaky::new(u32::MAX);
        let ctx = WaitContext::with_timeout(Duration::from_millis(1500));
        let opts = Options::default()
            .with_interval(Duration::from_secs(60))
            .with_jitter(0.0)
            .with_attempts(10);

        let start = Instant::now();
        let err = retry("flaky://x", &resource, &ctx, opts).await.unwrap_err();
        assert!(matches!(
            err,
            WaitError::Cancelled(CancelReason::DeadlineExceeded)
        ));
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(resource.calls.load(Ordering::SeqCst), 1);
    }
}
