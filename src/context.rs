//! Shared cancellation context.
//!
//! A [`WaitContext`] is handed to every task spawned by one
//! [`Runner::test`](crate::runner::Runner::test) call. Cancelling it, or
//! letting its deadline pass, ends every outstanding retry loop.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CancelReason;

/// Cancellation token plus an optional deadline.
///
/// Clones share the same token, so cancelling any clone cancels all of them.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use waitfor::WaitContext;
///
/// # tokio_test::block_on(async {
/// let ctx = WaitContext::with_timeout(Duration::from_secs(30));
/// assert!(ctx.err().is_none());
/// ctx.cancel();
/// assert!(ctx.is_done());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct WaitContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WaitContext {
    /// A context that only ends when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant never expires.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::with_deadline(deadline),
            None => Self::new(),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Wrap an existing token, e.g. one tied to a signal handler.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Return a copy of this context whose deadline is the earlier of the
    /// current one and `timeout` from now.
    pub fn timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(existing), Some(candidate)) => Some(existing.min(candidate)),
            (existing, candidate) => existing.or(candidate),
        };
        Self {
            token: self.token.clone(),
            deadline,
        }
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context has ended, or `None` while it is still live.
    ///
    /// Explicit cancellation wins over an expired deadline.
    pub fn err(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Whether the context has ended.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context ends, reporting why.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}
