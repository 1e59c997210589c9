//! Error types for waitfor
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

// ============================================================================
// Error classification
// ============================================================================

/// Coarse category of a [`WaitError`].
///
/// Lets callers tell "a location was invalid" apart from "a resource never
/// became ready" and from "the gated program failed" without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A scheme was registered twice.
    Registration,
    /// A location could not be turned into a resource (bad URL, unknown
    /// scheme, rejected parameters, invalid options).
    Resolution,
    /// A resource was reachable-in-principle but never reported ready.
    Readiness,
    /// The shared context was cancelled or its deadline passed.
    Cancellation,
    /// The gated program failed to start or exited abnormally.
    Execution,
    /// Several locations failed; inspect [`WaitFailure`] for details.
    Aggregate,
    /// Configuration loading or I/O outside the core.
    Config,
}

/// Why a [`WaitContext`](crate::context::WaitContext) stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Explicit cancellation through the token.
    Cancelled,
    /// The context deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

// ============================================================================
// Aggregate failure
// ============================================================================

/// Terminal failure of a single location.
#[derive(Debug)]
pub struct LocationFailure {
    /// The location string exactly as the caller passed it.
    pub location: String,
    /// Why it never became ready.
    pub error: WaitError,
}

/// Every location that failed during one `Runner::test` call, in input order.
#[derive(Debug, Default)]
pub struct WaitFailure {
    failures: Vec<LocationFailure>,
}

impl WaitFailure {
    /// Build from a list of per-location failures.
    pub fn new(failures: Vec<LocationFailure>) -> Self {
        Self { failures }
    }

    /// All failures, in the order the locations were given.
    pub fn failures(&self) -> &[LocationFailure] {
        &self.failures
    }

    /// Failure recorded for `location`, if any.
    pub fn get(&self, location: &str) -> Option<&WaitError> {
        self.failures
            .iter()
            .find(|f| f.location == location)
            .map(|f| &f.error)
    }

    /// Number of failed locations.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Whether no location failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether every failure was caused by context cancellation.
    pub fn all_cancelled(&self) -> bool {
        !self.failures.is_empty()
            && self
                .failures
                .iter()
                .all(|f| f.error.kind() == ErrorKind::Cancellation)
    }

    /// Whether at least one location failed to resolve.
    pub fn any_resolution(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.error.kind() == ErrorKind::Resolution)
    }
}

impl fmt::Display for WaitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to wait for resource availability: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failure.location, failure.error)?;
        }
        Ok(())
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for waitfor operations.
#[derive(Error, Debug)]
pub enum WaitError {
    /// A factory is already bound to this scheme.
    #[error("resource is already registered with a given scheme: {0}")]
    DuplicateScheme(String),

    /// The location string is not a valid URL.
    #[error("invalid resource location '{location}': {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    /// No factory is bound to the location's scheme.
    #[error("resource with a given scheme is not found: {0}")]
    UnknownScheme(String),

    /// A factory rejected the location's parameters, or options were invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A readiness check reported the resource as not ready yet.
    #[error("resource not ready: {0}")]
    NotReady(String),

    /// Every allowed attempt failed; carries the last failure.
    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<WaitError>,
    },

    /// The shared context ended before the resource became ready.
    #[error("{0}")]
    Cancelled(CancelReason),

    /// One or more locations never became ready.
    #[error("{0}")]
    Wait(WaitFailure),

    /// The gated program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The gated program exited unsuccessfully.
    #[error("'{program}' exited with {status}")]
    Execution {
        program: String,
        status: ExitStatus,
        output: Vec<u8>,
    },

    /// Configuration errors (bad config file, unparsable override, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WaitError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WaitError::DuplicateScheme(_) => ErrorKind::Registration,
            WaitError::InvalidLocation { .. }
            | WaitError::UnknownScheme(_)
            | WaitError::InvalidArgument(_) => ErrorKind::Resolution,
            WaitError::NotReady(_) | WaitError::Exhausted { .. } => ErrorKind::Readiness,
            WaitError::Cancelled(_) => ErrorKind::Cancellation,
            WaitError::Wait(_) => ErrorKind::Aggregate,
            WaitError::Spawn { .. } | WaitError::Execution { .. } => ErrorKind::Execution,
            WaitError::Config(_) | WaitError::Io(_) | WaitError::Json(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for a readiness failure.
    pub fn not_ready(msg: impl Into<String>) -> Self {
        WaitError::NotReady(msg.into())
    }
}

impl From<WaitFailure> for WaitError {
    fn from(failure: WaitFailure) -> Self {
        WaitError::Wait(failure)
    }
}

/// A specialized `Result` type for waitfor operations.
pub type Result<T> = std::result::Result<T, WaitError>;
