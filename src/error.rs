//! Error taxonomy for the matcher pool.
//!
//! One enum covers every kind a `check()` call can fail with (spec: pool
//! error kinds are UnknownCategory / QueueFull / Timeout / MatcherFailure /
//! BadRequest). Matcher errors are folded in verbatim via `MatcherFailure`.

use std::time::Duration;
use thiserror::Error;

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Error taxonomy for the matcher pool, per the `check()` contract.
#[derive(Debug, Clone, Error)]
pub enum PoolError {
    /// A requested category id is not served by any currently registered matcher.
    #[error("unknown category id(s): {}", .0.join(", "))]
    UnknownCategory(Vec<String>),

    /// The bounded job queue rejected an admission attempt.
    #[error("job queue is full (capacity exceeded)")]
    QueueFull,

    /// A job exceeded its per-job deadline. Message is built at construction
    /// time so the exact wording ("Timeout ... N milliseconds") is stable.
    #[error("{0}")]
    Timeout(String),

    /// A matcher's `check` future failed; message is the matcher's own
    /// error, passed through verbatim.
    #[error("{0}")]
    MatcherFailure(String),

    /// The incoming `Check` was malformed (e.g. duplicate block ids).
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl PoolError {
    /// Build an `UnknownCategory` error for a single offending id.
    pub fn unknown_category(id: impl Into<String>) -> Self {
        PoolError::UnknownCategory(vec![id.into()])
    }

    /// Build a `Timeout` error carrying a human-readable duration.
    pub fn timeout(duration: Duration) -> Self {
        PoolError::Timeout(format!("Timeout after {} milliseconds", duration.as_millis()))
    }

    /// True if this error kind would also be retryable by an external caller
    /// (the pool itself never retries; this is informational for callers
    /// building their own policy on top, mirroring the teacher's
    /// `is_retryable_error` convention).
    pub fn is_transient(&self) -> bool {
        matches!(self, PoolError::QueueFull | PoolError::Timeout(_))
    }
}
