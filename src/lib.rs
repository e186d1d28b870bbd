//! `matcher-pool`: a concurrent text-checking matcher pool.
//!
//! Routes blocks of input text to a set of registered [`Matcher`]s and
//! aggregates their results into a single response, with admission control,
//! category/block fan-out planning, per-job timeouts, and coordinate
//! mapping across redacted ("skipped") text regions.
//!
//! ```
//! use std::sync::Arc;
//! use matcher_pool::{Category, Check, MatcherPool, PoolConfig, TextBlock};
//! use matcher_pool::mock::MockMatcher;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pool = MatcherPool::new(PoolConfig::default());
//! let matcher = Arc::new(
//!     MockMatcher::new("m0", "mock", vec![Category::new("typo", "Typos")])
//!         .with_responses(vec![(0, 5, "looks off")]),
//! );
//! pool.add_matcher(matcher).await;
//!
//! let check = Check::new("set-1", vec![TextBlock::new("b0", "Example text", 0)]);
//! let (categories, matches) = pool.check(check).await.unwrap();
//! assert_eq!(matches.len(), 1);
//! assert!(categories.contains("typo"));
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod api;
pub mod config;
pub mod error;
pub mod matcher;
pub mod mock;
pub mod planner;
mod pool;
mod queue;
pub mod transform;
pub mod types;
pub mod validator;
mod worker;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use matcher::{Matcher, MatcherError};
pub use planner::Strategy;
pub use pool::MatcherPool;
pub use types::{Category, Check, MatcherRequest, RuleMatch, TextBlock, TextRange};
pub use validator::{Validator, ValidatorMatcher};

/// Initialize a `tracing` subscriber reading `RUST_LOG`/`MATCHER_POOL_LOG`.
/// Never called implicitly by library code; binaries and tests opt in.
#[cfg(feature = "otel")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("MATCHER_POOL_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
