//! The `Matcher` capability: the uniform interface the pool consumes from
//! external rule engines. Individual matcher implementations (a regex
//! engine, a grammar engine, a name-lookup validator) are out of scope here;
//! this module fixes only the trait they must implement.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::types::{Category, MatcherRequest, RuleMatch};

/// Error returned by a matcher's `check`. The pool treats the `Display`
/// output as the verbatim failure message (spec: `MatcherFailure` surfaces
/// the matcher's own error message unchanged).
pub type MatcherError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A registered rule engine. The pool never inspects a matcher's internals:
/// it only calls `check`, reads `categories`, and uses `id`/`kind` for
/// bookkeeping and error messages.
#[async_trait]
pub trait Matcher: Send + Sync {
    /// Stable identifier. An empty string means the matcher has no id of its
    /// own; the pool assigns one (via `MatcherPool::next_matcher_id`) at
    /// registration in that case.
    fn id(&self) -> &str;

    /// Engine kind, e.g. "regex", "grammar", "name-lookup".
    fn kind(&self) -> &str;

    /// The set of categories this matcher can evaluate.
    fn categories(&self) -> &HashSet<Category>;

    /// Examine the request's blocks and report matches. May fail with any
    /// error; the pool surfaces the error's `Display` output verbatim.
    async fn check(&self, request: MatcherRequest) -> Result<Vec<RuleMatch>, MatcherError>;
}
