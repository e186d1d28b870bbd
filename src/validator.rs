//! The `Validator` surface: an external-facing adapter wrapping a matcher
//! with additional per-domain logic (e.g. resolving named entities against
//! an external search service, then synthesising a `RuleMatch`).
//!
//! A validator is presented to the pool as an ordinary `Matcher` whose
//! `categories()` is a single synthetic category; the pool doesn't
//! distinguish it from any other matcher.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::matcher::{Matcher, MatcherError};
use crate::types::{Category, MatcherRequest, Rule, RuleMatch};

/// External-facing capability: resolves a request (typically fanning out to
/// an external service) and returns matches.
#[async_trait]
pub trait Validator: Send + Sync {
    /// The single synthetic category this validator reports under.
    fn category(&self) -> &Category;

    /// The rules this validator can raise.
    fn rules(&self) -> &[Rule];

    /// Evaluate a request, potentially making asynchronous external calls.
    async fn check(&self, request: MatcherRequest) -> Result<Vec<RuleMatch>, MatcherError>;
}

/// Adapts any [`Validator`] into a [`Matcher`] so the pool can dispatch to
/// it exactly like any other registered matcher.
pub struct ValidatorMatcher<V> {
    id: String,
    inner: V,
    categories: HashSet<Category>,
}

impl<V: Validator> ValidatorMatcher<V> {
    pub fn new(id: impl Into<String>, inner: V) -> Self {
        let categories = HashSet::from([inner.category().clone()]);
        Self {
            id: id.into(),
            inner,
            categories,
        }
    }
}

#[async_trait]
impl<V: Validator> Matcher for ValidatorMatcher<V> {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        "validator"
    }

    fn categories(&self) -> &HashSet<Category> {
        &self.categories
    }

    async fn check(&self, request: MatcherRequest) -> Result<Vec<RuleMatch>, MatcherError> {
        self.inner.check(request).await
    }
}
