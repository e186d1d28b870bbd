//! An in-memory `Matcher` used by this crate's tests and as a worked example
//! for implementers wiring a real matcher in behind the trait.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::matcher::{Matcher, MatcherError};
use crate::types::{Category, MatcherRequest, RuleMatch};

/// A matcher whose responses and failure mode are fixed at construction
/// time. Used by integration tests to exercise the pool end to end without
/// a real rule engine.
pub struct MockMatcher {
    id: String,
    kind: String,
    categories: HashSet<Category>,
    /// `(from, to, message)` triples returned verbatim for every dispatched
    /// block, unless `failure` is set.
    responses: Vec<(usize, usize, String)>,
    failure: Option<String>,
    /// When set, `check` never resolves until `release()` is called —
    /// used to exercise the timeout path.
    hang: Option<Arc<Notify>>,
    stopped: Arc<AtomicBool>,
}

impl MockMatcher {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            categories: categories.into_iter().collect(),
            responses: Vec::new(),
            failure: None,
            hang: None,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_responses(mut self, responses: Vec<(usize, usize, &str)>) -> Self {
        self.responses = responses
            .into_iter()
            .map(|(from, to, msg)| (from, to, msg.to_string()))
            .collect();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category);
        self
    }

    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Makes `check` block forever until `release()` is called on the
    /// returned handle. Used to test the per-job timeout.
    pub fn hanging() -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        let mut m = Self::new("hanging-matcher", "mock", Vec::new());
        m.hang = Some(Arc::clone(&notify));
        (m, notify)
    }

    pub fn has_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Matcher for MockMatcher {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn categories(&self) -> &HashSet<Category> {
        &self.categories
    }

    async fn check(&self, request: MatcherRequest) -> Result<Vec<RuleMatch>, MatcherError> {
        if let Some(notify) = &self.hang {
            notify.notified().await;
        }

        if let Some(msg) = &self.failure {
            return Err(msg.clone().into());
        }

        let matcher_type = self.kind.clone();
        let mut out = Vec::new();
        for block in &request.blocks {
            for (from, to, message) in &self.responses {
                out.push(RuleMatch {
                    rule: "mock-rule".to_string(),
                    from_pos: *from,
                    to_pos: *to,
                    matched_text: block.text.clone(),
                    match_context: None,
                    message: message.clone(),
                    preceding_text: None,
                    subsequent_text: None,
                    matcher_type: matcher_type.clone(),
                });
            }
        }
        self.stopped.store(true, Ordering::SeqCst);
        Ok(out)
    }
}

impl Drop for MockMatcher {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
