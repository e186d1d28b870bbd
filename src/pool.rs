//! `MatcherPool`: the public surface. Registers/unregisters matchers,
//! accepts `check` requests, and orchestrates planning, queueing, execution
//! and aggregation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tokio::sync::{oneshot, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::matcher::Matcher;
use crate::planner::{self, Strategy};
use crate::queue::JobQueue;
use crate::types::{Category, Check, Job, RuleMatch};
use crate::worker;

/// A registry entry: the matcher together with the id the pool resolved for
/// it at registration time (either the matcher's own `id()`, or one freshly
/// allocated from `next_matcher_id()` if it didn't have one).
#[derive(Clone)]
struct RegisteredMatcher {
    id: String,
    matcher: Arc<dyn Matcher>,
}

/// The concurrent dispatch engine. Cheap to clone (an `Arc` internally would
/// also work, but the pool itself only holds cloneable handles, so the type
/// is used behind an `Arc` by callers that need to share it across tasks).
pub struct MatcherPool {
    matchers: RwLock<Vec<RegisteredMatcher>>,
    next_id: AtomicU64,
    config: PoolConfig,
    queue: JobQueue,
    _workers: Vec<tokio::task::JoinHandle<()>>,
}

impl MatcherPool {
    /// Construct a pool with the given configuration, spawning its fixed
    /// worker set immediately.
    pub fn new(config: PoolConfig) -> Self {
        let (queue, receiver) = JobQueue::new(config.max_queued_jobs);
        let workers = worker::spawn(config.max_current_jobs, receiver);
        Self {
            matchers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            config,
            queue,
            _workers: workers,
        }
    }

    /// Register a matcher. If it has no id of its own (`Matcher::id()`
    /// returns an empty string), a monotonically unique id is assigned via
    /// `next_matcher_id()`. Idempotent by identity: re-adding the same `Arc`
    /// pointer is a no-op.
    pub async fn add_matcher(&self, matcher: Arc<dyn Matcher>) {
        let mut guard = self.matchers.write().await;
        if guard.iter().any(|r| Arc::ptr_eq(&r.matcher, &matcher)) {
            return;
        }
        let id = if matcher.id().is_empty() {
            self.next_matcher_id()
        } else {
            matcher.id().to_string()
        };
        info!(matcher_id = %id, matcher_kind = matcher.kind(), "registering matcher");
        guard.push(RegisteredMatcher { id, matcher });
    }

    /// Allocate a fresh matcher id, for matcher implementations that don't
    /// assign their own at construction time.
    pub fn next_matcher_id(&self) -> String {
        format!("matcher-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Remove a matcher by its registered id (the id resolved at
    /// registration time, not necessarily `matcher.id()` if one was
    /// assigned). In-flight jobs for that matcher are not cancelled; their
    /// results are still delivered.
    pub async fn remove_matcher_by_id(&self, id: &str) {
        let mut guard = self.matchers.write().await;
        guard.retain(|r| r.id != id);
    }

    /// Clear the registry. Same in-flight semantics as `remove_matcher_by_id`.
    pub async fn remove_all_matchers(&self) {
        self.matchers.write().await.clear();
    }

    /// The union of `categories()` over every currently registered matcher.
    pub async fn get_current_categories(&self) -> HashSet<Category> {
        let guard = self.matchers.read().await;
        guard
            .iter()
            .flat_map(|r| r.matcher.categories().iter().cloned())
            .collect()
    }

    /// The main operation: plan, enqueue, execute and aggregate a check.
    #[instrument(skip(self, check), fields(set_id = %check.set_id))]
    pub async fn check(&self, check: Check) -> PoolResult<(HashSet<String>, Vec<RuleMatch>)> {
        validate_check(&check)?;

        // Snapshot the registry under a short read lock; removals that
        // happen after this point don't affect this call.
        let snapshot: Vec<RegisteredMatcher> = self.matchers.read().await.clone();

        let resolved_categories = resolve_categories(&check, &snapshot)?;
        let selected: Vec<Arc<dyn Matcher>> = snapshot
            .into_iter()
            .filter(|r| {
                r.matcher
                    .categories()
                    .iter()
                    .any(|c| resolved_categories.contains(&c.id))
            })
            .map(|r| r.matcher)
            .collect();

        let specs = planner::plan(self.config.strategy, &check, &selected);

        let check_id = check
            .document_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let deadline = Instant::now() + self.config.check_timeout;

        let mut receivers = Vec::with_capacity(specs.len());
        let mut reported_categories: HashSet<String> = HashSet::new();
        let mut queue_full = false;

        for spec in specs {
            reported_categories.extend(spec.category_ids.iter().cloned());
            let (tx, rx) = oneshot::channel();
            let job = Job {
                check_id: check_id.clone(),
                matcher: spec.matcher,
                request: spec.request,
                category_ids: spec.category_ids,
                deadline,
                timeout_duration: self.config.check_timeout,
                skip_ranges_by_block: spec.skip_ranges_by_block,
                response_tx: tx,
            };
            if self.queue.offer(job) {
                receivers.push(rx);
            } else {
                queue_full = true;
            }
        }

        if queue_full {
            // Jobs already admitted above keep running; we simply stop
            // waiting on them, matching the spec's "results are discarded"
            // clause for this request.
            return Err(PoolError::QueueFull);
        }

        let futures = receivers.into_iter().map(|rx| async move {
            match rx.await {
                Ok(result) => result,
                Err(_recv_error) => Err(PoolError::MatcherFailure(
                    "matcher task dropped its response channel".to_string(),
                )),
            }
        });

        let results = try_join_all(futures).await?;
        let all_matches: Vec<RuleMatch> = results.into_iter().flatten().collect();

        Ok((reported_categories, all_matches))
    }
}

fn validate_check(check: &Check) -> PoolResult<()> {
    let mut seen = HashSet::with_capacity(check.blocks.len());
    for block in &check.blocks {
        if !seen.insert(&block.id) {
            return Err(PoolError::BadRequest(format!(
                "duplicate block id: {}",
                block.id
            )));
        }
    }
    Ok(())
}

fn resolve_categories(
    check: &Check,
    matchers: &[RegisteredMatcher],
) -> PoolResult<HashSet<String>> {
    let available: HashSet<String> = matchers
        .iter()
        .flat_map(|r| r.matcher.categories().iter().map(|c| c.id.clone()))
        .collect();

    match check.requested_categories() {
        None => Ok(available),
        Some(requested) => {
            let unknown: Vec<String> = requested
                .iter()
                .filter(|id| !available.contains(*id))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(PoolError::UnknownCategory(unknown));
            }
            Ok(requested.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::mock::MockMatcher;
    use crate::types::TextBlock;

    fn mk_pool(config: PoolConfig) -> MatcherPool {
        MatcherPool::new(config)
    }

    #[tokio::test]
    async fn single_matcher_single_block() {
        let pool = mk_pool(PoolConfig::default());
        let matcher = Arc::new(
            MockMatcher::new("m0", "mock", vec![Category::new("mock-category-0", "mock-category-0")])
                .with_responses(vec![(0, 5, "test-response")]),
        );
        pool.add_matcher(matcher).await;

        let check = Check::new("set", vec![TextBlock::new("b0", "Example text", 0)]);
        let (categories, matches) = pool.check(check).await.expect("check should succeed");

        assert_eq!(categories, HashSet::from(["mock-category-0".to_string()]));
        assert_eq!(matches.len(), 1);
        assert_eq!((matches[0].from_pos, matches[0].to_pos), (0, 5));
        assert_eq!(matches[0].message, "test-response");
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let pool = mk_pool(PoolConfig::default());
        pool.add_matcher(Arc::new(MockMatcher::new(
            "m0",
            "mock",
            vec![Category::new("mock-category-0", "mock-category-0")],
        )))
        .await;
        pool.add_matcher(Arc::new(MockMatcher::new(
            "m1",
            "mock",
            vec![Category::new("mock-category-1", "mock-category-1")],
        )))
        .await;

        let mut check = Check::new("set", vec![TextBlock::new("b0", "Example text", 0)]);
        check.category_ids = Some(HashSet::from(["category-id-does-not-exist".to_string()]));

        let err = pool.check(check).await.unwrap_err();
        assert!(err.to_string().contains("category-id-does-not-exist"));
    }

    #[tokio::test]
    async fn matcher_error_surfaces_verbatim() {
        let pool = mk_pool(PoolConfig::default());
        pool.add_matcher(Arc::new(
            MockMatcher::new("m0", "mock", vec![Category::new("mock-category-0", "mock-category-0")])
                .with_responses(vec![(0, 5, "ok")]),
        ))
        .await;
        pool.add_matcher(Arc::new(
            MockMatcher::new("m1", "mock", vec![Category::new("mock-category-1", "mock-category-1")])
                .with_failure("Something went wrong"),
        ))
        .await;

        let check = Check::new("set", vec![TextBlock::new("b0", "Example text", 0)]);
        let err = pool.check(check).await.unwrap_err();
        assert_eq!(err.to_string(), "Something went wrong");
    }

    #[tokio::test]
    async fn queue_saturation_fails_with_full() {
        let config = PoolConfig {
            max_current_jobs: 1,
            max_queued_jobs: 1,
            strategy: Strategy::BlockLevel,
            check_timeout: Duration::from_secs(5),
        };
        let pool = mk_pool(config);
        pool.add_matcher(Arc::new(
            MockMatcher::new("m0", "mock", vec![Category::new("mock-category-0", "mock-category-0")])
                .with_responses(vec![(0, 5, "ok")]),
        ))
        .await;

        let blocks: Vec<TextBlock> = (0..101)
            .map(|i| TextBlock::new(format!("b{i}"), "Example text", i * 100))
            .collect();
        let check = Check::new("set", blocks);

        let err = pool.check(check).await.unwrap_err();
        assert!(err.to_string().contains("full"));
    }

    #[tokio::test]
    async fn timeout_fails_with_expected_message() {
        let config = PoolConfig {
            check_timeout: Duration::from_millis(500),
            ..PoolConfig::default()
        };
        let pool = mk_pool(config);
        let (matcher, _notify) = MockMatcher::hanging();
        let matcher = matcher.with_category(Category::new("mock-category-0", "mock-category-0"));
        pool.add_matcher(Arc::new(matcher)).await;

        let check = Check::new("set", vec![TextBlock::new("b0", "Example text", 0)]);

        let start = Instant::now();
        let err = pool.check(check).await.unwrap_err();

        assert!(err.to_string().contains("Timeout"));
        assert!(err.to_string().contains("500 milliseconds"));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn matcher_without_its_own_id_gets_one_assigned() {
        let pool = mk_pool(PoolConfig::default());
        // Empty string signals "no id of its own" per the `Matcher::id` contract.
        pool.add_matcher(Arc::new(MockMatcher::new(
            "",
            "mock",
            vec![Category::new("mock-category-0", "mock-category-0")],
        )))
        .await;
        pool.add_matcher(Arc::new(MockMatcher::new(
            "",
            "mock",
            vec![Category::new("mock-category-1", "mock-category-1")],
        )))
        .await;

        // Both got distinct, pool-assigned ids, so removing one by its
        // assigned id leaves only the other registered.
        pool.remove_matcher_by_id("matcher-1").await;
        let remaining = pool.get_current_categories().await;
        assert_eq!(
            remaining,
            HashSet::from([Category::new("mock-category-1", "mock-category-1")])
        );
    }
}
