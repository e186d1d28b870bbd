//! `CheckPlanner`: expands a resolved `Check` into a flat list of job
//! specifications using a pluggable strategy. Both strategies are pure
//! functions of `(check, selected matchers)` so they're exercised in
//! isolation from the rest of the pool, per the spec's explicit testability
//! requirement.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::matcher::Matcher;
use crate::transform::elide;
use crate::types::{Check, MatcherRequest, TextBlock, TextRange};

/// One planned unit of dispatch before it's wrapped into a queueable `Job`.
pub(crate) struct JobSpec {
    pub matcher: Arc<dyn Matcher>,
    pub request: MatcherRequest,
    pub category_ids: HashSet<String>,
    /// Skip ranges elided from each block in `request`, by block id, so the
    /// worker can re-project that job's matches afterward.
    pub skip_ranges_by_block: HashMap<String, Vec<TextRange>>,
}

/// The pluggable strategy selected at pool construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One job per matcher, covering every block of the check.
    DocumentPerCategory,
    /// One job per (matcher, block) pair, maximising parallelism.
    BlockLevel,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::DocumentPerCategory
    }
}

fn matcher_category_ids(matcher: &dyn Matcher) -> HashSet<String> {
    matcher.categories().iter().map(|c| c.id.clone()).collect()
}

fn elide_block(block: &TextBlock) -> (TextBlock, Vec<TextRange>) {
    let ranges = block.skip_ranges.clone().unwrap_or_default();
    (elide(block, &ranges), ranges)
}

/// Plan jobs according to `strategy` for the given check and the matchers
/// already selected (intersecting the resolved category set).
pub(crate) fn plan(
    strategy: Strategy,
    check: &Check,
    selected_matchers: &[Arc<dyn Matcher>],
) -> Vec<JobSpec> {
    match strategy {
        Strategy::DocumentPerCategory => document_per_category(check, selected_matchers),
        Strategy::BlockLevel => block_level(check, selected_matchers),
    }
}

fn document_per_category(check: &Check, selected_matchers: &[Arc<dyn Matcher>]) -> Vec<JobSpec> {
    let mut elided_blocks = Vec::with_capacity(check.blocks.len());
    let mut skip_ranges_by_block = HashMap::with_capacity(check.blocks.len());
    for block in &check.blocks {
        let (elided, ranges) = elide_block(block);
        skip_ranges_by_block.insert(block.id.clone(), ranges);
        elided_blocks.push(elided);
    }

    selected_matchers
        .iter()
        .map(|matcher| JobSpec {
            matcher: Arc::clone(matcher),
            request: MatcherRequest {
                blocks: elided_blocks.clone(),
            },
            category_ids: matcher_category_ids(matcher.as_ref()),
            skip_ranges_by_block: skip_ranges_by_block.clone(),
        })
        .collect()
}

fn block_level(check: &Check, selected_matchers: &[Arc<dyn Matcher>]) -> Vec<JobSpec> {
    let mut specs = Vec::with_capacity(check.blocks.len() * selected_matchers.len());
    for block in &check.blocks {
        let (elided, ranges) = elide_block(block);
        let mut skip_ranges_by_block = HashMap::with_capacity(1);
        skip_ranges_by_block.insert(block.id.clone(), ranges);

        for matcher in selected_matchers {
            specs.push(JobSpec {
                matcher: Arc::clone(matcher),
                request: MatcherRequest {
                    blocks: vec![elided.clone()],
                },
                category_ids: matcher_category_ids(matcher.as_ref()),
                skip_ranges_by_block: skip_ranges_by_block.clone(),
            });
        }
    }
    specs
}
