//! Core data model: categories, blocks, checks, matches and jobs.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::matcher::Matcher;
use std::sync::Arc;

/// A named grouping of rules, used to filter work and report coverage.
///
/// Equality and hashing are by `id` alone: two `Category` values with the
/// same id but different `name`/`color` are the same category for set
/// membership purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: None,
        }
    }
}

/// A rule a matcher or validator can raise, referenced opaquely by id/name.
/// Rule storage and XML ingestion are out of scope (spec §1); this struct
/// only fixes the shape a `Validator::rules()` report is made of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An inclusive-inclusive single-character range of absolute document offsets.
///
/// A single character has `from == to`. Ranges passed to the transform must
/// be non-overlapping, sorted ascending, and fully contained in their block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Number of characters covered by this range.
    pub fn char_count(&self) -> usize {
        self.to - self.from + 1
    }
}

/// One contiguous region of the source document.
///
/// `from`/`to` are document offsets, `text` is that slice, and
/// `to - from == text.len()` (byte length, matching the offset unit used
/// throughout this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    pub text: String,
    pub from: usize,
    pub to: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_ranges: Option<Vec<TextRange>>,
}

impl TextBlock {
    pub fn new(id: impl Into<String>, text: impl Into<String>, from: usize) -> Self {
        let text = text.into();
        let to = from + text.len();
        Self {
            id: id.into(),
            text,
            from,
            to,
            skip_ranges: None,
        }
    }

    pub fn with_skip_ranges(mut self, ranges: Vec<TextRange>) -> Self {
        self.skip_ranges = Some(ranges);
        self
    }
}

/// One caller-facing request to examine a document's blocks against some
/// categories. `category_ids == None` (or `Some(empty)`) means "all
/// registered categories."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    #[serde(default)]
    pub document_id: Option<String>,
    pub set_id: String,
    #[serde(default)]
    pub category_ids: Option<HashSet<String>>,
    pub blocks: Vec<TextBlock>,
}

impl Check {
    pub fn new(set_id: impl Into<String>, blocks: Vec<TextBlock>) -> Self {
        Self {
            document_id: None,
            set_id: set_id.into(),
            category_ids: None,
            blocks,
        }
    }

    /// The resolved request categories: `None`/empty both mean "all".
    pub fn requested_categories(&self) -> Option<&HashSet<String>> {
        match &self.category_ids {
            Some(ids) if !ids.is_empty() => Some(ids),
            _ => None,
        }
    }
}

/// What actually reaches a matcher after category filtering and skipped-range
/// elision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherRequest {
    pub blocks: Vec<TextBlock>,
}

/// One reported rule violation, in document coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub rule: String,
    pub from_pos: usize,
    pub to_pos: usize,
    pub matched_text: String,
    #[serde(default)]
    pub match_context: Option<String>,
    pub message: String,
    #[serde(default)]
    pub preceding_text: Option<String>,
    #[serde(default)]
    pub subsequent_text: Option<String>,
    pub matcher_type: String,
}

/// One unit of work dispatched to one matcher by the planner.
///
/// Internal to the pool; never exposed across the `check()` boundary.
pub(crate) struct Job {
    pub check_id: String,
    pub matcher: Arc<dyn Matcher>,
    pub request: MatcherRequest,
    pub category_ids: HashSet<String>,
    pub deadline: Instant,
    /// The nominal per-job timeout, for error messages: using `deadline -
    /// now` there would make the reported duration drift with however long
    /// the job sat queued, rather than reflecting the pool's configured
    /// `check_timeout_duration`.
    pub timeout_duration: std::time::Duration,
    /// Ranges removed from each block in `request`, keyed by block id, used
    /// to re-project matcher-reported offsets back to document coordinates.
    pub skip_ranges_by_block: std::collections::HashMap<String, Vec<TextRange>>,
    pub response_tx: tokio::sync::oneshot::Sender<crate::error::PoolResult<Vec<RuleMatch>>>,
}
