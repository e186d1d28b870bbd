//! The skipped-range transform: elides marked character ranges from a
//! block's text before it reaches a matcher, and re-projects matcher-reported
//! offsets back into document coordinates afterwards.
//!
//! Both operations are pure functions of their inputs so they can (and are)
//! tested in isolation from the rest of the pool.

use crate::types::{RuleMatch, TextBlock, TextRange};

/// Remove every character covered by `ranges` from `block.text`, returning a
/// new block with `from` unchanged and `to` shrunk to match the elided text's
/// length. The returned block carries no `skip_ranges` of its own.
///
/// `ranges` must be sorted ascending and non-overlapping, each fully
/// contained in `[block.from, block.to)`.
pub fn elide(block: &TextBlock, ranges: &[TextRange]) -> TextBlock {
    if ranges.is_empty() {
        return TextBlock {
            id: block.id.clone(),
            text: block.text.clone(),
            from: block.from,
            to: block.to,
            skip_ranges: None,
        };
    }

    let bytes = block.text.as_bytes();
    let mut kept = Vec::with_capacity(bytes.len());
    for (offset, byte) in bytes.iter().enumerate() {
        let abs = block.from + offset;
        let skipped = ranges
            .iter()
            .any(|r| r.from <= abs && abs <= r.to);
        if !skipped {
            kept.push(*byte);
        }
    }

    // Skipped ranges only ever cover ASCII rule-marker characters in
    // practice, but we don't assume that: fall back to lossy conversion
    // rather than panicking on a boundary that lands mid-codepoint.
    let text = String::from_utf8(kept).unwrap_or_else(|e| {
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    });
    let to = block.from + text.len();

    TextBlock {
        id: block.id.clone(),
        text,
        from: block.from,
        to,
        skip_ranges: None,
    }
}

/// Re-project a single document offset that was computed against the
/// elided text back into the coordinates of the original block.
///
/// For each skipped range in ascending order, once the range's start is at
/// or before the current candidate position, shift the candidate forward by
/// the range's length. Ranges are applied in order so each later range's
/// shift correctly accounts for all earlier insertions.
pub fn reproject_offset(candidate: usize, ranges: &[TextRange]) -> usize {
    let mut pos = candidate;
    for r in ranges {
        if r.from <= pos {
            pos += r.char_count();
        }
    }
    pos
}

/// Re-project every match's `from_pos`/`to_pos` reported against the elided
/// text back into the original block's document coordinates.
pub fn reproject_matches(matches: Vec<RuleMatch>, ranges: &[TextRange]) -> Vec<RuleMatch> {
    if ranges.is_empty() {
        return matches;
    }
    matches
        .into_iter()
        .map(|mut m| {
            m.from_pos = reproject_offset(m.from_pos, ranges);
            m.to_pos = reproject_offset(m.to_pos, ranges);
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleMatch;

    fn range(from: usize, to: usize) -> TextRange {
        TextRange::new(from, to)
    }

    fn rule_match(from: usize, to: usize) -> RuleMatch {
        RuleMatch {
            rule: "r".into(),
            from_pos: from,
            to_pos: to,
            matched_text: String::new(),
            match_context: None,
            message: String::new(),
            preceding_text: None,
            subsequent_text: None,
            matcher_type: "mock".into(),
        }
    }

    #[test]
    fn elide_removes_marked_single_chars() {
        let block = TextBlock::new("b0", "ABCDEF", 0);
        let ranges = vec![range(0, 0), range(2, 2), range(4, 4)];
        let out = elide(&block, &ranges);
        assert_eq!(out.text, "BDF");
        assert_eq!(out.from, 0);
        assert_eq!(out.to, 3);
        assert!(out.skip_ranges.is_none());
    }

    #[test]
    fn elide_with_no_ranges_is_identity() {
        let block = TextBlock::new("b0", "hello", 10);
        let out = elide(&block, &[]);
        assert_eq!(out.text, "hello");
        assert_eq!(out.from, 10);
        assert_eq!(out.to, 15);
    }

    #[test]
    fn reproject_worked_example() {
        // text = "ABCDEF", skippedRanges [(0,0),(2,2),(4,4)] -> matcher sees "BDF"
        let ranges = vec![range(0, 0), range(2, 2), range(4, 4)];
        let matches = vec![rule_match(0, 0), rule_match(2, 2)];
        let out = reproject_matches(matches, &ranges);
        assert_eq!((out[0].from_pos, out[0].to_pos), (1, 1));
        assert_eq!((out[1].from_pos, out[1].to_pos), (5, 5));
    }

    #[test]
    fn reproject_respects_block_invariant_for_every_kept_offset() {
        let block = TextBlock::new("b0", "ABCDEF", 100);
        let ranges = vec![range(100, 100), range(102, 102), range(104, 104)];
        let elided = elide(&block, &ranges);
        // Matcher-reported positions are document-relative to elided.from,
        // not zero-based into the slice; confirm every one round-trips
        // inside the original block's bounds.
        for (i, _) in elided.text.char_indices() {
            let reported = elided.from + i;
            let back = reproject_offset(reported, &ranges);
            assert!(back >= block.from && back <= block.to);
        }
    }
}
