//! External-facing JSON shapes (spec §6), for an HTTP layer to serialize
//! against. This module owns no transport: it only converts between the
//! wire shapes and the core `Check`/`RuleMatch` types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Check, RuleMatch, TextBlock, TextRange};

/// `{ id?, setId, categoryIds?, blocks: [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub set_id: String,
    #[serde(default)]
    pub category_ids: Option<Vec<String>>,
    pub blocks: Vec<WireTextBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextBlock {
    pub id: String,
    pub text: String,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub skip_ranges: Option<Vec<WireTextRange>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextRange {
    pub from: usize,
    pub to: usize,
}

/// `{ input, results: { categoryIds, matches } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub input: String,
    pub results: CheckResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResults {
    pub category_ids: Vec<String>,
    pub matches: Vec<RuleMatch>,
}

impl From<CheckRequest> for Check {
    fn from(req: CheckRequest) -> Self {
        Check {
            document_id: req.id,
            set_id: req.set_id,
            category_ids: req.category_ids.map(|ids| ids.into_iter().collect()),
            blocks: req.blocks.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<WireTextBlock> for TextBlock {
    fn from(b: WireTextBlock) -> Self {
        TextBlock {
            id: b.id,
            text: b.text,
            from: b.from,
            to: b.to,
            skip_ranges: b
                .skip_ranges
                .map(|rs| rs.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<WireTextRange> for TextRange {
    fn from(r: WireTextRange) -> Self {
        TextRange::new(r.from, r.to)
    }
}

/// Builds the external-facing `CheckResponse` from a completed check's
/// aggregated outcome. `input` is the caller-supplied `setId`, matching the
/// teacher convention of echoing the request identity back in the response.
pub fn build_response(
    set_id: impl Into<String>,
    category_ids: HashSet<String>,
    matches: Vec<RuleMatch>,
) -> CheckResponse {
    CheckResponse {
        input: set_id.into(),
        results: CheckResults {
            category_ids: category_ids.into_iter().collect(),
            matches,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_request_deserializes_camel_case() {
        let json = r#"{
            "setId": "set-1",
            "categoryIds": ["cat-0"],
            "blocks": [{"id": "b0", "text": "hi", "from": 0, "to": 2, "skipRanges": [{"from": 0, "to": 0}]}]
        }"#;
        let req: CheckRequest = serde_json::from_str(json).expect("valid json");
        let check: Check = req.into();
        assert_eq!(check.set_id, "set-1");
        assert_eq!(check.blocks[0].skip_ranges.as_ref().unwrap().len(), 1);
    }
}
