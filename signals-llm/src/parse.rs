//! Response-text cleanup and parsing for collaborator replies
//!
//! The collaborator returns free-form text that is expected to contain a
//! JSON array, often wrapped in markdown code fences and sometimes with
//! trailing commas. Cleanup is applied before parsing; anything that still
//! fails to parse as one of the accepted shapes is a collaborator failure.

use crate::ProposalDraft;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex"))
}

/// Strip surrounding code-fence markers and trailing commas.
pub fn clean_response_text(text: &str) -> String {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    trailing_comma_re()
        .replace_all(text.trim(), "$1")
        .into_owned()
}

/// Parse a ranking reply into an ordered list of signal ids.
///
/// Two accepted shapes:
/// - an array of proposal-like objects, each carrying a nested `signals`
///   id array; all nested ids are flattened and concatenated in order
/// - a flat array of signal ids
///
/// Anything else yields an empty list, which callers treat as a ranking
/// failure.
pub fn parse_ranking_response(text: &str) -> Vec<String> {
    let cleaned = clean_response_text(text);
    let data: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse ranking response as JSON");
            return Vec::new();
        }
    };

    let Value::Array(items) = data else {
        tracing::error!("ranking response is not a JSON array");
        return Vec::new();
    };

    if items.first().map(Value::is_object).unwrap_or(false) {
        // Proposed-segment shape: flatten the nested id arrays.
        let mut ids = Vec::new();
        for segment in &items {
            if let Some(Value::Array(signals)) = segment.get("signals") {
                ids.extend(
                    signals
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string)),
                );
            }
        }
        ids
    } else {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

/// Parse a proposal-drafting reply into drafts.
///
/// The reply must be an array of objects; each object must carry id, name,
/// signal_ids and reasoning. Objects missing any field are skipped
/// individually rather than failing the whole batch. A non-array reply
/// yields an empty list.
pub fn parse_draft_response(text: &str) -> Vec<ProposalDraft> {
    let cleaned = clean_response_text(text);
    let data: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "failed to parse proposal response as JSON");
            return Vec::new();
        }
    };

    let Value::Array(items) = data else {
        tracing::error!("proposal response is not a JSON array");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(draft) => Some(draft),
            Err(err) => {
                tracing::warn!(index = i, error = %err, "skipping malformed proposal draft");
                None
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
