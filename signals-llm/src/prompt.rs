//! Prompt construction for ranking and proposal drafting

use serde::Serialize;
use signals_core::Signal;

/// Candidate attributes serialized into the ranking prompt.
#[derive(Debug, Serialize)]
struct RankingCandidate<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    provider: &'a str,
    coverage_percentage: f64,
    price: f64,
    signal_type: String,
}

/// Candidate attributes serialized into the proposal prompt; includes the
/// resolved live-platform sets so drafts can honor platform unity.
#[derive(Debug, Serialize)]
struct ProposalCandidate<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    provider: &'a str,
    coverage_percentage: f64,
    price: f64,
    allowed_platforms: &'a [String],
}

/// Build the ranking prompt for a campaign query over candidate signals.
pub fn build_ranking_prompt(query: &str, candidates: &[Signal], max_results: usize) -> String {
    let info: Vec<RankingCandidate<'_>> = candidates
        .iter()
        .map(|s| RankingCandidate {
            id: &s.id,
            name: &s.name,
            description: s.description.as_deref().unwrap_or(""),
            provider: &s.provider,
            coverage_percentage: s.coverage_percentage,
            price: s.price,
            signal_type: s.signal_type.to_string(),
        })
        .collect();
    let info_json = serde_json::to_string_pretty(&info).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are a Signal Discovery and Matching Agent for the Ad Context Protocol.
Your job is to take the provided list of available signals and recommend one or more "Proposed Segments" for the advertising campaign.

Campaign Query: "{query}"

Available signals:
{info_json}

Follow these rules strictly:
1. Return ONLY valid JSON.
2. Do not include any commentary or explanations outside the JSON.
3. Each proposed segment must:
   - Contain only signal IDs from the provided list.
   - Include at least 1 signal.
   - Share at least one common decisioning platform.
   - Use OR logic only (no AND logic).
4. Do not create new or imaginary signal IDs.
5. Use the campaign context to select relevant signals.

Return a JSON array of proposed segments, like:
[
  {{
    "id": "proposal_001",
    "name": "Relevant Audience Segment",
    "description": "Targets users relevant to the campaign query",
    "signals": ["signal_001", "signal_002"]
  }}
]

Limit to top {max_results} most relevant signals.
"#
    )
}

/// Build the proposal-drafting prompt over ranked signals.
pub fn build_proposal_prompt(query: &str, ranked: &[Signal], max_proposals: usize) -> String {
    let info: Vec<ProposalCandidate<'_>> = ranked
        .iter()
        .map(|s| ProposalCandidate {
            id: &s.id,
            name: &s.name,
            description: s.description.as_deref().unwrap_or(""),
            provider: &s.provider,
            coverage_percentage: s.coverage_percentage,
            price: s.price,
            allowed_platforms: &s.allowed_platforms,
        })
        .collect();
    let info_json = serde_json::to_string_pretty(&info).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are an AI assistant that creates advertising signal proposals based on a search query.

Query: "{query}"

Available signals:
{info_json}

Task: Create {max_proposals} proposals that combine signals to target the query effectively.

Rules:
- Use only OR logic (no AND logic)
- Each proposal should have 1-3 signals
- Signals in a proposal must share at least one platform
- Provide a meaningful name and reasoning for each proposal

Return ONLY a JSON array of proposals, like:
[
  {{
    "id": "proposal_001",
    "name": "High-Value Audience Package",
    "signal_ids": ["signal_001", "signal_002"],
    "reasoning": "Combines high-value shoppers with tech enthusiasts for premium targeting"
  }}
]

Each proposal must have: id, name, signal_ids (array), reasoning (string)
"#
    )
}

// =============================================================================
// TESTS
// =============================================================================
