//! Candidate ranking
//!
//! Asks the registered provider to order candidates by relevance and
//! falls back to a deterministic coverage sort when no provider is
//! registered or the provider fails. The fallback is total: any ranked
//! list the caller receives came from exactly one of the two paths.

use signals_core::{RankingMethod, Signal};
use signals_llm::ProviderRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Orders candidates by relevance, generatively when possible.
pub struct RankingEngine {
    registry: Arc<ProviderRegistry>,
}

impl RankingEngine {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Rank candidates for a query, returning at most `max_results`.
    ///
    /// On the provider path the returned id sequence is authoritative:
    /// ids the provider did not mention are never backfilled, and ids
    /// not present in the candidate list are dropped.
    pub async fn rank(
        &self,
        query: &str,
        candidates: &[Signal],
        max_results: usize,
    ) -> (Vec<Signal>, RankingMethod) {
        if candidates.is_empty() {
            return (Vec::new(), RankingMethod::Fallback);
        }

        let provider = match self.registry.ranking() {
            Ok(provider) => provider,
            Err(_) => {
                debug!(query, "no ranking provider registered, using fallback ranking");
                return (self.fallback_rank(candidates, max_results), RankingMethod::Fallback);
            }
        };

        match provider.rank(query, candidates, max_results).await {
            Ok(ids) => {
                let ranked = reorder_by_ids(candidates, &ids, max_results);
                if ranked.is_empty() {
                    warn!(query, "provider ranking matched no known candidates, using fallback");
                    (self.fallback_rank(candidates, max_results), RankingMethod::Fallback)
                } else {
                    (ranked, RankingMethod::AiRanking)
                }
            }
            Err(e) => {
                warn!(error = %e, query, "provider ranking failed, using fallback");
                (self.fallback_rank(candidates, max_results), RankingMethod::Fallback)
            }
        }
    }

    /// Deterministic ranking: coverage descending (stable), first signal
    /// per name, truncated. Idempotent over its input.
    pub fn fallback_rank(&self, candidates: &[Signal], max_results: usize) -> Vec<Signal> {
        let mut sorted: Vec<Signal> = candidates.to_vec();
        sorted.sort_by(|a, b| {
            b.coverage_percentage
                .partial_cmp(&a.coverage_percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut seen_names: HashSet<String> = HashSet::new();
        sorted.retain(|s| seen_names.insert(s.name.clone()));
        sorted.truncate(max_results);
        sorted
    }
}

/// Reorder candidates to match a provider-returned id sequence. Unknown
/// ids are dropped, names deduplicate to their first occurrence, and the
/// result is truncated.
fn reorder_by_ids(candidates: &[Signal], ids: &[String], max_results: usize) -> Vec<Signal> {
    let by_id: HashMap<&str, &Signal> =
        candidates.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut seen_names: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if out.len() >= max_results {
            break;
        }
        if let Some(signal) = by_id.get(id.as_str()) {
            if seen_names.insert(signal.name.clone()) {
                out.push((*signal).clone());
            }
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use signals_llm::MockRankingProvider;
    use signals_store::sample_signal;

    fn engine_with(provider: Option<MockRankingProvider>) -> RankingEngine {
        let mut registry = ProviderRegistry::new();
        if let Some(p) = provider {
            registry.register_ranking(Box::new(p));
        }
        RankingEngine::new(Arc::new(registry))
    }

    fn candidates() -> Vec<Signal> {
        vec![
            sample_signal("sig_a", "Alpha", 30.0, 2.0),
            sample_signal("sig_b", "Beta", 70.0, 1.0),
            sample_signal("sig_c", "Gamma", 50.0, 3.0),
        ]
    }

    #[tokio::test]
    async fn test_provider_order_is_authoritative() {
        let engine = engine_with(Some(MockRankingProvider::new().with_ranked_ids(vec![
            "sig_c".to_string(),
            "sig_a".to_string(),
        ])));
        let (ranked, method) = engine.rank("q", &candidates(), 5).await;
        assert_eq!(method, RankingMethod::AiRanking);
        let ids: Vec<_> = ranked.iter().map(|s| s.id.as_str()).collect();
        // sig_b was not mentioned and is never backfilled
        assert_eq!(ids, vec!["sig_c", "sig_a"]);
    }

    #[tokio::test]
    async fn test_provider_unknown_ids_dropped() {
        let engine = engine_with(Some(MockRankingProvider::new().with_ranked_ids(vec![
            "sig_zzz".to_string(),
            "sig_b".to_string(),
        ])));
        let (ranked, method) = engine.rank("q", &candidates(), 5).await;
        assert_eq!(method, RankingMethod::AiRanking);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "sig_b");
    }

    #[tokio::test]
    async fn test_provider_only_unknown_ids_falls_back() {
        let engine = engine_with(Some(
            MockRankingProvider::new().with_ranked_ids(vec!["sig_zzz".to_string()]),
        ));
        let (ranked, method) = engine.rank("q", &candidates(), 5).await;
        assert_eq!(method, RankingMethod::Fallback);
        assert_eq!(ranked.len(), 3);
    }

    #[tokio::test]
    async fn test_no_provider_uses_fallback() {
        let engine = engine_with(None);
        let (ranked, method) = engine.rank("q", &candidates(), 5).await;
        assert_eq!(method, RankingMethod::Fallback);
        let ids: Vec<_> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sig_b", "sig_c", "sig_a"]);
    }

    #[tokio::test]
    async fn test_provider_failure_uses_fallback() {
        let engine = engine_with(Some(
            MockRankingProvider::new()
                .with_ranked_ids(vec!["sig_a".to_string()])
                .failing_rank(),
        ));
        let (ranked, method) = engine.rank("q", &candidates(), 5).await;
        assert_eq!(method, RankingMethod::Fallback);
        assert_eq!(ranked.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_candidates_short_circuit() {
        let engine = engine_with(Some(
            MockRankingProvider::new().with_ranked_ids(vec!["sig_a".to_string()]),
        ));
        let (ranked, method) = engine.rank("q", &[], 5).await;
        assert!(ranked.is_empty());
        assert_eq!(method, RankingMethod::Fallback);
    }

    #[test]
    fn test_fallback_rank_dedups_and_truncates() {
        let engine = engine_with(None);
        let input = vec![
            sample_signal("sig_1", "Alpha", 90.0, 1.0),
            sample_signal("sig_2", "Alpha", 80.0, 1.0),
            sample_signal("sig_3", "Beta", 70.0, 1.0),
            sample_signal("sig_4", "Gamma", 60.0, 1.0),
        ];
        let ranked = engine.fallback_rank(&input, 2);
        let ids: Vec<_> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sig_1", "sig_3"]);
    }

    #[test]
    fn test_fallback_rank_is_idempotent() {
        let engine = engine_with(None);
        let input = candidates();
        let first = engine.fallback_rank(&input, 10);
        let second = engine.fallback_rank(&input, 10);
        assert_eq!(first, second);
    }
}
