//! Generative collaborator layer for signal discovery
//!
//! Provider-agnostic traits for AI-assisted candidate ranking and
//! proposal drafting. A provider is consulted on a best-effort basis:
//! every error it returns is recovered by the engine's deterministic
//! fallback path, never surfaced to callers.

pub mod parse;
pub mod prompt;
pub mod providers;

pub use providers::{GeminiClient, GeminiProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signals_core::{CollaboratorError, Signal, SignalsError, SignalsResult};
use std::sync::Arc;

// ============================================================================
// RANKING PROVIDER TRAIT
// ============================================================================

/// A proposal sketched by the collaborator. Drafts carry raw signal ids
/// that have not yet been checked against the catalog; the generator
/// resolves and filters them before a proposal is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub id: String,
    pub name: String,
    pub signal_ids: Vec<String>,
    pub reasoning: String,
}

/// Trait for generative ranking providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// Provider identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Rank candidates by relevance to the query.
    ///
    /// Returns signal ids in relevance order. An empty reply is an error:
    /// a provider that has nothing to say must fail so the engine can
    /// fall back deterministically.
    async fn rank(
        &self,
        query: &str,
        candidates: &[Signal],
        max_results: usize,
    ) -> SignalsResult<Vec<String>>;

    /// Draft combination proposals from ranked signals.
    ///
    /// An empty draft list is a valid reply; the generator falls back
    /// on its own when no draft survives catalog resolution.
    async fn propose(
        &self,
        query: &str,
        ranked: &[Signal],
        max_proposals: usize,
    ) -> SignalsResult<Vec<ProposalDraft>>;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for the ranking provider.
/// Providers must be explicitly registered - no auto-discovery.
pub struct ProviderRegistry {
    ranking: Option<Arc<dyn RankingProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new() -> Self {
        Self { ranking: None }
    }

    /// Register a ranking provider.
    /// Replaces any previously registered provider.
    pub fn register_ranking(&mut self, provider: Box<dyn RankingProvider>) {
        self.ranking = Some(Arc::from(provider));
    }

    /// Get the registered ranking provider.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn RankingProvider>)` - The provider
    /// * `Err(SignalsError::Collaborator(ProviderNotConfigured))` - If none registered
    pub fn ranking(&self) -> SignalsResult<Arc<dyn RankingProvider>> {
        self.ranking
            .clone()
            .ok_or(SignalsError::Collaborator(
                CollaboratorError::ProviderNotConfigured,
            ))
    }

    /// Check if a ranking provider is registered.
    pub fn has_ranking(&self) -> bool {
        self.ranking.is_some()
    }

    /// Clear the ranking provider registration.
    pub fn clear_ranking(&mut self) {
        self.ranking = None;
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("ranking", &self.ranking.is_some())
            .finish()
    }
}

// ============================================================================
// MOCK PROVIDER (for testing)
// ============================================================================

/// Mock ranking provider for testing.
/// Replays scripted responses, or fails on demand.
#[derive(Debug, Clone, Default)]
pub struct MockRankingProvider {
    ranked_ids: Vec<String>,
    drafts: Vec<ProposalDraft>,
    fail_rank: bool,
    fail_propose: bool,
}

impl MockRankingProvider {
    /// Create a mock that returns empty replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the ids returned by `rank`.
    pub fn with_ranked_ids(mut self, ids: Vec<String>) -> Self {
        self.ranked_ids = ids;
        self
    }

    /// Script the drafts returned by `propose`.
    pub fn with_drafts(mut self, drafts: Vec<ProposalDraft>) -> Self {
        self.drafts = drafts;
        self
    }

    /// Make `rank` fail with a request error.
    pub fn failing_rank(mut self) -> Self {
        self.fail_rank = true;
        self
    }

    /// Make `propose` fail with a request error.
    pub fn failing_propose(mut self) -> Self {
        self.fail_propose = true;
        self
    }
}

#[async_trait]
impl RankingProvider for MockRankingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn rank(
        &self,
        _query: &str,
        _candidates: &[Signal],
        max_results: usize,
    ) -> SignalsResult<Vec<String>> {
        if self.fail_rank {
            return Err(SignalsError::Collaborator(CollaboratorError::RequestFailed {
                provider: "mock".to_string(),
                status: 500,
                message: "scripted failure".to_string(),
            }));
        }
        if self.ranked_ids.is_empty() {
            return Err(SignalsError::Collaborator(
                CollaboratorError::InvalidResponse {
                    provider: "mock".to_string(),
                    reason: "ranking reply contained no signal ids".to_string(),
                },
            ));
        }
        Ok(self.ranked_ids.iter().take(max_results).cloned().collect())
    }

    async fn propose(
        &self,
        _query: &str,
        _ranked: &[Signal],
        max_proposals: usize,
    ) -> SignalsResult<Vec<ProposalDraft>> {
        if self.fail_propose {
            return Err(SignalsError::Collaborator(CollaboratorError::RequestFailed {
                provider: "mock".to_string(),
                status: 500,
                message: "scripted failure".to_string(),
            }));
        }
        Ok(self.drafts.iter().take(max_proposals).cloned().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_mock_rank_never_exceeds_max_results(
            ids in proptest::collection::vec("[a-z0-9_]{1,12}", 0..20),
            max_results in 0usize..10,
        ) {
            let provider = MockRankingProvider::new().with_ranked_ids(ids.clone());
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let result = rt.block_on(provider.rank("q", &[], max_results));
            if ids.is_empty() {
                prop_assert!(result.is_err());
            } else {
                let ranked = result.unwrap();
                prop_assert!(ranked.len() <= max_results);
                prop_assert!(ranked.iter().all(|id| ids.contains(id)));
            }
        }

        #[test]
        fn prop_draft_roundtrips_through_json(
            id in "[a-z0-9_]{1,16}",
            name in "[A-Za-z ]{1,32}",
            signal_ids in proptest::collection::vec("[a-z0-9_]{1,12}", 0..8),
        ) {
            let draft = ProposalDraft {
                id,
                name,
                signal_ids,
                reasoning: String::new(),
            };
            let json = serde_json::to_string(&draft).unwrap();
            let decoded: ProposalDraft = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(draft, decoded);
        }
    }
}
