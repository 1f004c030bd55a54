//! Engine facade
//!
//! One entry point wiring the discovery and activation pipelines over a
//! shared store, provider registry and configuration. Discovery never
//! fails outward: total degradation still produces a response with empty
//! matches and the fallback flag set.

use crate::activation::{ActivationOrchestrator, ActivationReceipt, ActivationRequest};
use crate::generator::ProposalGenerator;
use crate::lifecycle::ActivationLifecycleManager;
use crate::ranking::RankingEngine;
use crate::retriever::CandidateRetriever;
use crate::validator::ProposalValidator;
use serde::{Deserialize, Serialize};
use signals_core::{
    ActivationContext, ActivationStatus, EngineConfig, GenerationMethod, Platform, Proposal,
    RankingMethod, Signal, SignalsError, SignalsResult, StoreError, Timestamp,
};
use signals_llm::{GeminiProvider, ProviderRegistry};
use signals_store::SignalStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Result of one discovery call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub matches: Vec<Signal>,
    pub proposals: Vec<Proposal>,
    pub using_fallback: bool,
    /// Combined method tag, e.g. "ai_ranking_ai_generation" or "fallback".
    pub ranking_method: String,
    pub total_matches: usize,
    pub total_proposals: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
}

/// Status view over one activation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub activation_id: String,
    pub status: ActivationStatus,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl From<ActivationContext> for StatusResponse {
    fn from(ctx: ActivationContext) -> Self {
        Self {
            activation_id: ctx.context_id.clone(),
            status: ctx.status,
            details: ctx.metadata.clone(),
            created_at: ctx.created_at,
            updated_at: ctx.updated_at(),
            completed_at: ctx.completed_at,
        }
    }
}

/// Build a provider registry from configuration. Provider settings
/// present means Gemini; absence leaves the registry empty and every
/// discovery call on the fallback path.
pub fn build_registry(config: &EngineConfig, api_key: Option<&str>) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    if let (Some(settings), Some(key)) = (&config.provider, api_key) {
        let mut provider = GeminiProvider::new(key, settings.model.clone());
        if let Some(endpoint) = &settings.endpoint {
            provider = provider.with_base_url(endpoint.clone());
        }
        registry.register_ranking(Box::new(provider));
    }
    registry
}

/// The discovery/validation/activation pipeline behind one handle.
pub struct SignalsAgent {
    config: EngineConfig,
    retriever: CandidateRetriever,
    ranking: RankingEngine,
    generator: ProposalGenerator,
    validator: ProposalValidator,
    orchestrator: ActivationOrchestrator,
    lifecycle: ActivationLifecycleManager,
}

impl SignalsAgent {
    pub fn new(
        store: Arc<dyn SignalStore>,
        registry: Arc<ProviderRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            retriever: CandidateRetriever::new(store.clone(), &config),
            ranking: RankingEngine::new(registry.clone()),
            generator: ProposalGenerator::new(store.clone(), registry),
            validator: ProposalValidator::new(store.clone(), config.debug_mode),
            orchestrator: ActivationOrchestrator::new(store.clone(), config.clone()),
            lifecycle: ActivationLifecycleManager::new(store),
            config,
        }
    }

    /// Discover signals and proposals for a campaign query.
    pub async fn discover(
        &self,
        query: &str,
        platforms: Option<&[Platform]>,
        limit: Option<usize>,
    ) -> DiscoveryResponse {
        let limit = limit
            .unwrap_or(self.config.default_result_limit)
            .min(self.config.max_result_limit);
        info!(query, limit, "discovery started");

        let candidates = self
            .retriever
            .retrieve(query, platforms, self.config.candidate_limit)
            .await;
        let (matches, ranking_method) = self.ranking.rank(query, &candidates, limit).await;
        let (proposals, generation_method) = self
            .generator
            .generate(query, &matches, self.config.max_proposals)
            .await;

        let (valid, invalid, report) = self.validator.validate(proposals).await;
        let mut proposals = valid;
        proposals.extend(invalid);

        let using_fallback = ranking_method == RankingMethod::Fallback
            || generation_method == GenerationMethod::Fallback;
        let debug = self.config.debug_mode.then(|| {
            serde_json::json!({
                "candidate_count": candidates.len(),
                "validation_report": report,
            })
        });

        info!(
            query,
            matches = matches.len(),
            proposals = proposals.len(),
            using_fallback,
            "discovery complete"
        );

        DiscoveryResponse {
            total_matches: matches.len(),
            total_proposals: proposals.len(),
            matches,
            proposals,
            using_fallback,
            ranking_method: combined_method_tag(ranking_method, generation_method),
            debug,
        }
    }

    /// Process an activation request.
    pub async fn activate(&self, request: &ActivationRequest) -> SignalsResult<ActivationReceipt> {
        self.orchestrator.activate(request).await
    }

    /// Status of one activation.
    pub async fn get_status(&self, activation_id: &str) -> SignalsResult<StatusResponse> {
        self.lifecycle
            .status(activation_id)
            .await?
            .map(StatusResponse::from)
            .ok_or_else(|| {
                SignalsError::Store(StoreError::ActivationNotFound {
                    id: activation_id.to_string(),
                })
            })
    }

    /// Advance one activation along the automatic path.
    pub async fn advance_status(&self, activation_id: &str) -> SignalsResult<StatusResponse> {
        Ok(self.lifecycle.advance(activation_id).await?.into())
    }

    /// Force one activation to a specific status.
    pub async fn force_status(
        &self,
        activation_id: &str,
        status: ActivationStatus,
    ) -> SignalsResult<StatusResponse> {
        Ok(self.lifecycle.force(activation_id, status).await?.into())
    }

    /// Active activations, oldest first.
    pub async fn list_pending(&self) -> SignalsResult<Vec<StatusResponse>> {
        Ok(self
            .lifecycle
            .list_pending()
            .await?
            .into_iter()
            .map(StatusResponse::from)
            .collect())
    }

    /// Reap activation contexts past the configured retention window.
    pub async fn reap_expired(&self) -> SignalsResult<usize> {
        self.reap(self.config.activation_retention).await
    }

    /// Reap activation contexts past an explicit retention window.
    pub async fn reap(&self, retention: Duration) -> SignalsResult<usize> {
        self.lifecycle.reap(retention).await
    }
}

/// "ai_ranking_ai_generation" when both generative paths held, "fallback"
/// when both degraded, otherwise the mixed pair.
fn combined_method_tag(ranking: RankingMethod, generation: GenerationMethod) -> String {
    match (ranking, generation) {
        (RankingMethod::Fallback, GenerationMethod::Fallback) => "fallback".to_string(),
        (r, g) => format!("{}_{}", r, g),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use signals_llm::{MockRankingProvider, ProposalDraft};
    use signals_store::{sample_signal, MemoryStore};

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.add_signal_with_platforms(
            sample_signal("sig_sports", "Sports Fans", 60.0, 3.0),
            &["index-exchange", "openx"],
        );
        store.add_signal_with_platforms(
            sample_signal("sig_auto", "Auto Intenders", 45.0, 2.0),
            &["index-exchange"],
        );
        store
    }

    fn agent_with(store: Arc<MemoryStore>, provider: Option<MockRankingProvider>) -> SignalsAgent {
        let mut registry = ProviderRegistry::new();
        if let Some(p) = provider {
            registry.register_ranking(Box::new(p));
        }
        SignalsAgent::new(store, Arc::new(registry), EngineConfig::default())
    }

    #[tokio::test]
    async fn test_discover_fallback_end_to_end() {
        let agent = agent_with(seeded_store(), None);
        let response = agent.discover("sports", None, None).await;

        assert!(response.using_fallback);
        assert_eq!(response.ranking_method, "fallback");
        assert_eq!(response.total_matches, 2);
        // coverage ordering
        assert_eq!(response.matches[0].id, "sig_sports");
        assert_eq!(response.total_proposals, 2);
        assert!(response.proposals.iter().all(|p| p.valid));
        assert!(response.debug.is_none());
    }

    #[tokio::test]
    async fn test_discover_generative_end_to_end() {
        let provider = MockRankingProvider::new()
            .with_ranked_ids(vec!["sig_auto".to_string(), "sig_sports".to_string()])
            .with_drafts(vec![ProposalDraft {
                id: "proposal_001".to_string(),
                name: "Auto and Sports".to_string(),
                signal_ids: vec!["sig_auto".to_string(), "sig_sports".to_string()],
                reasoning: "complementary audiences".to_string(),
            }]);
        let agent = agent_with(seeded_store(), Some(provider));
        let response = agent.discover("cars and sports", None, Some(10)).await;

        assert!(!response.using_fallback);
        assert_eq!(response.ranking_method, "ai_ranking_ai_generation");
        assert_eq!(response.matches[0].id, "sig_auto");
        assert_eq!(response.total_proposals, 1);
        assert_eq!(
            response.proposals[0].platforms,
            vec!["index-exchange".to_string()]
        );
    }

    #[tokio::test]
    async fn test_discover_empty_store_still_responds() {
        let agent = agent_with(Arc::new(MemoryStore::new()), None);
        let response = agent.discover("anything", None, None).await;

        assert!(response.using_fallback);
        assert_eq!(response.total_matches, 0);
        assert_eq!(response.total_proposals, 0);
    }

    #[tokio::test]
    async fn test_discover_limit_is_capped() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..8 {
            store.add_signal_with_platforms(
                sample_signal(&format!("sig_{}", i), &format!("Name {}", i), 50.0, 1.0),
                &["openx"],
            );
        }
        let agent = agent_with(store, None);

        let response = agent.discover("q", None, Some(usize::MAX)).await;
        // capped by max_result_limit, not by the absurd request
        assert!(response.total_matches <= EngineConfig::default().max_result_limit);
        assert_eq!(response.total_matches, 8);

        let defaulted = agent.discover("q", None, None).await;
        assert_eq!(
            defaulted.total_matches,
            EngineConfig::default().default_result_limit
        );
    }

    #[tokio::test]
    async fn test_discover_debug_payload_in_debug_mode() {
        let store = seeded_store();
        let config = EngineConfig {
            debug_mode: true,
            ..EngineConfig::default()
        };
        let agent = SignalsAgent::new(store, Arc::new(ProviderRegistry::new()), config);

        let response = agent.discover("sports", None, None).await;
        let debug = response.debug.unwrap();
        assert_eq!(debug["candidate_count"], 2);
        assert!(debug["validation_report"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_activation_roundtrip_through_facade() {
        let agent = agent_with(seeded_store(), None);

        let receipt = agent
            .activate(&ActivationRequest {
                segment_id: Some("sig_sports".to_string()),
                proposal_id: None,
                principal_id: "acme".to_string(),
                platforms: vec!["openx".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(receipt.status, "queued");

        let status = agent.get_status(&receipt.activation_id).await.unwrap();
        assert_eq!(status.status, ActivationStatus::Pending);
        assert_eq!(status.updated_at, status.created_at);

        let advanced = agent.advance_status(&receipt.activation_id).await.unwrap();
        assert_eq!(advanced.status, ActivationStatus::InProgress);

        let done = agent.advance_status(&receipt.activation_id).await.unwrap();
        assert_eq!(done.status, ActivationStatus::Completed);
        assert!(done.completed_at.is_some());
        assert_eq!(done.updated_at, done.completed_at.unwrap());
    }

    #[tokio::test]
    async fn test_get_status_unknown_id_not_found() {
        let agent = agent_with(seeded_store(), None);
        let result = agent.get_status("act_missing").await;
        assert!(matches!(
            result,
            Err(SignalsError::Store(StoreError::ActivationNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_discovered_proposal_is_activatable() {
        let agent = agent_with(seeded_store(), None);
        let discovery = agent.discover("sports", None, None).await;
        let proposal_id = discovery.proposals[0].id.clone();

        let receipt = agent
            .activate(&ActivationRequest {
                segment_id: None,
                proposal_id: Some(proposal_id),
                principal_id: "acme".to_string(),
                platforms: vec!["index-exchange".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(
            receipt.allowed_platforms,
            vec!["index-exchange".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_pending_and_force_through_facade() {
        let agent = agent_with(seeded_store(), None);
        let receipt = agent
            .activate(&ActivationRequest {
                segment_id: Some("sig_auto".to_string()),
                proposal_id: None,
                principal_id: "acme".to_string(),
                platforms: vec![],
            })
            .await
            .unwrap();

        let pending = agent.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);

        agent
            .force_status(&receipt.activation_id, ActivationStatus::Failed)
            .await
            .unwrap();
        assert!(agent.list_pending().await.unwrap().is_empty());
    }

    #[test]
    fn test_combined_method_tags() {
        assert_eq!(
            combined_method_tag(RankingMethod::AiRanking, GenerationMethod::AiGeneration),
            "ai_ranking_ai_generation"
        );
        assert_eq!(
            combined_method_tag(RankingMethod::AiRanking, GenerationMethod::Fallback),
            "ai_ranking_fallback"
        );
        assert_eq!(
            combined_method_tag(RankingMethod::Fallback, GenerationMethod::Fallback),
            "fallback"
        );
    }

    #[test]
    fn test_build_registry_requires_settings_and_key() {
        let without_provider = build_registry(&EngineConfig::default(), Some("key"));
        assert!(!without_provider.has_ranking());

        let config = EngineConfig {
            provider: Some(signals_core::ProviderSettings {
                provider_type: "gemini".to_string(),
                model: "gemini-1.5-flash".to_string(),
                endpoint: None,
            }),
            ..EngineConfig::default()
        };
        assert!(build_registry(&config, Some("key")).has_ranking());
        assert!(!build_registry(&config, None).has_ranking());
    }
}
