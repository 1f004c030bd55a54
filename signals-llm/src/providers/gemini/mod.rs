//! Google Gemini provider

mod client;
mod types;

pub use client::GeminiClient;

use crate::parse::{parse_draft_response, parse_ranking_response};
use crate::prompt::{build_proposal_prompt, build_ranking_prompt};
use crate::{ProposalDraft, RankingProvider};
use async_trait::async_trait;
use signals_core::{CollaboratorError, Signal, SignalsError, SignalsResult};

/// Ranking provider backed by the Gemini generateContent API.
#[derive(Debug)]
pub struct GeminiProvider {
    client: GeminiClient,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: GeminiClient::new(api_key),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl RankingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn rank(
        &self,
        query: &str,
        candidates: &[Signal],
        max_results: usize,
    ) -> SignalsResult<Vec<String>> {
        let prompt = build_ranking_prompt(query, candidates, max_results);
        let reply = self.client.generate(&self.model, &prompt).await?;
        let ids = parse_ranking_response(&reply);
        if ids.is_empty() {
            return Err(SignalsError::Collaborator(
                CollaboratorError::InvalidResponse {
                    provider: "gemini".to_string(),
                    reason: "ranking reply contained no signal ids".to_string(),
                },
            ));
        }
        Ok(ids)
    }

    async fn propose(
        &self,
        query: &str,
        ranked: &[Signal],
        max_proposals: usize,
    ) -> SignalsResult<Vec<ProposalDraft>> {
        let prompt = build_proposal_prompt(query, ranked, max_proposals);
        let reply = self.client.generate(&self.model, &prompt).await?;
        Ok(parse_draft_response(&reply))
    }
}
