//! Proposal generation
//!
//! Turns ranked signals into OR-combination proposals, generatively when
//! a provider is registered and deterministically otherwise. Drafts are
//! resolved against the ranked set: a draft naming a signal outside it,
//! or whose members share no live platform, is dropped. Generated
//! proposals are persisted immediately so the activation path can look
//! them up by id later.

use signals_core::{CombinationLogic, GenerationMethod, Proposal, Signal, MAX_PROPOSAL_SIGNALS};
use signals_llm::{ProposalDraft, ProviderRegistry};
use signals_store::SignalStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drafts and persists combination proposals from ranked signals.
pub struct ProposalGenerator {
    store: Arc<dyn SignalStore>,
    registry: Arc<ProviderRegistry>,
}

impl ProposalGenerator {
    pub fn new(store: Arc<dyn SignalStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// Generate up to `max_proposals` proposals from ranked signals.
    ///
    /// Provider absent, failed, or yielding no usable draft all resolve
    /// to the singleton fallback. Proposal persistence is best-effort
    /// inside discovery; a failed write is logged and the proposal is
    /// still returned.
    pub async fn generate(
        &self,
        query: &str,
        ranked: &[Signal],
        max_proposals: usize,
    ) -> (Vec<Proposal>, GenerationMethod) {
        if ranked.is_empty() {
            return (Vec::new(), GenerationMethod::Fallback);
        }

        let provider = match self.registry.ranking() {
            Ok(provider) => provider,
            Err(_) => {
                debug!(query, "no provider registered, using fallback proposals");
                let proposals = fallback_proposals(ranked, max_proposals);
                self.persist(&proposals).await;
                return (proposals, GenerationMethod::Fallback);
            }
        };

        let drafts = match provider.propose(query, ranked, max_proposals).await {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(error = %e, query, "provider proposal drafting failed, using fallback");
                let proposals = fallback_proposals(ranked, max_proposals);
                self.persist(&proposals).await;
                return (proposals, GenerationMethod::Fallback);
            }
        };

        let proposals = resolve_drafts(drafts, ranked, max_proposals);
        if proposals.is_empty() {
            warn!(query, "no draft survived resolution, using fallback proposals");
            let proposals = fallback_proposals(ranked, max_proposals);
            self.persist(&proposals).await;
            return (proposals, GenerationMethod::Fallback);
        }

        self.persist(&proposals).await;
        (proposals, GenerationMethod::AiGeneration)
    }

    async fn persist(&self, proposals: &[Proposal]) {
        for proposal in proposals {
            if let Err(e) = self.store.proposal_upsert(proposal).await {
                warn!(error = %e, proposal_id = %proposal.id, "proposal persistence failed");
            }
        }
    }
}

/// Resolve drafts against the ranked set. A draft survives only when its
/// signal ids are distinct, within the member cap, all ranked, and the
/// members share at least one live platform.
fn resolve_drafts(
    drafts: Vec<ProposalDraft>,
    ranked: &[Signal],
    max_proposals: usize,
) -> Vec<Proposal> {
    let by_id: HashMap<&str, &Signal> = ranked.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut proposals = Vec::new();
    for (i, draft) in drafts.into_iter().enumerate() {
        if proposals.len() >= max_proposals {
            break;
        }
        if draft.signal_ids.is_empty() {
            warn!(index = i, "draft has no signal ids, skipping");
            continue;
        }
        let unique: HashSet<&str> = draft.signal_ids.iter().map(String::as_str).collect();
        if draft.signal_ids.len() > MAX_PROPOSAL_SIGNALS || unique.len() != draft.signal_ids.len()
        {
            warn!(index = i, "draft member set exceeds the cap or repeats ids, skipping");
            continue;
        }
        let members: Option<Vec<&Signal>> = draft
            .signal_ids
            .iter()
            .map(|id| by_id.get(id.as_str()).copied())
            .collect();
        let members = match members {
            Some(members) => members,
            None => {
                warn!(index = i, "draft references unranked signal ids, skipping");
                continue;
            }
        };
        let platforms = common_platforms(&members);
        if platforms.is_empty() {
            warn!(index = i, "draft members share no live platform, skipping");
            continue;
        }

        proposals.push(Proposal {
            id: draft.id,
            name: draft.name,
            signal_ids: draft.signal_ids,
            logic: CombinationLogic::Or,
            platforms,
            score: Some(0.8),
            reasoning: Some(draft.reasoning),
            valid: true,
            validation_errors: None,
        });
    }
    proposals
}

/// Singleton proposals from the ranked list, first signal per name.
fn fallback_proposals(ranked: &[Signal], max_proposals: usize) -> Vec<Proposal> {
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut proposals = Vec::new();

    for (i, signal) in ranked.iter().enumerate() {
        if proposals.len() >= max_proposals {
            break;
        }
        if !seen_names.insert(signal.name.clone()) {
            continue;
        }
        proposals.push(Proposal {
            id: format!("fallback_proposal_{:03}", i + 1),
            name: format!("{} - Fallback", signal.name),
            signal_ids: vec![signal.id.clone()],
            logic: CombinationLogic::Or,
            platforms: signal.allowed_platforms.clone(),
            score: Some(0.6),
            reasoning: Some(format!("Fallback proposal for {}", signal.name)),
            valid: true,
            validation_errors: None,
        });
    }
    proposals
}

/// Sorted intersection of the members' live-platform sets.
fn common_platforms(members: &[&Signal]) -> Vec<String> {
    let mut iter = members.iter();
    let first = match iter.next() {
        Some(first) => first,
        None => return Vec::new(),
    };
    let mut common: HashSet<&str> = first.allowed_platforms.iter().map(String::as_str).collect();
    for member in iter {
        let set: HashSet<&str> = member.allowed_platforms.iter().map(String::as_str).collect();
        common.retain(|p| set.contains(p));
    }
    let mut platforms: Vec<String> = common.into_iter().map(String::from).collect();
    platforms.sort();
    platforms
}

// =============================================================================
// TESTS
// =============================================================================
