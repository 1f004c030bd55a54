//! Activation orchestration
//!
//! Resolves an activation request's target, computes the deliverable
//! platform set, and persists the activation context. Principal access
//! checks are advisory: a missing access record is logged, never
//! blocking. Store write failures here are fatal and propagate.

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use signals_core::{
    activation_id_for, ActivationContext, ActivationError, ActivationStatus, ActivationTarget,
    EngineConfig, Platform, SignalsError, SignalsResult, Timestamp, ValidationError,
};
use signals_store::SignalStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Default estimate when no deployment row carries one.
const DEFAULT_ESTIMATED_DURATION_MINUTES: u32 = 60;

/// Wire-shaped activation request. Exactly one of `segment_id` and
/// `proposal_id` must be set; the pair of optionals is collapsed into an
/// `ActivationTarget` at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub segment_id: Option<String>,
    pub proposal_id: Option<String>,
    pub principal_id: String,
    pub platforms: Vec<Platform>,
}

impl ActivationRequest {
    /// Collapse the two optional ids into a target.
    pub fn target(&self) -> SignalsResult<ActivationTarget> {
        match (&self.segment_id, &self.proposal_id) {
            (Some(segment), None) => Ok(ActivationTarget::Segment(segment.clone())),
            (None, Some(proposal)) => Ok(ActivationTarget::Proposal(proposal.clone())),
            _ => Err(SignalsError::Validation(ValidationError::AmbiguousTarget)),
        }
    }
}

/// Receipt returned for an accepted activation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationReceipt {
    pub activation_id: String,
    pub status: String,
    pub allowed_platforms: Vec<Platform>,
    pub message: String,
    pub estimated_duration_minutes: u32,
    pub created_at: Timestamp,
}

/// Turns activation requests into persisted activation contexts.
pub struct ActivationOrchestrator {
    store: Arc<dyn SignalStore>,
    config: EngineConfig,
}

impl ActivationOrchestrator {
    pub fn new(store: Arc<dyn SignalStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Process one activation request end to end.
    pub async fn activate(&self, request: &ActivationRequest) -> SignalsResult<ActivationReceipt> {
        let target = request.target()?;
        info!(target_id = target.target_id(), target_type = %target.target_type(), "processing activation request");

        let (allowed, member_signal_ids) = self.resolve_target(&target).await?;

        for signal_id in &member_signal_ids {
            match self
                .store
                .principal_has_access(&request.principal_id, signal_id)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    warn!(
                        principal_id = %request.principal_id,
                        signal_id = %signal_id,
                        "no access record found for principal, allowing anyway"
                    );
                }
                Err(e) => {
                    warn!(error = %e, principal_id = %request.principal_id, "access check failed");
                }
            }
        }

        let final_platforms = intersect_requested(&allowed, &request.platforms)?;

        let created_at = Utc::now();
        let activation_id = activation_id_for(created_at, target.target_id());
        let expires_at = created_at
            + ChronoDuration::from_std(self.config.activation_ttl)
                .unwrap_or_else(|_| ChronoDuration::hours(24));

        let context = ActivationContext {
            context_id: activation_id.clone(),
            principal_id: request.principal_id.clone(),
            target: target.clone(),
            status: ActivationStatus::Pending,
            created_at,
            expires_at,
            completed_at: None,
            metadata: serde_json::json!({
                "target_id": target.target_id(),
                "target_type": target.target_type().to_string(),
                "platforms": final_platforms,
            }),
        };
        self.store.activation_insert(&context).await?;
        info!(%activation_id, "created activation context");

        let estimated = self.estimate_duration(&member_signal_ids).await;

        Ok(ActivationReceipt {
            activation_id,
            status: "queued".to_string(),
            message: format!(
                "Activation queued for {} {}",
                target.target_type(),
                target.target_id()
            ),
            allowed_platforms: final_platforms,
            estimated_duration_minutes: estimated,
            created_at,
        })
    }

    /// Resolve the target into its allowed platform set and the signal
    /// ids it activates.
    async fn resolve_target(
        &self,
        target: &ActivationTarget,
    ) -> SignalsResult<(Vec<Platform>, Vec<String>)> {
        match target {
            ActivationTarget::Segment(segment_id) => {
                if !self.store.signal_exists(segment_id).await? {
                    return Err(SignalsError::Activation(ActivationError::TargetNotFound {
                        target_type: "segment".to_string(),
                        id: segment_id.clone(),
                    }));
                }
                let platforms = self.store.live_platforms(segment_id).await?;
                if platforms.is_empty() {
                    return Err(SignalsError::Activation(
                        ActivationError::TargetNotActivatable {
                            target_type: "segment".to_string(),
                            id: segment_id.clone(),
                        },
                    ));
                }
                Ok((platforms, vec![segment_id.clone()]))
            }
            ActivationTarget::Proposal(proposal_id) => {
                let proposal = self
                    .store
                    .proposal_get(proposal_id)
                    .await?
                    .ok_or_else(|| {
                        SignalsError::Activation(ActivationError::TargetNotFound {
                            target_type: "proposal".to_string(),
                            id: proposal_id.clone(),
                        })
                    })?;
                if !proposal.valid {
                    return Err(SignalsError::Activation(ActivationError::ProposalInvalid {
                        id: proposal_id.clone(),
                    }));
                }

                let mut common: Option<HashSet<Platform>> = None;
                for signal_id in &proposal.signal_ids {
                    let set: HashSet<Platform> =
                        self.store.live_platforms(signal_id).await?.into_iter().collect();
                    common = Some(match common {
                        None => set,
                        Some(prev) => prev.intersection(&set).cloned().collect(),
                    });
                }
                let mut platforms: Vec<Platform> =
                    common.unwrap_or_default().into_iter().collect();
                platforms.sort();

                if platforms.is_empty() {
                    return Err(SignalsError::Activation(
                        ActivationError::TargetNotActivatable {
                            target_type: "proposal".to_string(),
                            id: proposal_id.clone(),
                        },
                    ));
                }
                Ok((platforms, proposal.signal_ids))
            }
        }
    }

    /// Longest estimate across the member signals' live deployments.
    async fn estimate_duration(&self, signal_ids: &[String]) -> u32 {
        let mut estimate = None;
        for signal_id in signal_ids {
            match self.store.live_deployments(signal_id).await {
                Ok(deployments) => {
                    for d in deployments {
                        let current = estimate.unwrap_or(0);
                        if d.estimated_activation_duration_minutes > current {
                            estimate = Some(d.estimated_activation_duration_minutes);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, signal_id = %signal_id, "deployment lookup failed during estimate");
                }
            }
        }
        estimate.unwrap_or(DEFAULT_ESTIMATED_DURATION_MINUTES)
    }
}

/// Requested platforms against the allowed set, in sorted order. An
/// empty request means "everywhere allowed".
fn intersect_requested(
    allowed: &[Platform],
    requested: &[Platform],
) -> SignalsResult<Vec<Platform>> {
    if requested.is_empty() {
        return Ok(allowed.to_vec());
    }

    let allowed_set: HashSet<&str> = allowed.iter().map(String::as_str).collect();
    let mut overlap: Vec<Platform> = requested
        .iter()
        .filter(|p| allowed_set.contains(p.as_str()))
        .cloned()
        .collect();
    overlap.sort();
    overlap.dedup();

    if overlap.is_empty() {
        return Err(SignalsError::Activation(ActivationError::NoPlatformOverlap {
            allowed: allowed.to_vec(),
            requested: requested.to_vec(),
        }));
    }
    Ok(overlap)
}

// =============================================================================
// TESTS
// =============================================================================
