//! Core entity structures

use crate::{
    ActivationId, ActivationStatus, CatalogAccess, CombinationLogic, DeploymentScope, Platform,
    PrincipalId, ProposalId, SignalId, SignalType, TargetType, Timestamp,
};
use serde::{Deserialize, Serialize};

/// A discoverable audience/content segment with provider, price and
/// platform availability. The live-platform set is derived from deployment
/// rows at read time, never stored on the signal itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub name: String,
    pub description: Option<String>,
    pub provider: String,
    /// Share of the addressable audience this signal reaches, in [0, 100].
    pub coverage_percentage: f64,
    /// CPM price, >= 0.
    pub price: f64,
    pub signal_type: SignalType,
    pub catalog_access: CatalogAccess,
    /// Platforms with at least one live deployment row. A signal with an
    /// empty set is excluded from all discovery results.
    pub allowed_platforms: Vec<Platform>,
    pub valid: bool,
}

/// An OR-combination of signals proposed as a single activatable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub name: String,
    /// 1 to 10 unique signal ids, in proposal order.
    pub signal_ids: Vec<SignalId>,
    pub logic: CombinationLogic,
    /// Once validated, equals the intersection of the live-platform sets
    /// of the constituent signals.
    pub platforms: Vec<Platform>,
    /// Relevance score in [0, 1].
    pub score: Option<f64>,
    pub reasoning: Option<String>,
    pub valid: bool,
    pub validation_errors: Option<Vec<String>>,
}

/// One deployment row linking a signal to a delivery platform.
/// Only rows with `is_live` count toward the signal's allowed platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDeployment {
    pub signal_id: SignalId,
    pub platform: Platform,
    /// Account the deployment is scoped to, when not platform-wide.
    pub account: Option<String>,
    pub scope: DeploymentScope,
    pub is_live: bool,
    /// Segment id on the decisioning platform, once deployed.
    pub decisioning_platform_segment_id: Option<String>,
    pub estimated_activation_duration_minutes: u32,
}

impl PlatformDeployment {
    /// A live platform-wide deployment with the default 60-minute estimate.
    pub fn live(signal_id: impl Into<SignalId>, platform: impl Into<Platform>) -> Self {
        Self {
            signal_id: signal_id.into(),
            platform: platform.into(),
            account: None,
            scope: DeploymentScope::PlatformWide,
            is_live: true,
            decisioning_platform_segment_id: None,
            estimated_activation_duration_minutes: 60,
        }
    }
}

/// What an activation request deploys: a single segment or a validated
/// proposal. The two cases are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target_type", content = "target_id", rename_all = "snake_case")]
pub enum ActivationTarget {
    Segment(SignalId),
    Proposal(ProposalId),
}

impl ActivationTarget {
    pub fn target_id(&self) -> &str {
        match self {
            ActivationTarget::Segment(id) | ActivationTarget::Proposal(id) => id,
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            ActivationTarget::Segment(_) => TargetType::Segment,
            ActivationTarget::Proposal(_) => TargetType::Proposal,
        }
    }
}

/// The persisted record tracking one activation request's lifecycle.
/// Created once by the orchestrator, mutated only by the lifecycle
/// manager, reaped after the retention window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationContext {
    pub context_id: ActivationId,
    pub principal_id: PrincipalId,
    pub target: ActivationTarget,
    pub status: ActivationStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    /// Opaque record of target and final platforms at activation time.
    pub metadata: serde_json::Value,
}

impl ActivationContext {
    /// Last-touched time: completion timestamp when set, else creation.
    pub fn updated_at(&self) -> Timestamp {
        self.completed_at.unwrap_or(self.created_at)
    }
}

/// The requesting party, with an associated catalog access level.
/// Access checks against principals are advisory in the current design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub name: String,
    pub access_level: CatalogAccess,
}

// =============================================================================
// TESTS
// =============================================================================
