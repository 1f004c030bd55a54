//! Signals Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod config;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use config::{EngineConfig, ProviderSettings};
pub use entities::{
    ActivationContext, ActivationTarget, PlatformDeployment, Principal, Proposal, Signal,
};
pub use enums::{
    ActivationStatus, CatalogAccess, CombinationLogic, DeploymentScope, GenerationMethod,
    RankingMethod, SignalType, TargetType,
};
pub use error::{
    ActivationError, CollaboratorError, ConfigError, SignalsError, SignalsResult, StoreError,
    ValidationError,
};
pub use identity::{
    activation_id_for, new_request_id, ActivationId, Platform, PrincipalId, ProposalId, RequestId,
    SignalId, Timestamp,
};

/// Maximum number of signals one proposal may combine.
pub const MAX_PROPOSAL_SIGNALS: usize = 10;
