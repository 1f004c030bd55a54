//! Error types for signal discovery and activation

use thiserror::Error;

/// Store layer errors. Write failures are fatal: the transaction is
/// rolled back and the error propagates, since no local recovery exists.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Signal not found: {id}")]
    SignalNotFound { id: String },

    #[error("Proposal not found: {id}")]
    ProposalNotFound { id: String },

    #[error("Activation not found: {id}")]
    ActivationNotFound { id: String },

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: String, reason: String },

    #[error("Update failed for {entity} {id}: {reason}")]
    UpdateFailed {
        entity: String,
        id: String,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Generative collaborator errors. These are always recovered locally via
/// the deterministic fallback path and never surfaced to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("No ranking provider configured")]
    ProviderNotConfigured,

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Transport error to {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Malformed caller input. Surfaced as a rejection, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Exactly one of segment_id or proposal_id must be provided")]
    AmbiguousTarget,

    #[error("Only OR logic is allowed")]
    LogicNotAllowed,
}

/// Activation path errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActivationError {
    #[error("Target not found: {target_type} {id}")]
    TargetNotFound { target_type: String, id: String },

    #[error("Target not activatable: {target_type} {id} has no live platforms")]
    TargetNotActivatable { target_type: String, id: String },

    #[error(
        "No overlap between allowed platforms {allowed:?} and requested platforms {requested:?}"
    )]
    NoPlatformOverlap {
        allowed: Vec<String>,
        requested: Vec<String>,
    },

    #[error("Proposal is not valid: {id}")]
    ProposalInvalid { id: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalsError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Activation error: {0}")]
    Activation(#[from] ActivationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for engine operations.
pub type SignalsResult<T> = Result<T, SignalsError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display_not_found() {
        let err = StoreError::SignalNotFound {
            id: "signal_404".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Signal not found"));
        assert!(msg.contains("signal_404"));
    }

    #[test]
    fn test_collaborator_error_display_invalid_response() {
        let err = CollaboratorError::InvalidResponse {
            provider: "gemini".to_string(),
            reason: "not a JSON array".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("gemini"));
        assert!(msg.contains("not a JSON array"));
    }

    #[test]
    fn test_activation_error_display_no_overlap() {
        let err = ActivationError::NoPlatformOverlap {
            allowed: vec!["index-exchange".to_string()],
            requested: vec!["openx".to_string()],
        };
        let msg = format!("{}", err);
        assert!(msg.contains("index-exchange"));
        assert!(msg.contains("openx"));
    }

    #[test]
    fn test_validation_error_display_ambiguous_target() {
        let msg = format!("{}", ValidationError::AmbiguousTarget);
        assert!(msg.contains("segment_id"));
        assert!(msg.contains("proposal_id"));
    }

    #[test]
    fn test_signals_error_from_variants() {
        let store = SignalsError::from(StoreError::LockPoisoned);
        assert!(matches!(store, SignalsError::Store(_)));

        let collab = SignalsError::from(CollaboratorError::ProviderNotConfigured);
        assert!(matches!(collab, SignalsError::Collaborator(_)));

        let validation = SignalsError::from(ValidationError::LogicNotAllowed);
        assert!(matches!(validation, SignalsError::Validation(_)));

        let activation = SignalsError::from(ActivationError::ProposalInvalid {
            id: "proposal_001".to_string(),
        });
        assert!(matches!(activation, SignalsError::Activation(_)));

        let config = SignalsError::from(ConfigError::MissingRequired {
            field: "api_key".to_string(),
        });
        assert!(matches!(config, SignalsError::Config(_)));
    }
}
