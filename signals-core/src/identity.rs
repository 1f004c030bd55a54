//! Identity types for signal and activation entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Signal and proposal identifiers are catalog-assigned strings
/// (e.g. "signal_001"), not UUIDs. They come from the provisioning
/// loader and must round-trip unchanged.
pub type SignalId = String;

/// Proposal identifier, assigned by the generator or the collaborator.
pub type ProposalId = String;

/// Principal identifier, assigned by the provisioning loader.
pub type PrincipalId = String;

/// Activation context identifier: `act_<YYYYmmdd_HHMMSS>_<target id>`.
/// Carries a time component and the target id for traceability.
pub type ActivationId = String;

/// Delivery platform name (e.g. "index-exchange", "the-trade-desk").
pub type Platform = String;

/// Correlation identifier using UUIDv7 for timestamp-sortable IDs.
pub type RequestId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 correlation id (timestamp-sortable).
pub fn new_request_id() -> RequestId {
    Uuid::now_v7()
}

/// Build an activation id from a creation time and target id.
pub fn activation_id_for(created_at: Timestamp, target_id: &str) -> ActivationId {
    format!("act_{}_{}", created_at.format("%Y%m%d_%H%M%S"), target_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_activation_id_embeds_time_and_target() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let id = activation_id_for(at, "signal_001");
        assert_eq!(id, "act_20250314_092653_signal_001");
    }

    #[test]
    fn test_request_ids_are_sortable_by_creation() {
        let a = new_request_id();
        let b = new_request_id();
        assert!(a <= b);
    }
}
