//! Proposal validation
//!
//! The sole authority on proposal validity. Each proposal is checked
//! against all four rules without short-circuiting, so an invalid
//! proposal carries every applicable reason at once.

use chrono::Utc;
use serde::Serialize;
use signals_core::{
    new_request_id, CombinationLogic, Platform, Proposal, RequestId, Timestamp,
    MAX_PROPOSAL_SIGNALS,
};
use signals_store::SignalStore;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// Report produced by one validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub request_id: RequestId,
    pub total_proposals: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// One "Proposal {id}: {reason}" entry per failed rule.
    pub validation_errors: Vec<String>,
    pub timestamp: Timestamp,
    /// Live-platform sets per signal id, captured during the unity checks.
    /// Populated only in debug mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<BTreeMap<String, Vec<Platform>>>,
}

/// Aggregate view over a completed validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub total_proposals: usize,
    pub valid_proposals: usize,
    pub invalid_proposals: usize,
    pub validation_rate: f64,
    pub valid_proposal_ids: Vec<String>,
    pub invalid_proposal_ids: Vec<String>,
    pub common_platforms_by_proposal: BTreeMap<String, Vec<Platform>>,
}

/// Validates proposals against the catalog.
pub struct ProposalValidator {
    store: Arc<dyn SignalStore>,
    debug_mode: bool,
}

impl ProposalValidator {
    pub fn new(store: Arc<dyn SignalStore>, debug_mode: bool) -> Self {
        Self { store, debug_mode }
    }

    /// Validate proposals, splitting them into valid and invalid sets.
    ///
    /// Valid proposals leave with `platforms` overwritten by the computed
    /// intersection. Invalid proposals leave with `valid = false` and
    /// their full reason list attached.
    pub async fn validate(
        &self,
        proposals: Vec<Proposal>,
    ) -> (Vec<Proposal>, Vec<Proposal>, ValidationReport) {
        let request_id = new_request_id();
        info!(%request_id, total = proposals.len(), "starting proposal validation");

        let total = proposals.len();
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        let mut flattened = Vec::new();
        let mut debug_platforms: BTreeMap<String, Vec<Platform>> = BTreeMap::new();

        for mut proposal in proposals {
            let mut errors = Vec::new();

            if !self.all_signals_exist(&proposal.signal_ids).await {
                errors.push("One or more signal IDs do not exist in database".to_string());
            }

            let common = self
                .common_live_platforms(&proposal.signal_ids, &mut debug_platforms)
                .await;
            if common.is_empty() {
                errors.push("Signals do not share any common decisioning platforms".to_string());
            } else {
                proposal.platforms = common;
            }

            if proposal.logic != CombinationLogic::Or {
                errors.push("Only OR logic is allowed".to_string());
            }

            if !has_required_metadata(&proposal) {
                errors.push("Required metadata is missing".to_string());
            }

            if errors.is_empty() {
                valid.push(proposal);
            } else {
                warn!(%request_id, proposal_id = %proposal.id, ?errors, "proposal invalid");
                flattened.extend(errors.iter().map(|e| format!("Proposal {}: {}", proposal.id, e)));
                proposal.valid = false;
                proposal.validation_errors = Some(errors);
                invalid.push(proposal);
            }
        }

        let report = ValidationReport {
            request_id,
            total_proposals: total,
            valid_count: valid.len(),
            invalid_count: invalid.len(),
            validation_errors: flattened,
            timestamp: Utc::now(),
            debug_info: self.debug_mode.then_some(debug_platforms),
        };

        info!(
            %request_id,
            valid = report.valid_count,
            invalid = report.invalid_count,
            "validation complete"
        );
        (valid, invalid, report)
    }

    /// Summary over an already-split validation result.
    pub fn get_validation_summary(
        &self,
        valid: &[Proposal],
        invalid: &[Proposal],
    ) -> ValidationSummary {
        let total = valid.len() + invalid.len();
        ValidationSummary {
            total_proposals: total,
            valid_proposals: valid.len(),
            invalid_proposals: invalid.len(),
            validation_rate: if total > 0 {
                valid.len() as f64 / total as f64
            } else {
                0.0
            },
            valid_proposal_ids: valid.iter().map(|p| p.id.clone()).collect(),
            invalid_proposal_ids: invalid.iter().map(|p| p.id.clone()).collect(),
            common_platforms_by_proposal: valid
                .iter()
                .map(|p| (p.id.clone(), p.platforms.clone()))
                .collect(),
        }
    }

    /// Whether every id resolves in the catalog. A store error counts as
    /// non-existence so a flaky catalog never validates hallucinations.
    async fn all_signals_exist(&self, signal_ids: &[String]) -> bool {
        for id in signal_ids {
            match self.store.signal_exists(id).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(signal_id = %id, "signal id not found during validation");
                    return false;
                }
                Err(e) => {
                    warn!(error = %e, signal_id = %id, "existence check failed");
                    return false;
                }
            }
        }
        true
    }

    /// Sorted intersection of the signals' live-platform sets. Store
    /// errors resolve to an empty set for the affected signal.
    async fn common_live_platforms(
        &self,
        signal_ids: &[String],
        debug_platforms: &mut BTreeMap<String, Vec<Platform>>,
    ) -> Vec<Platform> {
        let mut common: Option<HashSet<Platform>> = None;
        for id in signal_ids {
            let platforms = match self.store.live_platforms(id).await {
                Ok(platforms) => platforms,
                Err(e) => {
                    warn!(error = %e, signal_id = %id, "live platform lookup failed");
                    Vec::new()
                }
            };
            if self.debug_mode {
                debug_platforms.insert(id.clone(), platforms.clone());
            }
            let set: HashSet<Platform> = platforms.into_iter().collect();
            common = Some(match common {
                None => set,
                Some(prev) => prev.intersection(&set).cloned().collect(),
            });
        }

        let mut platforms: Vec<Platform> = common.unwrap_or_default().into_iter().collect();
        platforms.sort();
        platforms
    }
}

/// Id, name and platforms present, and the member set well formed:
/// 1 to `MAX_PROPOSAL_SIGNALS` signal ids with no duplicates.
fn has_required_metadata(proposal: &Proposal) -> bool {
    let unique: HashSet<&str> = proposal.signal_ids.iter().map(String::as_str).collect();
    !proposal.id.is_empty()
        && !proposal.name.is_empty()
        && !proposal.signal_ids.is_empty()
        && proposal.signal_ids.len() <= MAX_PROPOSAL_SIGNALS
        && unique.len() == proposal.signal_ids.len()
        && !proposal.platforms.is_empty()
}

// =============================================================================
// TESTS
// =============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use signals_store::{sample_signal, MemoryStore};

    fn arb_platform_sets() -> impl Strategy<Value = Vec<Vec<String>>> {
        proptest::collection::vec(
            proptest::collection::btree_set("P[1-6]", 0..5)
                .prop_map(|set| set.into_iter().collect::<Vec<_>>()),
            1..5,
        )
    }

    proptest! {
        // For every proposal accepted as valid, its platform set equals the
        // intersection of its members' live-platform sets exactly.
        #[test]
        fn prop_valid_platforms_equal_member_intersection(sets in arb_platform_sets()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let store = Arc::new(MemoryStore::new());
                let mut signal_ids = Vec::new();
                for (i, platforms) in sets.iter().enumerate() {
                    let id = format!("s{}", i);
                    let refs: Vec<&str> = platforms.iter().map(String::as_str).collect();
                    store.add_signal_with_platforms(
                        sample_signal(&id, &format!("Signal {}", i), 50.0, 1.0),
                        &refs,
                    );
                    signal_ids.push(id);
                }

                let mut expected: Vec<String> = sets
                    .iter()
                    .skip(1)
                    .fold(
                        sets[0].iter().cloned().collect::<std::collections::HashSet<_>>(),
                        |acc, set| {
                            let s: std::collections::HashSet<String> =
                                set.iter().cloned().collect();
                            acc.intersection(&s).cloned().collect()
                        },
                    )
                    .into_iter()
                    .collect();
                expected.sort();

                let proposal = Proposal {
                    id: "p1".to_string(),
                    name: "Prop".to_string(),
                    signal_ids,
                    logic: CombinationLogic::Or,
                    platforms: vec!["placeholder".to_string()],
                    score: None,
                    reasoning: None,
                    valid: true,
                    validation_errors: None,
                };

                let validator = ProposalValidator::new(store, false);
                let (valid, invalid, _) = validator.validate(vec![proposal]).await;

                if expected.is_empty() {
                    assert!(valid.is_empty());
                    assert_eq!(invalid.len(), 1);
                } else {
                    assert_eq!(valid.len(), 1);
                    assert_eq!(valid[0].platforms, expected);
                }
            });
        }
    }
}
