//! Signals Store - Store Trait and In-Memory Implementation
//!
//! Defines the persistence boundary for signals, platform deployments,
//! proposals, principals and activation contexts. The relational backend
//! is out of scope; `MemoryStore` is the injected repository used by the
//! engine and by tests. Every operation is atomic per call.

use ::async_trait::async_trait;
use signals_core::{
    ActivationContext, ActivationStatus, Platform, PlatformDeployment, Principal, Proposal,
    Signal, SignalsResult, StoreError, Timestamp,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;
use tracing::debug;

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence boundary for the discovery and activation pipeline.
///
/// Read queries cover signal existence, live platforms, and candidate
/// listing; writes cover proposal persistence and the activation context
/// lifecycle. Implementations must be thread-safe.
#[async_trait]
pub trait SignalStore: Send + Sync {
    // === Signal Operations ===

    /// Get a signal by id. The returned signal does NOT carry a resolved
    /// live-platform set; callers resolve it via `live_platforms`.
    async fn signal_get(&self, id: &str) -> SignalsResult<Option<Signal>>;

    /// Check whether a signal id exists in the catalog.
    async fn signal_exists(&self, id: &str) -> SignalsResult<bool>;

    /// Distinct platforms with at least one live deployment for a signal.
    async fn live_platforms(&self, signal_id: &str) -> SignalsResult<Vec<Platform>>;

    /// All live deployment rows for a signal.
    async fn live_deployments(&self, signal_id: &str) -> SignalsResult<Vec<PlatformDeployment>>;

    /// Candidate signals ordered by coverage descending then price
    /// ascending, limited. When a platform allow-list is given, only
    /// signals with a live deployment on one of those platforms qualify.
    async fn list_candidates(
        &self,
        platforms: Option<&[Platform]>,
        limit: usize,
    ) -> SignalsResult<Vec<Signal>>;

    /// All signals ordered by coverage descending, limited. Secondary
    /// query for the retrieval fallback; ignores platform filters.
    async fn list_all_signals(&self, limit: usize) -> SignalsResult<Vec<Signal>>;

    // === Principal Operations ===

    /// Whether an access record exists for the principal/signal pair.
    /// Advisory: callers log on a missing record but do not block.
    async fn principal_has_access(
        &self,
        principal_id: &str,
        signal_id: &str,
    ) -> SignalsResult<bool>;

    // === Proposal Operations ===

    /// Persist a proposal at generation time. Replaces any prior proposal
    /// with the same id.
    async fn proposal_upsert(&self, proposal: &Proposal) -> SignalsResult<()>;

    /// Get a stored proposal by id.
    async fn proposal_get(&self, id: &str) -> SignalsResult<Option<Proposal>>;

    // === Activation Context Operations ===

    /// Insert a new activation context. Fails if the id already exists.
    async fn activation_insert(&self, context: &ActivationContext) -> SignalsResult<()>;

    /// Get an activation context by id.
    async fn activation_get(&self, id: &str) -> SignalsResult<Option<ActivationContext>>;

    /// Set the status (and optionally the completion timestamp) of an
    /// activation context, returning the updated record.
    async fn activation_set_status(
        &self,
        id: &str,
        status: ActivationStatus,
        completed_at: Option<Timestamp>,
    ) -> SignalsResult<ActivationContext>;

    /// Activation contexts in {Pending, InProgress}, oldest created first,
    /// optionally limited.
    async fn activation_list_active(
        &self,
        limit: Option<usize>,
    ) -> SignalsResult<Vec<ActivationContext>>;

    /// Delete activation contexts created before the cutoff, regardless of
    /// status. Returns the number removed.
    async fn activation_delete_older_than(&self, cutoff: Timestamp) -> SignalsResult<usize>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory store over RwLock-guarded maps.
///
/// Uniqueness of deployment rows per (signal, platform, account) is
/// enforced on insert, mirroring the relational constraint that is the
/// only concurrency safety net in the store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    signals: RwLock<HashMap<String, Signal>>,
    deployments: RwLock<Vec<PlatformDeployment>>,
    proposals: RwLock<HashMap<String, Proposal>>,
    principals: RwLock<HashMap<String, Principal>>,
    access: RwLock<HashSet<(String, String)>>,
    activations: RwLock<HashMap<String, ActivationContext>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a signal row.
    pub fn add_signal(&self, signal: Signal) {
        self.signals
            .write()
            .expect("signals lock")
            .insert(signal.id.clone(), signal);
    }

    /// Seed a deployment row. Later rows replace earlier rows with the
    /// same (signal, platform, account) key.
    pub fn add_deployment(&self, deployment: PlatformDeployment) {
        let mut deployments = self.deployments.write().expect("deployments lock");
        deployments.retain(|d| {
            !(d.signal_id == deployment.signal_id
                && d.platform == deployment.platform
                && d.account == deployment.account)
        });
        deployments.push(deployment);
    }

    /// Seed a signal together with live platform-wide deployments.
    pub fn add_signal_with_platforms(&self, signal: Signal, platforms: &[&str]) {
        let id = signal.id.clone();
        self.add_signal(signal);
        for platform in platforms {
            self.add_deployment(PlatformDeployment::live(id.clone(), *platform));
        }
    }

    /// Seed a proposal row.
    pub fn add_proposal(&self, proposal: Proposal) {
        self.proposals
            .write()
            .expect("proposals lock")
            .insert(proposal.id.clone(), proposal);
    }

    /// Seed a principal row.
    pub fn add_principal(&self, principal: Principal) {
        self.principals
            .write()
            .expect("principals lock")
            .insert(principal.principal_id.clone(), principal);
    }

    /// Seed an access record for a principal/signal pair.
    pub fn grant_access(&self, principal_id: &str, signal_id: &str) {
        self.access
            .write()
            .expect("access lock")
            .insert((principal_id.to_string(), signal_id.to_string()));
    }

    /// Count of stored activation contexts.
    pub fn activation_count(&self) -> usize {
        self.activations.read().expect("activations lock").len()
    }

    fn live_platforms_sync(
        deployments: &[PlatformDeployment],
        signal_id: &str,
    ) -> Vec<Platform> {
        let set: BTreeSet<Platform> = deployments
            .iter()
            .filter(|d| d.signal_id == signal_id && d.is_live)
            .map(|d| d.platform.clone())
            .collect();
        set.into_iter().collect()
    }

    fn order_candidates(mut signals: Vec<Signal>, limit: usize) -> Vec<Signal> {
        signals.sort_by(|a, b| {
            b.coverage_percentage
                .partial_cmp(&a.coverage_percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.price
                        .partial_cmp(&b.price)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then_with(|| a.id.cmp(&b.id))
        });
        signals.truncate(limit);
        signals
    }
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn signal_get(&self, id: &str) -> SignalsResult<Option<Signal>> {
        let signals = self.signals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(signals.get(id).cloned())
    }

    async fn signal_exists(&self, id: &str) -> SignalsResult<bool> {
        let signals = self.signals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(signals.contains_key(id))
    }

    async fn live_platforms(&self, signal_id: &str) -> SignalsResult<Vec<Platform>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(Self::live_platforms_sync(&deployments, signal_id))
    }

    async fn live_deployments(&self, signal_id: &str) -> SignalsResult<Vec<PlatformDeployment>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(deployments
            .iter()
            .filter(|d| d.signal_id == signal_id && d.is_live)
            .cloned()
            .collect())
    }

    async fn list_candidates(
        &self,
        platforms: Option<&[Platform]>,
        limit: usize,
    ) -> SignalsResult<Vec<Signal>> {
        let signals = self.signals.read().map_err(|_| StoreError::LockPoisoned)?;
        let deployments = self
            .deployments
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        let matching: Vec<Signal> = signals
            .values()
            .filter(|s| match platforms {
                Some(allow) => deployments.iter().any(|d| {
                    d.signal_id == s.id && d.is_live && allow.contains(&d.platform)
                }),
                None => true,
            })
            .cloned()
            .collect();

        Ok(Self::order_candidates(matching, limit))
    }

    async fn list_all_signals(&self, limit: usize) -> SignalsResult<Vec<Signal>> {
        let signals = self.signals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(Self::order_candidates(signals.values().cloned().collect(), limit))
    }

    async fn principal_has_access(
        &self,
        principal_id: &str,
        signal_id: &str,
    ) -> SignalsResult<bool> {
        let access = self.access.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(access.contains(&(principal_id.to_string(), signal_id.to_string())))
    }

    async fn proposal_upsert(&self, proposal: &Proposal) -> SignalsResult<()> {
        let mut proposals = self
            .proposals
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        proposals.insert(proposal.id.clone(), proposal.clone());
        Ok(())
    }

    async fn proposal_get(&self, id: &str) -> SignalsResult<Option<Proposal>> {
        let proposals = self.proposals.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(proposals.get(id).cloned())
    }

    async fn activation_insert(&self, context: &ActivationContext) -> SignalsResult<()> {
        let mut activations = self
            .activations
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        if activations.contains_key(&context.context_id) {
            return Err(StoreError::InsertFailed {
                entity: "activation_context".to_string(),
                reason: format!("id already exists: {}", context.context_id),
            }
            .into());
        }
        activations.insert(context.context_id.clone(), context.clone());
        debug!(context_id = %context.context_id, "stored activation context");
        Ok(())
    }

    async fn activation_get(&self, id: &str) -> SignalsResult<Option<ActivationContext>> {
        let activations = self
            .activations
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(activations.get(id).cloned())
    }

    async fn activation_set_status(
        &self,
        id: &str,
        status: ActivationStatus,
        completed_at: Option<Timestamp>,
    ) -> SignalsResult<ActivationContext> {
        let mut activations = self
            .activations
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let context = activations
            .get_mut(id)
            .ok_or_else(|| StoreError::ActivationNotFound { id: id.to_string() })?;

        context.status = status;
        if let Some(at) = completed_at {
            context.completed_at = Some(at);
        }
        Ok(context.clone())
    }

    async fn activation_list_active(
        &self,
        limit: Option<usize>,
    ) -> SignalsResult<Vec<ActivationContext>> {
        let activations = self
            .activations
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        let mut active: Vec<ActivationContext> = activations
            .values()
            .filter(|c| {
                matches!(
                    c.status,
                    ActivationStatus::Pending | ActivationStatus::InProgress
                )
            })
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Some(limit) = limit {
            active.truncate(limit);
        }
        Ok(active)
    }

    async fn activation_delete_older_than(&self, cutoff: Timestamp) -> SignalsResult<usize> {
        let mut activations = self
            .activations
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let before = activations.len();
        activations.retain(|_, c| c.created_at >= cutoff);
        let removed = before - activations.len();
        debug!(removed, %cutoff, "deleted activation contexts past cutoff");
        Ok(removed)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Build a valid catalog signal for tests and seed data.
pub fn sample_signal(id: &str, name: &str, coverage: f64, price: f64) -> Signal {
    use signals_core::{CatalogAccess, SignalType};
    Signal {
        id: id.to_string(),
        name: name.to_string(),
        description: Some(format!("{} audience segment", name)),
        provider: "acme-data".to_string(),
        coverage_percentage: coverage,
        price,
        signal_type: SignalType::Audience,
        catalog_access: CatalogAccess::Public,
        allowed_platforms: Vec::new(),
        valid: true,
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
        // Candidate listing is coverage-desc, price-asc on ties, and
        // bounded by the limit, for any catalog contents.
        #[test]
        fn prop_candidate_ordering_holds(
            rows in proptest::collection::vec((0.0f64..100.0, 0.5f64..20.0), 1..30),
            limit in 1usize..40,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let store = MemoryStore::new();
                for (i, (coverage, price)) in rows.iter().enumerate() {
                    store.add_signal_with_platforms(
                        sample_signal(&format!("sig_{}", i), &format!("Name {}", i), *coverage, *price),
                        &["openx"],
                    );
                }

                let candidates = store.list_candidates(None, limit).await.unwrap();
                assert!(candidates.len() <= limit);
                assert!(candidates.len() <= rows.len());
                for pair in candidates.windows(2) {
                    let ordered = pair[0].coverage_percentage > pair[1].coverage_percentage
                        || (pair[0].coverage_percentage == pair[1].coverage_percentage
                            && pair[0].price <= pair[1].price);
                    assert!(ordered);
                }
            });
        }
    }
}
