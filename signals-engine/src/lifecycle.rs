//! Activation lifecycle management
//!
//! Drives activation contexts through the pending -> in_progress ->
//! completed flow. Terminal states self-map: advancing one is a no-op
//! that skips the write entirely, leaving timestamps untouched.

use chrono::{Duration as ChronoDuration, Utc};
use signals_core::{ActivationContext, ActivationStatus, SignalsResult, StoreError};
use signals_store::SignalStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Manages status transitions and retention for activation contexts.
pub struct ActivationLifecycleManager {
    store: Arc<dyn SignalStore>,
}

impl ActivationLifecycleManager {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }

    /// Advance one activation to its next status.
    ///
    /// Entering Completed or Failed sets the completion timestamp; a
    /// terminal context is returned unchanged without a store write.
    pub async fn advance(&self, activation_id: &str) -> SignalsResult<ActivationContext> {
        let current = self
            .store
            .activation_get(activation_id)
            .await?
            .ok_or_else(|| StoreError::ActivationNotFound {
                id: activation_id.to_string(),
            })?;

        let next = current.status.next();
        if next == current.status {
            info!(%activation_id, status = %current.status, "activation already terminal");
            return Ok(current);
        }

        let completed_at = next.records_completion().then(Utc::now);
        let updated = self
            .store
            .activation_set_status(activation_id, next, completed_at)
            .await?;
        info!(%activation_id, from = %current.status, to = %next, "activation status advanced");
        Ok(updated)
    }

    /// Advance up to `max` active activations, oldest created first.
    pub async fn advance_pending(&self, max: usize) -> SignalsResult<Vec<ActivationContext>> {
        let active = self.store.activation_list_active(Some(max)).await?;
        let mut updated = Vec::with_capacity(active.len());
        for context in active {
            match self.advance(&context.context_id).await {
                Ok(ctx) => updated.push(ctx),
                Err(e) => {
                    warn!(error = %e, activation_id = %context.context_id, "bulk advance skipped one activation");
                }
            }
        }
        Ok(updated)
    }

    /// Set an activation to any legal status unconditionally.
    pub async fn force(
        &self,
        activation_id: &str,
        status: ActivationStatus,
    ) -> SignalsResult<ActivationContext> {
        let completed_at = status.records_completion().then(Utc::now);
        let updated = self
            .store
            .activation_set_status(activation_id, status, completed_at)
            .await?;
        info!(%activation_id, status = %status, "activation status forced");
        Ok(updated)
    }

    /// Current context for an activation, if known.
    pub async fn status(&self, activation_id: &str) -> SignalsResult<Option<ActivationContext>> {
        self.store.activation_get(activation_id).await
    }

    /// Active activations, oldest created first.
    pub async fn list_pending(&self) -> SignalsResult<Vec<ActivationContext>> {
        self.store.activation_list_active(None).await
    }

    /// Delete activations created before the retention window, regardless
    /// of status. Returns the number removed.
    pub async fn reap(&self, retention: Duration) -> SignalsResult<usize> {
        let cutoff = Utc::now()
            - ChronoDuration::from_std(retention).unwrap_or_else(|_| ChronoDuration::days(7));
        let removed = self.store.activation_delete_older_than(cutoff).await?;
        if removed > 0 {
            info!(removed, "reaped expired activation contexts");
        }
        Ok(removed)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use signals_core::{ActivationTarget, SignalsError};
    use signals_store::MemoryStore;

    fn context(id: &str, status: ActivationStatus, age: ChronoDuration) -> ActivationContext {
        let created_at = Utc::now() - age;
        ActivationContext {
            context_id: id.to_string(),
            principal_id: "acme".to_string(),
            target: ActivationTarget::Segment("seg1".to_string()),
            status,
            created_at,
            expires_at: created_at + ChronoDuration::hours(24),
            completed_at: None,
            metadata: serde_json::json!({}),
        }
    }

    async fn seeded(contexts: Vec<ActivationContext>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for ctx in &contexts {
            store.activation_insert(ctx).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_advance_walks_the_full_sequence() {
        let store = seeded(vec![context(
            "act_1",
            ActivationStatus::Pending,
            ChronoDuration::zero(),
        )])
        .await;
        let manager = ActivationLifecycleManager::new(store);

        let first = manager.advance("act_1").await.unwrap();
        assert_eq!(first.status, ActivationStatus::InProgress);
        assert!(first.completed_at.is_none());

        let second = manager.advance("act_1").await.unwrap();
        assert_eq!(second.status, ActivationStatus::Completed);
        let completed_at = second.completed_at.unwrap();

        // third call is a no-op that leaves the timestamp alone
        let third = manager.advance("act_1").await.unwrap();
        assert_eq!(third.status, ActivationStatus::Completed);
        assert_eq!(third.completed_at, Some(completed_at));
    }

    #[tokio::test]
    async fn test_advance_unknown_id_not_found() {
        let store = seeded(vec![]).await;
        let manager = ActivationLifecycleManager::new(store);
        let result = manager.advance("act_missing").await;
        assert!(matches!(
            result,
            Err(SignalsError::Store(StoreError::ActivationNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_advance_pending_is_oldest_first_and_bounded() {
        let store = seeded(vec![
            context("act_new", ActivationStatus::Pending, ChronoDuration::minutes(1)),
            context("act_old", ActivationStatus::Pending, ChronoDuration::minutes(30)),
            context("act_mid", ActivationStatus::InProgress, ChronoDuration::minutes(10)),
            context("act_done", ActivationStatus::Completed, ChronoDuration::minutes(40)),
        ])
        .await;
        let manager = ActivationLifecycleManager::new(store);

        let updated = manager.advance_pending(2).await.unwrap();
        let ids: Vec<_> = updated.iter().map(|c| c.context_id.as_str()).collect();
        assert_eq!(ids, vec!["act_old", "act_mid"]);
        assert_eq!(updated[0].status, ActivationStatus::InProgress);
        assert_eq!(updated[1].status, ActivationStatus::Completed);
    }

    #[tokio::test]
    async fn test_force_sets_completion_for_failed() {
        let store = seeded(vec![context(
            "act_1",
            ActivationStatus::Pending,
            ChronoDuration::zero(),
        )])
        .await;
        let manager = ActivationLifecycleManager::new(store);

        let updated = manager.force("act_1", ActivationStatus::Failed).await.unwrap();
        assert_eq!(updated.status, ActivationStatus::Failed);
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_force_back_to_pending_allowed() {
        let store = seeded(vec![context(
            "act_1",
            ActivationStatus::Completed,
            ChronoDuration::zero(),
        )])
        .await;
        let manager = ActivationLifecycleManager::new(store);

        let updated = manager.force("act_1", ActivationStatus::Pending).await.unwrap();
        assert_eq!(updated.status, ActivationStatus::Pending);

        // forcing back to pending re-enables advancing
        let advanced = manager.advance("act_1").await.unwrap();
        assert_eq!(advanced.status, ActivationStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reap_honors_retention_window_regardless_of_status() {
        let store = seeded(vec![
            context("act_8d", ActivationStatus::Completed, ChronoDuration::days(8)),
            context("act_6d", ActivationStatus::Pending, ChronoDuration::days(6)),
            context("act_9d", ActivationStatus::Pending, ChronoDuration::days(9)),
        ])
        .await;
        let manager = ActivationLifecycleManager::new(store.clone());

        let removed = manager.reap(Duration::from_secs(7 * 24 * 3600)).await.unwrap();
        assert_eq!(removed, 2);
        assert!(manager.status("act_8d").await.unwrap().is_none());
        assert!(manager.status("act_9d").await.unwrap().is_none());
        assert!(manager.status("act_6d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_pending_excludes_terminal() {
        let store = seeded(vec![
            context("act_a", ActivationStatus::Pending, ChronoDuration::minutes(5)),
            context("act_b", ActivationStatus::Expired, ChronoDuration::minutes(1)),
        ])
        .await;
        let manager = ActivationLifecycleManager::new(store);

        let pending = manager.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].context_id, "act_a");
    }
}
