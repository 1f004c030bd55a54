//! Candidate retrieval
//!
//! Pulls candidate signals from the store, resolves each row's live
//! platforms, and deduplicates by name. Retrieval never fails outward:
//! store trouble degrades to an empty candidate list.

use signals_core::{EngineConfig, Platform, Signal};
use signals_store::SignalStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieves and prepares candidate signals for ranking.
pub struct CandidateRetriever {
    store: Arc<dyn SignalStore>,
    fallback_limit: usize,
}

impl CandidateRetriever {
    pub fn new(store: Arc<dyn SignalStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            fallback_limit: config.fallback_candidate_limit,
        }
    }

    /// Retrieve up to `limit` candidates for a query.
    ///
    /// Rows without a live platform are dropped. When two rows share a
    /// name the first by store order wins; later duplicates are dropped
    /// silently. A primary query with zero results triggers a secondary
    /// all-signals query at the smaller fallback cap.
    pub async fn retrieve(
        &self,
        query: &str,
        platforms: Option<&[Platform]>,
        limit: usize,
    ) -> Vec<Signal> {
        let rows = match self.store.list_candidates(platforms, limit).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, query, "candidate query failed, returning no candidates");
                return Vec::new();
            }
        };

        let mut candidates = self.resolve_and_dedup(rows).await;

        if candidates.is_empty() {
            debug!(query, "primary candidate query empty, trying all-signals fallback");
            match self.store.list_all_signals(self.fallback_limit).await {
                Ok(rows) => candidates = self.resolve_and_dedup(rows).await,
                Err(e) => {
                    warn!(error = %e, query, "all-signals fallback query failed");
                }
            }
        }

        candidates
    }

    /// Resolve live platforms per row, drop platform-less rows, and keep
    /// the first signal per name.
    async fn resolve_and_dedup(&self, rows: Vec<Signal>) -> Vec<Signal> {
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(rows.len());

        for mut signal in rows {
            let platforms = match self.store.live_platforms(&signal.id).await {
                Ok(platforms) => platforms,
                Err(e) => {
                    warn!(error = %e, signal_id = %signal.id, "live platform lookup failed, dropping row");
                    continue;
                }
            };
            if platforms.is_empty() {
                continue;
            }
            if !seen_names.insert(signal.name.clone()) {
                continue;
            }
            signal.allowed_platforms = platforms;
            out.push(signal);
        }

        out
    }
}

// =============================================================================
// TESTS
// =============================================================================
