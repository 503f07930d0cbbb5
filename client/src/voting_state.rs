//! Local mirror of the remote voting switch.
//!
//! The cached value is only ever the result of a successful read or of a
//! confirmed toggle, never a guess made before confirmation.

use std::sync::Arc;

use tracing::Instrument;
use turing_gateway::{GatewayError, LedgerGateway};

use crate::metrics::ClientMetrics;
use crate::snapshot::Snapshot;
use crate::tracing_spans::voting_refresh_span;

pub struct VotingStateSynchronizer<G> {
    gateway: Arc<G>,
    snapshot: Arc<Snapshot>,
    metrics: Arc<ClientMetrics>,
}

impl<G: LedgerGateway> VotingStateSynchronizer<G> {
    pub fn new(gateway: Arc<G>, snapshot: Arc<Snapshot>, metrics: Arc<ClientMetrics>) -> Self {
        Self {
            gateway,
            snapshot,
            metrics,
        }
    }

    /// Cached switch; `None` until the first successful read.
    pub fn current(&self) -> Option<bool> {
        self.snapshot.voting_enabled()
    }

    /// Read the switch from the ledger and overwrite the cache.
    ///
    /// On failure the cache keeps its previous value.
    pub async fn refresh_voting_enabled(&self) -> Result<bool, GatewayError> {
        let enabled = self.read_remote().await?;
        self.store(enabled);
        Ok(enabled)
    }

    /// Read the switch from the ledger without touching the cache.
    pub async fn read_remote(&self) -> Result<bool, GatewayError> {
        self.gateway
            .is_voting_enabled()
            .instrument(voting_refresh_span())
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "voting state read failed");
                e
            })
    }

    /// Cache a value read by [`read_remote`](Self::read_remote) once the
    /// action that needed it has succeeded.
    pub fn record_observed(&self, enabled: bool) {
        self.store(enabled);
    }

    /// Record a toggle the ledger has confirmed, without reading it back.
    pub fn apply_local_toggle(&self, enabled: bool) {
        self.store(enabled);
    }

    fn store(&self, enabled: bool) {
        self.metrics.voting_enabled.set(i64::from(enabled));
        if self.snapshot.set_voting_enabled(enabled) {
            tracing::info!(enabled, "voting state changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turing_nullables::{GatewayCall, NullGateway};

    fn synchronizer(gateway: NullGateway) -> VotingStateSynchronizer<NullGateway> {
        VotingStateSynchronizer::new(
            Arc::new(gateway),
            Arc::new(Snapshot::new()),
            Arc::new(ClientMetrics::new()),
        )
    }

    #[tokio::test]
    async fn refresh_overwrites_cache() {
        let sync = synchronizer(NullGateway::new());
        assert_eq!(sync.current(), None);

        sync.gateway.set_remote_voting(false);
        assert!(!sync.refresh_voting_enabled().await.unwrap());
        assert_eq!(sync.current(), Some(false));
        assert_eq!(sync.metrics.voting_enabled.get(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_value() {
        let sync = synchronizer(NullGateway::new());
        sync.refresh_voting_enabled().await.unwrap();

        sync.gateway.fail_voting_read(Some("node offline"));
        assert!(sync.refresh_voting_enabled().await.is_err());
        assert_eq!(sync.current(), Some(true));
    }

    #[tokio::test]
    async fn remote_read_leaves_cache_alone() {
        let sync = synchronizer(NullGateway::new());
        assert!(sync.read_remote().await.unwrap());
        assert_eq!(sync.current(), None);

        sync.record_observed(true);
        assert_eq!(sync.current(), Some(true));
    }

    #[tokio::test]
    async fn local_toggle_needs_no_round_trip() {
        let sync = synchronizer(NullGateway::new());
        sync.apply_local_toggle(false);
        assert_eq!(sync.current(), Some(false));
        assert_eq!(sync.gateway.calls(GatewayCall::IsVotingEnabled), 0);
    }

    #[tokio::test]
    async fn forced_refresh_reconciles_local_toggle() {
        let sync = synchronizer(NullGateway::new());
        sync.apply_local_toggle(false);
        assert!(sync.refresh_voting_enabled().await.unwrap());
        assert_eq!(sync.current(), Some(true));
    }
}
