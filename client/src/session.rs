//! A connected client: shared snapshot, the four core components, and the
//! vote-cast subscription, wired together over one gateway.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use turing_gateway::{GatewayError, LedgerGateway};
use turing_types::{CandidateRegistry, RankingReport, TokenAmount};

use crate::config::ClientConfig;
use crate::error::{ActionError, ClientError};
use crate::event_bridge::{EventListenerBridge, Subscription};
use crate::metrics::ClientMetrics;
use crate::orchestrator::{ActionOrchestrator, ActionReceipt};
use crate::ranking::{RankingAggregator, RefreshTrigger};
use crate::snapshot::{Snapshot, SnapshotView};
use crate::voting_state::VotingStateSynchronizer;

/// How a session is set up.
#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub registry: CandidateRegistry,
    /// Burst-coalescing window for vote-cast notifications (zero = none).
    pub coalesce_window: Duration,
    /// Subscribe to vote-cast notifications on connect.
    pub listen_for_votes: bool,
}

impl SessionOptions {
    pub fn new(registry: CandidateRegistry) -> Self {
        Self {
            registry,
            coalesce_window: Duration::ZERO,
            listen_for_votes: true,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            registry: config.registry()?,
            coalesce_window: config.coalesce_window(),
            listen_for_votes: true,
        })
    }

    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// One-shot sessions (a single CLI action) skip the subscription.
    pub fn without_listener(mut self) -> Self {
        self.listen_for_votes = false;
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new(CandidateRegistry::default())
    }
}

pub struct ClientSession<G> {
    gateway: Arc<G>,
    snapshot: Arc<Snapshot>,
    metrics: Arc<ClientMetrics>,
    aggregator: Arc<RankingAggregator<G>>,
    voting: Arc<VotingStateSynchronizer<G>>,
    orchestrator: ActionOrchestrator<G>,
    subscription: Option<Subscription>,
}

impl<G: LedgerGateway> ClientSession<G> {
    /// Subscribe to vote-cast notifications, then load the voting switch and
    /// the initial ranking.
    ///
    /// Only a failed subscription fails the connect. A failed voting read
    /// leaves the switch unknown; a failed ranking shows up in its report.
    pub async fn connect(gateway: Arc<G>, options: SessionOptions) -> Result<Self, ClientError> {
        let snapshot = Arc::new(Snapshot::new());
        let metrics = Arc::new(ClientMetrics::new());
        let aggregator = Arc::new(RankingAggregator::new(
            Arc::clone(&gateway),
            options.registry.clone(),
            Arc::clone(&snapshot),
            Arc::clone(&metrics),
        ));
        let voting = Arc::new(VotingStateSynchronizer::new(
            Arc::clone(&gateway),
            Arc::clone(&snapshot),
            Arc::clone(&metrics),
        ));
        let orchestrator = ActionOrchestrator::new(
            Arc::clone(&gateway),
            Arc::clone(&aggregator),
            Arc::clone(&voting),
            Arc::clone(&snapshot),
            Arc::clone(&metrics),
        );

        let subscription = if options.listen_for_votes {
            let bridge = EventListenerBridge::new(Arc::clone(&aggregator), Arc::clone(&metrics))
                .with_coalesce_window(options.coalesce_window);
            Some(bridge.start(&gateway).await?)
        } else {
            None
        };

        // Logged by the synchronizer; the switch stays unknown.
        let _ = voting.refresh_voting_enabled().await;
        aggregator.refresh(RefreshTrigger::Startup).await;

        tracing::info!(
            gateway = gateway.name(),
            candidates = options.registry.len(),
            listening = subscription.is_some(),
            "session connected"
        );

        Ok(Self {
            gateway,
            snapshot,
            metrics,
            aggregator,
            voting,
            orchestrator,
            subscription,
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn registry(&self) -> &CandidateRegistry {
        self.aggregator.registry()
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// Immutable copy of the current ranking, voting switch and last action.
    pub fn view(&self) -> SnapshotView {
        self.snapshot.view()
    }

    /// Observe every published change to the snapshot.
    pub fn watch(&self) -> watch::Receiver<SnapshotView> {
        self.snapshot.subscribe()
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    pub async fn issue_tokens(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        self.orchestrator.issue_tokens(candidate, amount).await
    }

    pub async fn cast_vote(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        self.orchestrator.cast_vote(candidate, amount).await
    }

    pub async fn toggle_voting(&self) -> Result<ActionReceipt, ActionError> {
        self.orchestrator.toggle_voting().await
    }

    /// Recompute and publish the full ranking.
    pub async fn refresh_ranking(&self) -> RankingReport {
        self.aggregator.refresh(RefreshTrigger::Manual).await
    }

    /// Rank a subset of the registry without publishing the result.
    pub async fn compute_ranking(&self, names: &CandidateRegistry) -> RankingReport {
        self.aggregator.compute_ranking(names).await
    }

    /// Force a read of the remote switch, reconciling the cached value.
    pub async fn refresh_voting_enabled(&self) -> Result<bool, GatewayError> {
        self.voting.refresh_voting_enabled().await
    }

    /// Release the vote-cast subscription and wait until it is gone.
    pub async fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
        tracing::info!(gateway = self.gateway.name(), "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turing_nullables::{GatewayCall, NullGateway};
    use turing_types::RankingStatus;

    fn options(names: &[&str]) -> SessionOptions {
        SessionOptions::new(CandidateRegistry::new(names).unwrap())
    }

    #[tokio::test]
    async fn connect_loads_switch_and_ranking() {
        let gateway = Arc::new(NullGateway::with_candidates(&[("a", 3), ("b", 7)]));
        let session = ClientSession::connect(Arc::clone(&gateway), options(&["a", "b"]))
            .await
            .unwrap();

        let view = session.view();
        assert_eq!(view.voting_enabled, Some(true));
        assert_eq!(view.report.status, RankingStatus::Complete);
        assert_eq!(view.ranking().entries()[0].name.as_str(), "b");
        assert!(session.is_listening());
        assert_eq!(gateway.open_subscriptions(), 1);
    }

    #[tokio::test]
    async fn failed_voting_read_leaves_switch_unknown() {
        let gateway = Arc::new(NullGateway::with_candidates(&[("a", 3)]));
        gateway.fail_voting_read(Some("node down"));

        let session = ClientSession::connect(Arc::clone(&gateway), options(&["a"]))
            .await
            .unwrap();
        assert_eq!(session.view().voting_enabled, None);

        gateway.fail_voting_read(None);
        assert_eq!(session.refresh_voting_enabled().await, Ok(true));
        assert_eq!(session.view().voting_enabled, Some(true));
    }

    #[tokio::test]
    async fn one_shot_session_does_not_subscribe() {
        let gateway = Arc::new(NullGateway::new());
        let session = ClientSession::connect(
            Arc::clone(&gateway),
            options(&["a"]).without_listener(),
        )
        .await
        .unwrap();
        assert!(!session.is_listening());
        assert_eq!(gateway.calls(GatewayCall::SubscribeVoteCast), 0);
    }

    #[tokio::test]
    async fn close_releases_subscription() {
        let gateway = Arc::new(NullGateway::new());
        let session = ClientSession::connect(Arc::clone(&gateway), options(&["a"]))
            .await
            .unwrap();
        assert_eq!(gateway.open_subscriptions(), 1);

        session.close().await;
        assert_eq!(gateway.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn dropping_session_releases_subscription() {
        let gateway = Arc::new(NullGateway::new());
        let session = ClientSession::connect(Arc::clone(&gateway), options(&["a"]))
            .await
            .unwrap();
        drop(session);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(gateway.open_subscriptions(), 0);
    }
}
