//! Event listener bridge: turns remote vote-cast notifications into ranking
//! refreshes.
//!
//! Notifications carry no usable payload, so each one (or each burst, when a
//! coalescing window is set) triggers a full recomputation through the
//! aggregator. Duplicated notifications only cause redundant refreshes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;
use turing_gateway::{GatewayError, LedgerGateway, VoteCastStream};
use turing_types::RankingReport;

use crate::metrics::ClientMetrics;
use crate::ranking::{RankingAggregator, RefreshTrigger};
use crate::tracing_spans::vote_cast_event_span;

type RankingListener = Box<dyn Fn(&RankingReport) + Send + Sync>;

pub struct EventListenerBridge<G> {
    aggregator: Arc<RankingAggregator<G>>,
    metrics: Arc<ClientMetrics>,
    coalesce_window: Duration,
    listeners: Vec<RankingListener>,
}

impl<G: LedgerGateway> EventListenerBridge<G> {
    pub fn new(aggregator: Arc<RankingAggregator<G>>, metrics: Arc<ClientMetrics>) -> Self {
        Self {
            aggregator,
            metrics,
            coalesce_window: Duration::ZERO,
            listeners: Vec::new(),
        }
    }

    /// Fold notifications arriving within `window` of the first into a
    /// single refresh. Zero refreshes once per notification.
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// Register a callback invoked with every ranking recomputed in response
    /// to a notification. Callbacks run on the listener task; keep them fast.
    pub fn on_external_vote_cast<F>(&mut self, listener: F)
    where
        F: Fn(&RankingReport) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Open the notification stream and start reacting to it.
    pub async fn start(self, gateway: &G) -> Result<Subscription, GatewayError> {
        let stream = gateway.subscribe_vote_cast().await?;
        tracing::info!(
            gateway = gateway.name(),
            coalesce_ms = self.coalesce_window.as_millis() as u64,
            "listening for vote-cast notifications"
        );
        let task = tokio::spawn(self.run(stream));
        Ok(Subscription { task: Some(task) })
    }

    async fn run(self, mut stream: VoteCastStream) {
        let mut seq = 0u64;
        while let Some(event) = stream.next().await {
            seq += 1;
            if let Some(voter) = &event.voter {
                tracing::debug!(voter = %voter, "vote cast");
            }
            let coalesced = 1 + self.drain_burst(&mut stream).await;
            self.metrics.vote_cast_events.inc_by(coalesced as u64);

            let report = self
                .aggregator
                .refresh(RefreshTrigger::VoteCast)
                .instrument(vote_cast_event_span(seq, coalesced))
                .await;
            for listener in &self.listeners {
                listener(&report);
            }
        }
        tracing::info!("vote-cast stream closed");
    }

    /// Swallow notifications that arrive inside the coalescing window.
    async fn drain_burst(&self, stream: &mut VoteCastStream) -> usize {
        if self.coalesce_window.is_zero() {
            return 0;
        }
        let deadline = Instant::now() + self.coalesce_window;
        let mut extra = 0;
        while let Ok(Some(_)) = tokio::time::timeout_at(deadline, stream.next()).await {
            extra += 1;
        }
        extra
    }
}

/// Handle to a running listener. Dropping it stops the listener and releases
/// the remote subscription.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop listening and wait until the subscription has been released.
    /// No refresh is triggered by notifications arriving afterwards.
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// False once the stream has ended or the listener was stopped.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use turing_nullables::{GatewayCall, NullGateway};
    use turing_types::{CandidateRegistry, TokenAmount};

    use crate::snapshot::Snapshot;

    fn bridge(gateway: &Arc<NullGateway>) -> (EventListenerBridge<NullGateway>, Arc<Snapshot>) {
        let snapshot = Arc::new(Snapshot::new());
        let metrics = Arc::new(ClientMetrics::new());
        let aggregator = Arc::new(RankingAggregator::new(
            Arc::clone(gateway),
            CandidateRegistry::new(["a", "b"]).unwrap(),
            Arc::clone(&snapshot),
            Arc::clone(&metrics),
        ));
        (EventListenerBridge::new(aggregator, metrics), snapshot)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn each_notification_triggers_one_refresh() {
        let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2)]));
        let (mut bridge, snapshot) = bridge(&gateway);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        bridge.on_external_vote_cast(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let subscription = bridge.start(&gateway).await.unwrap();

        gateway.set_balance("a", TokenAmount::from_tokens(9));
        gateway.emit_vote_cast();
        settle().await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 2);
        assert_eq!(snapshot.ranking().entries()[0].name.as_str(), "a");
        assert!(subscription.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn burst_inside_window_is_coalesced() {
        let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2)]));
        let (bridge, _snapshot) = bridge(&gateway);
        let bridge = bridge.with_coalesce_window(Duration::from_millis(20));
        let _subscription = bridge.start(&gateway).await.unwrap();

        for _ in 0..5 {
            gateway.emit_vote_cast();
        }
        settle().await;

        // One refresh resolves both candidates once.
        assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_releases_remote_stream() {
        let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1)]));
        let (bridge, _snapshot) = bridge(&gateway);
        let subscription = bridge.start(&gateway).await.unwrap();
        assert_eq!(gateway.open_subscriptions(), 1);

        subscription.unsubscribe().await;
        assert_eq!(gateway.open_subscriptions(), 0);

        gateway.emit_vote_cast();
        settle().await;
        assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 0);
    }
}
