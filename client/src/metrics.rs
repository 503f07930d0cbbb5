//! Prometheus metrics for the Turing client.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`] covering ranking
//! refreshes, actions, and vote-cast notifications.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::ClientError;

pub struct ClientMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Ranking computations completed.
    pub ranking_refreshes: IntCounter,
    /// Per-candidate lookups that failed remotely (not "unresolved").
    pub ranking_lookup_failures: IntCounter,
    /// Refresh results discarded because a newer refresh already published.
    pub ranking_stale_results: IntCounter,
    pub actions_succeeded: IntCounter,
    pub actions_failed: IntCounter,
    pub vote_cast_events: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// 1 when the cached voting switch is on, 0 when off or unknown.
    pub voting_enabled: IntGauge,
    /// Entries in the last published ranking.
    pub ranking_size: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    pub ranking_refresh_ms: Histogram,
}

impl ClientMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let ranking_refreshes = register_int_counter_with_registry!(
            Opts::new("turing_ranking_refreshes_total", "Ranking computations completed"),
            registry
        )
        .expect("failed to register ranking_refreshes counter");

        let ranking_lookup_failures = register_int_counter_with_registry!(
            Opts::new(
                "turing_ranking_lookup_failures_total",
                "Candidate lookups that failed remotely"
            ),
            registry
        )
        .expect("failed to register ranking_lookup_failures counter");

        let ranking_stale_results = register_int_counter_with_registry!(
            Opts::new(
                "turing_ranking_stale_results_total",
                "Ranking results discarded in favour of a newer refresh"
            ),
            registry
        )
        .expect("failed to register ranking_stale_results counter");

        let actions_succeeded = register_int_counter_with_registry!(
            Opts::new("turing_actions_succeeded_total", "Actions confirmed by the ledger"),
            registry
        )
        .expect("failed to register actions_succeeded counter");

        let actions_failed = register_int_counter_with_registry!(
            Opts::new("turing_actions_failed_total", "Actions that ended in failure"),
            registry
        )
        .expect("failed to register actions_failed counter");

        let vote_cast_events = register_int_counter_with_registry!(
            Opts::new("turing_vote_cast_events_total", "Vote-cast notifications received"),
            registry
        )
        .expect("failed to register vote_cast_events counter");

        let voting_enabled = register_int_gauge_with_registry!(
            Opts::new("turing_voting_enabled", "Cached voting switch (1 = on)"),
            registry
        )
        .expect("failed to register voting_enabled gauge");

        let ranking_size = register_int_gauge_with_registry!(
            Opts::new("turing_ranking_size", "Entries in the published ranking"),
            registry
        )
        .expect("failed to register ranking_size gauge");

        // 1 ms → ~16 s.
        let ranking_refresh_ms = register_histogram_with_registry!(
            HistogramOpts::new("turing_ranking_refresh_ms", "Ranking refresh time in milliseconds")
                .buckets(prometheus::exponential_buckets(1.0, 2.0, 15).expect("valid buckets")),
            registry
        )
        .expect("failed to register ranking_refresh_ms histogram");

        Self {
            registry,
            ranking_refreshes,
            ranking_lookup_failures,
            ranking_stale_results,
            actions_succeeded,
            actions_failed,
            vote_cast_events,
            voting_enabled,
            ranking_size,
            ranking_refresh_ms,
        }
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, ClientError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ClientError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| ClientError::Metrics(e.to_string()))
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
