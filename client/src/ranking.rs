//! Ranking aggregator: concurrent, failure-tolerant leaderboard computation.
//!
//! One resolve + balance lookup per candidate, all in flight at once, so a
//! refresh takes as long as the slowest single lookup. A candidate whose
//! lookup is unresolved or fails is left out; the refresh itself never fails.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tracing::Instrument;
use turing_gateway::LedgerGateway;
use turing_types::{
    ActionKind, CandidateName, CandidateRegistry, Exclusion, ExclusionReason, Ranking,
    RankingEntry, RankingReport, RankingStatus,
};

use crate::metrics::ClientMetrics;
use crate::snapshot::Snapshot;
use crate::tracing_spans::ranking_refresh_span;

/// What caused a ranking refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    Manual,
    Action(ActionKind),
    VoteCast,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTrigger::Startup => f.write_str("startup"),
            RefreshTrigger::Manual => f.write_str("manual"),
            RefreshTrigger::Action(kind) => write!(f, "action:{kind}"),
            RefreshTrigger::VoteCast => f.write_str("vote-cast"),
        }
    }
}

pub struct RankingAggregator<G> {
    gateway: Arc<G>,
    registry: CandidateRegistry,
    snapshot: Arc<Snapshot>,
    metrics: Arc<ClientMetrics>,
}

impl<G: LedgerGateway> RankingAggregator<G> {
    pub fn new(
        gateway: Arc<G>,
        registry: CandidateRegistry,
        snapshot: Arc<Snapshot>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            gateway,
            registry,
            snapshot,
            metrics,
        }
    }

    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }

    /// Compute the leaderboard for `names` without publishing it.
    ///
    /// Idempotent and safe to run concurrently with itself.
    pub async fn compute_ranking(&self, names: &CandidateRegistry) -> RankingReport {
        let lookups = names
            .names()
            .iter()
            .enumerate()
            .map(|(position, name)| self.lookup(position, name));

        let mut rows = Vec::with_capacity(names.len());
        let mut exclusions = Vec::new();
        for outcome in join_all(lookups).await {
            match outcome {
                Ok(row) => rows.push(row),
                Err(exclusion) => exclusions.push(exclusion),
            }
        }

        let report = RankingReport::new(Ranking::from_positioned(rows), exclusions, names.len());
        if report.status == RankingStatus::AggregateEmpty {
            tracing::warn!(
                candidates = names.len(),
                lookup_failures = report.lookup_failures(),
                "no candidate could be ranked"
            );
        }
        report
    }

    /// Resolve and read one candidate. `Err` carries why it is excluded.
    async fn lookup(
        &self,
        position: usize,
        name: &CandidateName,
    ) -> Result<(usize, RankingEntry), Exclusion> {
        let excluded = |reason| Exclusion {
            name: name.clone(),
            reason,
        };

        let account = match self.gateway.resolve_account(name).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::debug!(candidate = %name, "candidate has no account yet");
                return Err(excluded(ExclusionReason::Unresolved));
            }
            Err(e) => {
                tracing::warn!(candidate = %name, error = %e, "account lookup failed");
                self.metrics.ranking_lookup_failures.inc();
                return Err(excluded(ExclusionReason::LookupFailed(e.to_string())));
            }
        };

        match self.gateway.balance_of(&account).await {
            Ok(balance) => Ok((position, RankingEntry::new(name.clone(), balance))),
            Err(e) => {
                tracing::warn!(candidate = %name, account = %account, error = %e, "balance lookup failed");
                self.metrics.ranking_lookup_failures.inc();
                Err(excluded(ExclusionReason::LookupFailed(e.to_string())))
            }
        }
    }

    /// Recompute the full registry's ranking and publish it to the snapshot.
    ///
    /// The result is published only if no refresh that started later has
    /// published first; the computed report is returned either way.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RankingReport {
        let ticket = self.snapshot.begin_refresh();
        let span = ranking_refresh_span(&trigger.to_string(), ticket.value());
        let started = Instant::now();

        let report = self.compute_ranking(&self.registry).instrument(span.clone()).await;

        self.metrics.ranking_refreshes.inc();
        self.metrics
            .ranking_refresh_ms
            .observe(started.elapsed().as_secs_f64() * 1_000.0);

        let _entered = span.enter();
        if self.snapshot.publish_ranking(ticket, report.clone()) {
            self.metrics.ranking_size.set(report.ranking.len() as i64);
            tracing::info!(
                status = %report.status,
                ranked = report.ranking.len(),
                excluded = report.exclusions.len(),
                "ranking published"
            );
        } else {
            self.metrics.ranking_stale_results.inc();
            tracing::debug!("newer ranking already published; discarding result");
        }
        report
    }
}
