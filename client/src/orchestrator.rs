//! Action orchestrator: issue tokens, cast votes, toggle voting.
//!
//! Every action runs validate → submit → await confirmation →
//! re-synchronize → report, and ends in exactly one receipt or error.
//! A failed action leaves the ranking and the voting cache untouched.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::Instrument;
use turing_gateway::{Confirmation, GatewayError, LedgerGateway, Submission};
use turing_types::{
    ActionKind, ActionOutcome, CandidateName, CandidateRegistry, PendingAction, RankingReport,
    TokenAmount, TuringError,
};

use crate::error::ActionError;
use crate::metrics::ClientMetrics;
use crate::ranking::{RankingAggregator, RefreshTrigger};
use crate::snapshot::Snapshot;
use crate::tracing_spans::action_span;
use crate::voting_state::VotingStateSynchronizer;

/// Successful end of an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReceipt {
    pub action: PendingAction,
    pub confirmation: Confirmation,
    /// Ranking recomputed after the action (issue and vote).
    pub ranking: Option<RankingReport>,
    /// Voting switch after the action (toggle).
    pub voting_enabled: Option<bool>,
}

impl ActionReceipt {
    pub fn kind(&self) -> ActionKind {
        self.action.kind
    }

    /// Human-readable summary for display.
    pub fn message(&self) -> String {
        let candidate = self
            .action
            .candidate
            .as_ref()
            .map(CandidateName::as_str)
            .unwrap_or("-");
        let amount = self.action.amount.unwrap_or_default();
        match self.action.kind {
            ActionKind::Issue => format!("issued {amount} to {candidate}"),
            ActionKind::Vote => format!("vote of {amount} for {candidate} recorded"),
            ActionKind::Toggle => match self.voting_enabled {
                Some(true) => "voting enabled".to_string(),
                _ => "voting disabled".to_string(),
            },
        }
    }
}

/// Voting switch as seen by an action, and whether it came from a read
/// the cache has not seen yet.
#[derive(Clone, Copy)]
struct KnownSwitch {
    enabled: bool,
    fresh: bool,
}

pub struct ActionOrchestrator<G> {
    gateway: Arc<G>,
    aggregator: Arc<RankingAggregator<G>>,
    voting: Arc<VotingStateSynchronizer<G>>,
    snapshot: Arc<Snapshot>,
    metrics: Arc<ClientMetrics>,
    /// Held for the whole of a toggle so two never overlap.
    toggle_lock: Mutex<()>,
}

impl<G: LedgerGateway> ActionOrchestrator<G> {
    pub fn new(
        gateway: Arc<G>,
        aggregator: Arc<RankingAggregator<G>>,
        voting: Arc<VotingStateSynchronizer<G>>,
        snapshot: Arc<Snapshot>,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        Self {
            gateway,
            aggregator,
            voting,
            snapshot,
            metrics,
            toggle_lock: Mutex::new(()),
        }
    }

    fn registry(&self) -> &CandidateRegistry {
        self.aggregator.registry()
    }

    /// Issue `amount` tokens to `candidate`, then refresh the ranking.
    pub async fn issue_tokens(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        let span = action_span(ActionKind::Issue.as_str(), Some(candidate));
        let result = self.run_issue(candidate, amount).instrument(span.clone()).await;
        let _entered = span.enter();
        self.report(ActionKind::Issue, result)
    }

    /// Vote `amount` for `candidate`, then refresh the ranking.
    ///
    /// Fails locally, without a remote call, when the cached switch is off.
    /// An unknown switch is read first.
    pub async fn cast_vote(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        let span = action_span(ActionKind::Vote.as_str(), Some(candidate));
        let result = self.run_vote(candidate, amount).instrument(span.clone()).await;
        let _entered = span.enter();
        self.report(ActionKind::Vote, result)
    }

    /// Flip the voting switch and, once confirmed, cache the new value.
    ///
    /// A second toggle while one is awaiting confirmation fails with
    /// [`ActionError::ToggleInFlight`].
    pub async fn toggle_voting(&self) -> Result<ActionReceipt, ActionError> {
        let span = action_span(ActionKind::Toggle.as_str(), None);
        let result = self.run_toggle().instrument(span.clone()).await;
        let _entered = span.enter();
        self.report(ActionKind::Toggle, result)
    }

    async fn run_issue(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        let name = self.validate(candidate, amount)?;
        let confirmation = self
            .submit_and_confirm(self.gateway.issue_tokens(&name, amount))
            .await?;
        let ranking = self
            .aggregator
            .refresh(RefreshTrigger::Action(ActionKind::Issue))
            .await;
        Ok(ActionReceipt {
            action: PendingAction::issue(name, amount),
            confirmation,
            ranking: Some(ranking),
            voting_enabled: None,
        })
    }

    async fn run_vote(
        &self,
        candidate: &str,
        amount: TokenAmount,
    ) -> Result<ActionReceipt, ActionError> {
        let name = self.validate(candidate, amount)?;
        let switch = self.known_voting_enabled().await?;
        if !switch.enabled {
            return Err(ActionError::VotingDisabled);
        }
        let confirmation = self
            .submit_and_confirm(self.gateway.cast_vote(&name, amount))
            .await?;
        if switch.fresh {
            self.voting.record_observed(true);
        }
        let ranking = self
            .aggregator
            .refresh(RefreshTrigger::Action(ActionKind::Vote))
            .await;
        Ok(ActionReceipt {
            action: PendingAction::vote(name, amount),
            confirmation,
            ranking: Some(ranking),
            voting_enabled: None,
        })
    }

    async fn run_toggle(&self) -> Result<ActionReceipt, ActionError> {
        let _guard = self
            .toggle_lock
            .try_lock()
            .map_err(|_| ActionError::ToggleInFlight)?;
        let target = !self.known_voting_enabled().await?.enabled;
        let confirmation = self
            .submit_and_confirm(self.gateway.set_voting_enabled(target))
            .await?;
        self.voting.apply_local_toggle(target);
        Ok(ActionReceipt {
            action: PendingAction::toggle(),
            confirmation,
            ranking: None,
            voting_enabled: Some(target),
        })
    }

    /// The cached switch, read from the ledger first if still unknown.
    ///
    /// A fresh read is not cached here; the caller records it only once its
    /// action succeeds, so a failed action leaves the cache as it was.
    async fn known_voting_enabled(&self) -> Result<KnownSwitch, ActionError> {
        match self.voting.current() {
            Some(enabled) => Ok(KnownSwitch {
                enabled,
                fresh: false,
            }),
            None => Ok(KnownSwitch {
                enabled: self.voting.read_remote().await?,
                fresh: true,
            }),
        }
    }

    fn validate(&self, candidate: &str, amount: TokenAmount) -> Result<CandidateName, ActionError> {
        let name = self.registry().resolve(candidate)?.clone();
        if amount.is_zero() {
            return Err(TuringError::NonPositiveAmount.into());
        }
        Ok(name)
    }

    async fn submit_and_confirm<F>(&self, submit: F) -> Result<Confirmation, ActionError>
    where
        F: Future<Output = Result<Submission, GatewayError>> + Send,
    {
        let submission = submit.await?;
        tracing::debug!(tx_hash = %submission.tx_hash, "awaiting confirmation");
        Ok(self.gateway.await_confirmation(&submission).await?)
    }

    fn report(
        &self,
        kind: ActionKind,
        result: Result<ActionReceipt, ActionError>,
    ) -> Result<ActionReceipt, ActionError> {
        let outcome = match &result {
            Ok(receipt) => {
                self.metrics.actions_succeeded.inc();
                let message = receipt.message();
                tracing::info!(action = %kind, tx_hash = %receipt.confirmation.tx_hash, "{message}");
                ActionOutcome::succeeded(kind, message)
            }
            Err(e) => {
                self.metrics.actions_failed.inc();
                if e.is_local() {
                    tracing::info!(action = %kind, reason = %e, "action refused locally");
                } else {
                    tracing::warn!(action = %kind, error = %e, "action failed");
                }
                ActionOutcome::failed(kind, e.to_string())
            }
        };
        self.snapshot.record_action(outcome);
        result
    }
}
