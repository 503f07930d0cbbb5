//! Nullable gateway: an in-memory voting contract.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use turing_gateway::{Confirmation, GatewayError, LedgerGateway, Submission, VoteCastStream};
use turing_types::{CandidateAccount, CandidateName, TokenAmount, VoteCast};

/// Remote operations, for call counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    ResolveAccount,
    BalanceOf,
    IssueTokens,
    CastVote,
    IsVotingEnabled,
    SetVotingEnabled,
    AwaitConfirmation,
    SubscribeVoteCast,
}

impl GatewayCall {
    /// Calls that change contract state.
    pub fn is_submission(&self) -> bool {
        matches!(
            self,
            GatewayCall::IssueTokens | GatewayCall::CastVote | GatewayCall::SetVotingEnabled
        )
    }
}

#[derive(Clone, Debug)]
enum PendingTx {
    Issue(CandidateName, TokenAmount),
    Vote(CandidateName, TokenAmount),
    SetVoting(bool),
}

#[derive(Default)]
struct State {
    accounts: HashMap<CandidateName, CandidateAccount>,
    balances: HashMap<CandidateAccount, TokenAmount>,
    voting_enabled: bool,
    failing_lookups: HashMap<CandidateName, String>,
    failing_balances: HashMap<CandidateName, String>,
    lookup_delays: HashMap<CandidateName, Duration>,
    reject_submissions: Option<String>,
    reject_confirmations: Option<String>,
    confirmation_delay: Option<Duration>,
    voting_read_failure: Option<String>,
    pending: HashMap<String, PendingTx>,
    next_tx: u64,
    calls: HashMap<GatewayCall, usize>,
    subscribers: Vec<mpsc::Sender<VoteCast>>,
}

/// A deterministic in-memory voting contract.
///
/// Submissions take effect only when confirmed through
/// [`LedgerGateway::await_confirmation`]. Votes require the switch to be on
/// at submission time, mirroring the contract's own check.
pub struct NullGateway {
    state: Mutex<State>,
}

impl NullGateway {
    /// Empty contract with voting enabled.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                voting_enabled: true,
                ..Default::default()
            }),
        }
    }

    /// Contract with each `(name, tokens)` registered at a generated account.
    pub fn with_candidates(candidates: &[(&str, u64)]) -> Self {
        let gateway = Self::new();
        for (name, tokens) in candidates {
            gateway.register(name, TokenAmount::from_tokens(*tokens));
        }
        gateway
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: GatewayCall) {
        *self.lock().calls.entry(call).or_default() += 1;
    }

    fn candidate_name(raw: &str) -> CandidateName {
        CandidateName::new(raw).unwrap_or_else(|e| panic!("bad candidate name {raw:?}: {e}"))
    }

    /// Register `name` with a fresh account holding `balance`.
    pub fn register(&self, name: &str, balance: TokenAmount) -> CandidateAccount {
        let mut state = self.lock();
        let index = state.accounts.len() as u64 + 1;
        let account = CandidateAccount::parse(&format!("0x{index:040x}"))
            .unwrap_or_else(|e| panic!("generated account is invalid: {e}"));
        state.accounts.insert(Self::candidate_name(name), account.clone());
        state.balances.insert(account.clone(), balance);
        account
    }

    /// Overwrite a registered candidate's balance.
    pub fn set_balance(&self, name: &str, balance: TokenAmount) {
        let mut state = self.lock();
        let account = state
            .accounts
            .get(&Self::candidate_name(name))
            .cloned()
            .unwrap_or_else(|| panic!("{name} is not registered"));
        state.balances.insert(account, balance);
    }

    pub fn balance(&self, name: &str) -> Option<TokenAmount> {
        let state = self.lock();
        state
            .accounts
            .get(&Self::candidate_name(name))
            .and_then(|a| state.balances.get(a).copied())
    }

    /// Make account resolution for `name` fail with a transport error.
    pub fn fail_lookup(&self, name: &str, reason: &str) {
        self.lock()
            .failing_lookups
            .insert(Self::candidate_name(name), reason.to_string());
    }

    /// Make the balance read for `name` fail with a transport error.
    pub fn fail_balance(&self, name: &str, reason: &str) {
        self.lock()
            .failing_balances
            .insert(Self::candidate_name(name), reason.to_string());
    }

    /// Let every lookup for `name` succeed again.
    pub fn heal(&self, name: &str) {
        let mut state = self.lock();
        let name = Self::candidate_name(name);
        state.failing_lookups.remove(&name);
        state.failing_balances.remove(&name);
    }

    /// Delay account resolution for `name`.
    pub fn delay_lookup(&self, name: &str, delay: Duration) {
        self.lock().lookup_delays.insert(Self::candidate_name(name), delay);
    }

    /// Reject every submission with `reason` (`None` to accept again).
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.lock().reject_submissions = reason.map(str::to_string);
    }

    /// Accept submissions but revert them at confirmation (`None` to confirm again).
    pub fn reject_confirmations(&self, reason: Option<&str>) {
        self.lock().reject_confirmations = reason.map(str::to_string);
    }

    /// Hold every confirmation for `delay` (`None` to confirm at once).
    pub fn delay_confirmations(&self, delay: Option<Duration>) {
        self.lock().confirmation_delay = delay;
    }

    /// Make the voting-switch read fail (`None` to read normally).
    pub fn fail_voting_read(&self, reason: Option<&str>) {
        self.lock().voting_read_failure = reason.map(str::to_string);
    }

    /// Flip the switch remotely, as another operator would.
    pub fn set_remote_voting(&self, enabled: bool) {
        self.lock().voting_enabled = enabled;
    }

    pub fn remote_voting(&self) -> bool {
        self.lock().voting_enabled
    }

    /// Deliver a vote-cast notification to every open subscription.
    pub fn emit_vote_cast(&self) {
        let mut state = self.lock();
        state
            .subscribers
            .retain(|tx| tx.try_send(VoteCast::default()).is_ok() || !tx.is_closed());
    }

    /// Number of subscriptions whose receiver is still alive.
    pub fn open_subscriptions(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// How many times `call` reached the gateway.
    pub fn calls(&self, call: GatewayCall) -> usize {
        self.lock().calls.get(&call).copied().unwrap_or(0)
    }

    /// Total state-changing submissions.
    pub fn submissions(&self) -> usize {
        let state = self.lock();
        state
            .calls
            .iter()
            .filter(|(call, _)| call.is_submission())
            .map(|(_, n)| n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    fn submit(&self, call: GatewayCall, tx: PendingTx) -> Result<Submission, GatewayError> {
        self.record(call);
        let mut state = self.lock();
        if let Some(reason) = &state.reject_submissions {
            return Err(GatewayError::Rejected(reason.clone()));
        }
        match &tx {
            PendingTx::Issue(name, _) | PendingTx::Vote(name, _)
                if !state.accounts.contains_key(name) =>
            {
                return Err(GatewayError::Rejected(format!("unknown codinome {name}")));
            }
            PendingTx::Vote(..) if !state.voting_enabled => {
                return Err(GatewayError::Rejected("voting is closed".into()));
            }
            _ => {}
        }
        state.next_tx += 1;
        let tx_hash = format!("0x{:064x}", state.next_tx);
        state.pending.insert(tx_hash.clone(), tx);
        Ok(Submission { tx_hash })
    }
}

impl Default for NullGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerGateway for NullGateway {
    async fn resolve_account(
        &self,
        name: &CandidateName,
    ) -> Result<Option<CandidateAccount>, GatewayError> {
        self.record(GatewayCall::ResolveAccount);
        let delay = self.lock().lookup_delays.get(name).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.lock();
        if let Some(reason) = state.failing_lookups.get(name) {
            return Err(GatewayError::Transport(reason.clone()));
        }
        Ok(state.accounts.get(name).cloned())
    }

    async fn balance_of(&self, account: &CandidateAccount) -> Result<TokenAmount, GatewayError> {
        self.record(GatewayCall::BalanceOf);
        let state = self.lock();
        let failing = state
            .accounts
            .iter()
            .find(|(_, a)| *a == account)
            .and_then(|(name, _)| state.failing_balances.get(name));
        if let Some(reason) = failing {
            return Err(GatewayError::Transport(reason.clone()));
        }
        Ok(state.balances.get(account).copied().unwrap_or_default())
    }

    async fn issue_tokens(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> Result<Submission, GatewayError> {
        self.submit(GatewayCall::IssueTokens, PendingTx::Issue(name.clone(), amount))
    }

    async fn cast_vote(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> Result<Submission, GatewayError> {
        self.submit(GatewayCall::CastVote, PendingTx::Vote(name.clone(), amount))
    }

    async fn is_voting_enabled(&self) -> Result<bool, GatewayError> {
        self.record(GatewayCall::IsVotingEnabled);
        let state = self.lock();
        match &state.voting_read_failure {
            Some(reason) => Err(GatewayError::Transport(reason.clone())),
            None => Ok(state.voting_enabled),
        }
    }

    async fn set_voting_enabled(&self, enabled: bool) -> Result<Submission, GatewayError> {
        self.submit(GatewayCall::SetVotingEnabled, PendingTx::SetVoting(enabled))
    }

    async fn await_confirmation(
        &self,
        submission: &Submission,
    ) -> Result<Confirmation, GatewayError> {
        self.record(GatewayCall::AwaitConfirmation);
        let delay = self.lock().confirmation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let vote_cast = {
            let mut state = self.lock();
            let tx = state.pending.remove(&submission.tx_hash).ok_or_else(|| {
                GatewayError::InvalidResponse(format!("unknown transaction {}", submission.tx_hash))
            })?;
            if let Some(reason) = &state.reject_confirmations {
                return Err(GatewayError::Rejected(reason.clone()));
            }
            let (name, amount, is_vote) = match tx {
                PendingTx::Issue(name, amount) => (name, amount, false),
                PendingTx::Vote(name, amount) => (name, amount, true),
                PendingTx::SetVoting(enabled) => {
                    state.voting_enabled = enabled;
                    return Ok(Confirmation {
                        tx_hash: submission.tx_hash.clone(),
                        detail: None,
                    });
                }
            };
            let account = state
                .accounts
                .get(&name)
                .cloned()
                .ok_or_else(|| GatewayError::Rejected(format!("unknown codinome {name}")))?;
            let balance = state.balances.entry(account).or_default();
            *balance = balance.saturating_add(amount);
            is_vote
        };
        if vote_cast {
            self.emit_vote_cast();
        }
        Ok(Confirmation {
            tx_hash: submission.tx_hash.clone(),
            detail: None,
        })
    }

    async fn subscribe_vote_cast(&self) -> Result<VoteCastStream, GatewayError> {
        self.record(GatewayCall::SubscribeVoteCast);
        let (tx, stream) = VoteCastStream::channel(64);
        self.lock().subscribers.push(tx);
        Ok(stream)
    }

    fn name(&self) -> &str {
        "null"
    }
}
