//! The client's only shared mutable state: the published ranking and the
//! cached voting switch.
//!
//! Both live inside a `tokio::sync::watch` channel, so every update is an
//! atomic replace and observers get an immutable copy per change.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use turing_types::{ActionOutcome, Ranking, RankingReport};

/// Immutable copy of the client state handed to callers and observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotView {
    /// Last published ranking computation.
    pub report: RankingReport,
    /// Ticket of the refresh that produced `report` (0 = never refreshed).
    pub ranking_ticket: u64,
    /// Cached voting switch; `None` until the first successful read.
    pub voting_enabled: Option<bool>,
    /// Result of the most recent action, for display.
    pub last_action: Option<ActionOutcome>,
}

impl SnapshotView {
    pub fn ranking(&self) -> &Ranking {
        &self.report.ranking
    }
}

impl Default for SnapshotView {
    fn default() -> Self {
        Self {
            report: RankingReport::not_loaded(),
            ranking_ticket: 0,
            voting_enabled: None,
            last_action: None,
        }
    }
}

/// Ordering token drawn when a ranking refresh starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Owner of the ranking and voting caches.
///
/// Ranking results are published newest-started-wins: a refresh that began
/// earlier can never overwrite one that began later, whatever order they
/// settle in.
pub struct Snapshot {
    tx: watch::Sender<SnapshotView>,
    next_ticket: AtomicU64,
}

impl Snapshot {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SnapshotView::default());
        Self {
            tx,
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Copy of the current state.
    pub fn view(&self) -> SnapshotView {
        self.tx.borrow().clone()
    }

    pub fn ranking(&self) -> Ranking {
        self.tx.borrow().report.ranking.clone()
    }

    pub fn voting_enabled(&self) -> Option<bool> {
        self.tx.borrow().voting_enabled
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SnapshotView> {
        self.tx.subscribe()
    }

    /// Draw the ticket for a refresh that is about to start.
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publish a ranking computed under `ticket`.
    ///
    /// Returns `false`, leaving the state untouched, when a refresh that
    /// started later has already published.
    pub fn publish_ranking(&self, ticket: RefreshTicket, report: RankingReport) -> bool {
        self.tx.send_if_modified(|view| {
            if ticket.0 <= view.ranking_ticket {
                return false;
            }
            view.report = report;
            view.ranking_ticket = ticket.0;
            true
        })
    }

    /// Overwrite the cached voting switch. Returns whether it changed.
    pub fn set_voting_enabled(&self, enabled: bool) -> bool {
        self.tx.send_if_modified(|view| {
            let changed = view.voting_enabled != Some(enabled);
            view.voting_enabled = Some(enabled);
            changed
        })
    }

    pub fn record_action(&self, outcome: ActionOutcome) {
        self.tx.send_modify(|view| view.last_action = Some(outcome));
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}
