//! Turing voting client core.
//!
//! The client keeps a local view of a token-weighted candidate vote in sync
//! with the contract behind a [`turing_gateway::LedgerGateway`]:
//! - Ranks candidates by balance with concurrent, failure-tolerant lookups
//! - Mirrors the remote voting switch
//! - Runs issue / vote / toggle actions through to a single terminal outcome
//! - Refreshes the ranking on remote vote-cast notifications

pub mod config;
pub mod error;
pub mod event_bridge;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod ranking;
pub mod session;
pub mod snapshot;
pub mod tracing_spans;
pub mod voting_state;

pub use config::ClientConfig;
pub use error::{ActionError, ClientError};
pub use event_bridge::{EventListenerBridge, Subscription};
pub use logging::{init_logging, LogFormat};
pub use metrics::ClientMetrics;
pub use orchestrator::{ActionOrchestrator, ActionReceipt};
pub use ranking::{RankingAggregator, RefreshTrigger};
pub use session::{ClientSession, SessionOptions};
pub use snapshot::{RefreshTicket, Snapshot, SnapshotView};
pub use voting_state::VotingStateSynchronizer;
