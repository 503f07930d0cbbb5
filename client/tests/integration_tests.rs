//! End-to-end tests of a client session over the in-memory contract:
//! connect → rank → act → re-synchronize → observe.

use std::sync::Arc;
use std::time::Duration;

use turing_client::{ActionError, ClientSession, SessionOptions};
use turing_nullables::{GatewayCall, NullGateway};
use turing_types::{CandidateRegistry, RankingStatus, TokenAmount, TuringError};

fn tokens(n: u64) -> TokenAmount {
    TokenAmount::from_tokens(n)
}

fn registry(names: &[&str]) -> CandidateRegistry {
    CandidateRegistry::new(names).unwrap()
}

async fn connect(gateway: &Arc<NullGateway>, names: &[&str]) -> ClientSession<NullGateway> {
    ClientSession::connect(Arc::clone(gateway), SessionOptions::new(registry(names)))
        .await
        .unwrap()
}

fn ranked(session: &ClientSession<NullGateway>) -> Vec<String> {
    session
        .view()
        .ranking()
        .iter()
        .map(|e| e.name.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unregistered_candidate_is_left_out_of_ranking() {
    let gateway = Arc::new(NullGateway::with_candidates(&[
        ("nome1", 4),
        ("nome2", 8),
        ("nome4", 2),
    ]));
    let session = connect(&gateway, &["nome1", "nome2", "nome3", "nome4"]).await;

    let view = session.view();
    assert_eq!(ranked(&session), vec!["nome2", "nome1", "nome4"]);
    assert_eq!(view.report.status, RankingStatus::Partial);
    let unresolved: Vec<_> = view.report.unresolved().map(|n| n.as_str()).collect();
    assert_eq!(unresolved, vec!["nome3"]);
    assert_eq!(view.report.lookup_failures(), 0);
}

#[tokio::test]
async fn every_lookup_failing_yields_empty_ranking_not_error() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2)]));
    gateway.fail_lookup("a", "connection reset");
    gateway.fail_balance("b", "timeout");
    let session = connect(&gateway, &["a", "b"]).await;

    let report = session.refresh_ranking().await;
    assert!(report.ranking.is_empty());
    assert_eq!(report.status, RankingStatus::AggregateEmpty);
    assert_eq!(report.lookup_failures(), 2);
}

#[tokio::test]
async fn empty_registry_is_distinct_from_everything_failing() {
    let gateway = Arc::new(NullGateway::new());
    let session = connect(&gateway, &[]).await;
    assert_eq!(session.view().report.status, RankingStatus::NoCandidates);
}

#[tokio::test]
async fn equal_balances_keep_registry_order_on_every_refresh() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("A", 30), ("B", 10), ("C", 30)]));
    let session = connect(&gateway, &["A", "B", "C"]).await;

    for _ in 0..10 {
        let report = session.refresh_ranking().await;
        let names: Vec<_> = report.ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
    }
}

#[tokio::test]
async fn subset_ranking_is_not_published() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2), ("c", 3)]));
    let session = connect(&gateway, &["a", "b", "c"]).await;
    let before = session.view();

    let subset = session.registry().subset(["a", "c"]).unwrap();
    let report = session.compute_ranking(&subset).await;
    let names: Vec<_> = report.ranking.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a"]);
    assert_eq!(session.view(), before);
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn issuing_tokens_reorders_the_leaderboard() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("nome1", 5), ("nome2", 10)]));
    let session = connect(&gateway, &["nome1", "nome2"]).await;
    assert_eq!(ranked(&session), vec!["nome2", "nome1"]);

    session.issue_tokens("nome1", tokens(20)).await.unwrap();
    assert_eq!(ranked(&session), vec!["nome1", "nome2"]);
    assert_eq!(session.view().ranking().balance_of("nome1"), Some(tokens(25)));
}

#[tokio::test]
async fn zero_amount_issue_fails_before_any_remote_call() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("nome1", 5)]));
    let session = connect(&gateway, &["nome1"]).await;
    gateway.reset_calls();

    let err = session
        .issue_tokens("nome1", "0".parse().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Validation(TuringError::NonPositiveAmount));
    assert_eq!(gateway.submissions(), 0);
    assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 0);
}

#[tokio::test]
async fn vote_is_refused_locally_while_voting_is_off() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("nome1", 5)]));
    gateway.set_remote_voting(false);
    let session = connect(&gateway, &["nome1"]).await;
    assert_eq!(session.view().voting_enabled, Some(false));
    gateway.reset_calls();

    let err = session.cast_vote("nome1", tokens(1)).await.unwrap_err();
    assert_eq!(err, ActionError::VotingDisabled);
    assert_eq!(gateway.calls(GatewayCall::CastVote), 0);
    assert_eq!(gateway.calls(GatewayCall::IsVotingEnabled), 0);
}

#[tokio::test]
async fn toggle_off_then_vote_is_refused_without_remote_call() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("nome1", 5)]));
    let session = connect(&gateway, &["nome1"]).await;
    assert_eq!(session.view().voting_enabled, Some(true));

    let receipt = session.toggle_voting().await.unwrap();
    assert_eq!(receipt.message(), "voting disabled");
    assert_eq!(session.view().voting_enabled, Some(false));
    gateway.reset_calls();

    let err = session.cast_vote("nome1", tokens(1)).await.unwrap_err();
    assert_eq!(err, ActionError::VotingDisabled);
    assert_eq!(gateway.submissions(), 0);
}

#[tokio::test]
async fn rejected_vote_leaves_ranking_and_switch_untouched() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 3), ("b", 9)]));
    let session = connect(&gateway, &["a", "b"]).await;
    let before = session.view();
    gateway.reject_submissions(Some("insufficient balance"));

    let err = session.cast_vote("a", tokens(1)).await.unwrap_err();
    assert_eq!(err, ActionError::Rejected("insufficient balance".into()));

    let after = session.view();
    assert_eq!(after.report, before.report);
    assert_eq!(after.ranking_ticket, before.ranking_ticket);
    assert_eq!(after.voting_enabled, before.voting_enabled);
    let outcome = after.last_action.unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.message, "rejected by contract: insufficient balance");
}

#[tokio::test]
async fn stale_switch_is_reconciled_by_forced_refresh() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 3)]));
    let session = connect(&gateway, &["a"]).await;
    gateway.set_remote_voting(false);

    // The cache still says "on", so the contract gets to refuse.
    let err = session.cast_vote("a", tokens(1)).await.unwrap_err();
    assert_eq!(err, ActionError::Rejected("voting is closed".into()));
    assert_eq!(session.view().voting_enabled, Some(true));

    assert_eq!(session.refresh_voting_enabled().await, Ok(false));
    let err = session.cast_vote("a", tokens(1)).await.unwrap_err();
    assert_eq!(err, ActionError::VotingDisabled);
}

#[tokio::test]
async fn unreachable_ledger_is_reported_as_gateway_failure() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 3)]));
    gateway.fail_voting_read(Some("connection refused"));
    let session = connect(&gateway, &["a"]).await;

    let err = session.cast_vote("a", tokens(1)).await.unwrap_err();
    assert!(matches!(err, ActionError::Gateway(_)));
    assert!(!err.is_local());
    assert_eq!(gateway.submissions(), 0);
}

// ---------------------------------------------------------------------------
// Vote-cast notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn external_vote_triggers_exactly_one_refresh() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2), ("c", 3)]));
    let session = connect(&gateway, &["a", "b", "c"]).await;
    let mut changes = session.watch();
    changes.borrow_and_update();
    gateway.reset_calls();

    gateway.set_balance("a", tokens(50));
    gateway.emit_vote_cast();

    tokio::time::timeout(Duration::from_secs(1), changes.changed())
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 3);
    assert_eq!(ranked(&session), vec!["a", "c", "b"]);
    assert_eq!(gateway.submissions(), 0);
}

#[tokio::test]
async fn own_vote_is_reflected_after_confirmation() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2)]));
    let session = connect(&gateway, &["a", "b"]).await;

    let receipt = session.cast_vote("a", tokens(4)).await.unwrap();
    let ranking = &receipt.ranking.as_ref().unwrap().ranking;
    assert_eq!(ranking.balance_of("a"), Some(tokens(5)));
    assert_eq!(receipt.message(), "vote of 4.0 TUR for a recorded");

    // The contract's own notification for this vote triggers one more refresh;
    // whichever publishes last, the ranking is the same.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(ranked(&session), vec!["a", "b"]);
}

#[tokio::test]
async fn closed_session_ignores_later_notifications() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1)]));
    let session = connect(&gateway, &["a"]).await;
    session.close().await;
    assert_eq!(gateway.open_subscriptions(), 0);

    gateway.reset_calls();
    gateway.emit_vote_cast();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(gateway.calls(GatewayCall::ResolveAccount), 0);
}

#[tokio::test]
async fn coalesced_burst_still_refreshes_after_last_notification() {
    let gateway = Arc::new(NullGateway::with_candidates(&[("a", 1), ("b", 2)]));
    let options = SessionOptions::new(registry(&["a", "b"]))
        .with_coalesce_window(Duration::from_millis(30));
    let session = ClientSession::connect(Arc::clone(&gateway), options)
        .await
        .unwrap();
    gateway.reset_calls();

    for n in 0..4 {
        gateway.set_balance("a", tokens(10 + n));
        gateway.emit_vote_cast();
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let refreshes = gateway.calls(GatewayCall::ResolveAccount) / 2;
    assert!((1..4).contains(&refreshes), "refreshes = {refreshes}");
    assert_eq!(session.view().ranking().balance_of("a"), Some(tokens(13)));
}
