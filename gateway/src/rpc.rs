//! JSON-RPC transport for the voting contract.
//!
//! Reads and submissions go over HTTP as `{"action": <name>, ...params}`;
//! the node answers `{"result": ...}` or `{"error": "<reason>"}`.
//! Vote-cast notifications arrive over a WebSocket subscription.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use turing_types::{CandidateAccount, CandidateName, TokenAmount, VoteCast};

use crate::error::GatewayError;
use crate::stream::VoteCastStream;
use crate::{Confirmation, LedgerGateway, Submission};

/// Queue depth between the WebSocket reader and the subscriber.
const NOTIFICATION_BUFFER: usize = 64;

/// Connection settings for [`RpcGateway`].
#[derive(Clone, Debug)]
pub struct RpcGatewayConfig {
    /// HTTP JSON-RPC endpoint, e.g. `http://127.0.0.1:8545`.
    pub rpc_url: String,
    /// WebSocket endpoint for notifications, e.g. `ws://127.0.0.1:8546`.
    pub ws_url: String,
    /// Address of the deployed voting contract.
    pub contract_address: String,
    /// Caller account sent as `from` on submissions.
    pub account: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// How often to poll for a receipt while awaiting confirmation.
    pub confirmation_poll_interval: Duration,
    /// Give up waiting for a receipt after this long.
    pub confirmation_timeout: Duration,
}

impl Default for RpcGatewayConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            ws_url: "ws://127.0.0.1:8546".into(),
            contract_address: "0x5fbdb2315678afecb367f032d93f642f64180aa3".into(),
            account: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            confirmation_poll_interval: Duration::from_millis(500),
            confirmation_timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP + WebSocket gateway to a node fronting the voting contract.
#[derive(Clone)]
pub struct RpcGateway {
    http: reqwest::Client,
    config: RpcGatewayConfig,
}

#[derive(Debug, Deserialize)]
struct SubmitResult {
    tx_hash: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptResult {
    status: ReceiptStatus,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ReceiptStatus {
    Pending,
    Confirmed,
    Reverted,
}

impl RpcGateway {
    pub fn new(config: RpcGatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RpcGatewayConfig {
        &self.config
    }

    /// Send one JSON-RPC request and return its `result` field.
    async fn rpc_call(&self, action: &str, params: Value) -> Result<Value, GatewayError> {
        let mut body = params;
        let object = body
            .as_object_mut()
            .ok_or_else(|| GatewayError::InvalidResponse("params must be a JSON object".into()))?;
        object.insert("action".into(), json!(action));
        object.insert("contract".into(), json!(self.config.contract_address));

        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(format!("request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::Transport(format!(
                "node returned HTTP {}",
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("invalid JSON response: {e}")))?;

        if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
            return Err(GatewayError::Remote(err.to_string()));
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{action}: missing result")))
    }

    /// Submit a state-changing call; a node-side error is a contract rejection.
    async fn submit(&self, action: &str, mut params: Value) -> Result<Submission, GatewayError> {
        if let (Some(from), Some(object)) = (&self.config.account, params.as_object_mut()) {
            object.insert("from".into(), json!(from));
        }
        let result = self.rpc_call(action, params).await.map_err(|e| match e {
            GatewayError::Remote(reason) => GatewayError::Rejected(reason),
            other => other,
        })?;
        let submitted: SubmitResult = serde_json::from_value(result)
            .map_err(|e| GatewayError::InvalidResponse(format!("{action}: {e}")))?;
        tracing::debug!(action, tx_hash = %submitted.tx_hash, "submitted");
        Ok(Submission {
            tx_hash: submitted.tx_hash,
        })
    }
}

fn parse_raw_amount(value: &Value) -> Result<TokenAmount, GatewayError> {
    let raw = match value {
        Value::String(s) => s
            .parse::<u128>()
            .map_err(|e| GatewayError::InvalidResponse(format!("balance {s:?}: {e}")))?,
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| GatewayError::InvalidResponse(format!("balance {n} is not a raw amount")))?,
        other => {
            return Err(GatewayError::InvalidResponse(format!(
                "unexpected balance value {other}"
            )))
        }
    };
    Ok(TokenAmount::new(raw))
}

/// Decode one WebSocket text frame into a notification, ignoring other events.
fn parse_vote_cast(text: &str) -> Option<VoteCast> {
    let frame: Value = serde_json::from_str(text).ok()?;
    if frame.get("event").and_then(Value::as_str) != Some("VoteCast") {
        return None;
    }
    let voter = frame
        .get("voter")
        .and_then(Value::as_str)
        .and_then(|s| CandidateAccount::parse(s).ok());
    Some(VoteCast { voter })
}

impl LedgerGateway for RpcGateway {
    async fn resolve_account(
        &self,
        name: &CandidateName,
    ) -> Result<Option<CandidateAccount>, GatewayError> {
        let result = self
            .rpc_call("codinome", json!({ "codinome": name.as_str() }))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("codinome: {result}")))?;
        let account = CandidateAccount::parse(raw)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok((!account.is_zero()).then_some(account))
    }

    async fn balance_of(&self, account: &CandidateAccount) -> Result<TokenAmount, GatewayError> {
        let result = self
            .rpc_call("balance_of", json!({ "account": account.as_str() }))
            .await?;
        parse_raw_amount(&result)
    }

    async fn issue_tokens(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> Result<Submission, GatewayError> {
        self.submit(
            "issue_token",
            json!({ "codinome": name.as_str(), "amount": amount.raw().to_string() }),
        )
        .await
    }

    async fn cast_vote(
        &self,
        name: &CandidateName,
        amount: TokenAmount,
    ) -> Result<Submission, GatewayError> {
        self.submit(
            "vote",
            json!({ "codinome": name.as_str(), "amount": amount.raw().to_string() }),
        )
        .await
    }

    async fn is_voting_enabled(&self) -> Result<bool, GatewayError> {
        let result = self.rpc_call("voting_active", json!({})).await?;
        result
            .as_bool()
            .ok_or_else(|| GatewayError::InvalidResponse(format!("voting_active: {result}")))
    }

    async fn set_voting_enabled(&self, enabled: bool) -> Result<Submission, GatewayError> {
        let action = if enabled { "voting_on" } else { "voting_off" };
        self.submit(action, json!({})).await
    }

    async fn await_confirmation(
        &self,
        submission: &Submission,
    ) -> Result<Confirmation, GatewayError> {
        let wait = async {
            loop {
                let result = self
                    .rpc_call("tx_receipt", json!({ "tx_hash": submission.tx_hash }))
                    .await?;
                let receipt: ReceiptResult = serde_json::from_value(result)
                    .map_err(|e| GatewayError::InvalidResponse(format!("tx_receipt: {e}")))?;
                match receipt.status {
                    ReceiptStatus::Confirmed => {
                        return Ok(Confirmation {
                            tx_hash: submission.tx_hash.clone(),
                            detail: receipt.detail,
                        })
                    }
                    ReceiptStatus::Reverted => {
                        return Err(GatewayError::Rejected(
                            receipt.detail.unwrap_or_else(|| "transaction reverted".into()),
                        ))
                    }
                    ReceiptStatus::Pending => {
                        tokio::time::sleep(self.config.confirmation_poll_interval).await;
                    }
                }
            }
        };
        tokio::time::timeout(self.config.confirmation_timeout, wait)
            .await
            .map_err(|_| GatewayError::Timeout)?
    }

    async fn subscribe_vote_cast(&self) -> Result<VoteCastStream, GatewayError> {
        let (mut socket, _) = tokio_tungstenite::connect_async(self.config.ws_url.as_str())
            .await
            .map_err(|e| GatewayError::Subscription(format!("connect failed: {e}")))?;

        let request = json!({
            "subscribe": "VoteCast",
            "contract": self.config.contract_address,
        });
        socket
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| GatewayError::Subscription(format!("subscribe failed: {e}")))?;

        let (tx, stream) = VoteCastStream::channel(NOTIFICATION_BUFFER);
        let feeder = tokio::spawn(async move {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let Some(event) = parse_vote_cast(&text) else {
                            tracing::trace!(frame = %text, "ignoring notification");
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "vote-cast subscription failed");
                        break;
                    }
                }
            }
            tracing::debug!("vote-cast subscription closed");
        });

        Ok(stream.with_feeder(feeder))
    }

    fn name(&self) -> &str {
        "json-rpc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_creation_with_defaults() {
        let gateway = RpcGateway::new(RpcGatewayConfig::default()).unwrap();
        assert_eq!(gateway.name(), "json-rpc");
        assert_eq!(gateway.config().rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn raw_amount_accepts_strings_and_numbers() {
        assert_eq!(
            parse_raw_amount(&json!("30000000000000000000")).unwrap(),
            TokenAmount::from_tokens(30)
        );
        assert_eq!(parse_raw_amount(&json!(7)).unwrap(), TokenAmount::new(7));
        assert!(parse_raw_amount(&json!("-1")).is_err());
        assert!(parse_raw_amount(&json!(true)).is_err());
    }

    #[test]
    fn vote_cast_frames_are_decoded() {
        let event = parse_vote_cast(
            r#"{"event":"VoteCast","voter":"0x5fbdb2315678afecb367f032d93f642f64180aa3"}"#,
        )
        .unwrap();
        assert_eq!(
            event.voter.unwrap().as_str(),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );

        assert_eq!(parse_vote_cast(r#"{"event":"VoteCast"}"#), Some(VoteCast { voter: None }));
        assert_eq!(parse_vote_cast(r#"{"event":"Transfer"}"#), None);
        assert_eq!(parse_vote_cast("not json"), None);
    }

    #[test]
    fn receipt_status_deserialization() {
        let receipt: ReceiptResult =
            serde_json::from_str(r#"{"status":"reverted","detail":"voting is closed"}"#).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Reverted);
        assert_eq!(receipt.detail.as_deref(), Some("voting is closed"));

        let pending: ReceiptResult = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(pending.status, ReceiptStatus::Pending);
        assert_eq!(pending.detail, None);
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let gateway = RpcGateway::new(RpcGatewayConfig {
            rpc_url: "http://127.0.0.1:9".into(),
            connect_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();
        let err = gateway.is_voting_enabled().await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_) | GatewayError::Timeout));
    }
}
