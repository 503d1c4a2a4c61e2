//! JSON-RPC transport to the external ledger.

use crate::AnchorError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// The two remote calls the anchor needs.
///
/// Implemented over HTTP by [`RpcClient`]; tests substitute in-process fakes.
pub trait AnchorTransport: Send + Sync {
    /// Current network reference value (base58 blockhash).
    fn latest_blockhash(&self) -> Result<String, AnchorError>;

    /// Submit a base64-encoded signed transaction, returning its confirmation id.
    fn send_transaction(&self, wire_base64: &str) -> Result<String, AnchorError>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
}

/// Blocking HTTP JSON-RPC client.
pub struct RpcClient {
    agent: ureq::Agent,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, AnchorError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| AnchorError::Transport(format!("{method}: {e}")))?;
        let envelope: RpcEnvelope<T> = resp
            .into_json()
            .map_err(|e| AnchorError::MalformedResponse(format!("{method}: {e}")))?;
        unwrap_envelope(method, envelope)
    }
}

fn unwrap_envelope<T>(method: &str, envelope: RpcEnvelope<T>) -> Result<T, AnchorError> {
    if let Some(err) = envelope.error {
        return Err(AnchorError::Rejected {
            code: err.code,
            message: err.message,
        });
    }
    envelope
        .result
        .ok_or_else(|| AnchorError::MalformedResponse(format!("{method}: missing result")))
}

impl AnchorTransport for RpcClient {
    fn latest_blockhash(&self) -> Result<String, AnchorError> {
        let value: ContextValue<BlockhashValue> =
            self.call("getLatestBlockhash", json!([{ "commitment": "finalized" }]))?;
        Ok(value.value.blockhash)
    }

    fn send_transaction(&self, wire_base64: &str) -> Result<String, AnchorError> {
        self.call(
            "sendTransaction",
            json!([wire_base64, { "encoding": "base64" }]),
        )
    }
}
