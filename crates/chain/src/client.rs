//! JSON-RPC client for the ledger node.

use crate::error::ChainError;
use crate::types::{ScriptHash, TxId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// On-chain state of an account. Accounts the node has never seen report
/// zero for both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub balance: u64,
}

/// The two node operations the faucet needs. Implementations must not retry;
/// the caller decides what a failed attempt means.
#[async_trait]
pub trait LedgerNode: Send + Sync {
    /// Current nonce and balance for an account.
    async fn account_state(&self, account: &ScriptHash) -> Result<AccountState, ChainError>;

    /// Submit a fully signed transaction, returning the node-assigned id.
    async fn submit(&self, raw_tx: &[u8]) -> Result<TxId, ChainError>;
}

/// HTTP JSON-RPC 2.0 client. Every request is bounded by the timeout given
/// at construction; there is no retry layer.
pub struct HttpNodeClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl HttpNodeClient {
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpNodeClient { rpc_url, client })
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!("RPC call: {}", method);
        let response = self.client.post(&self.rpc_url).json(&payload).send().await?;
        let envelope: serde_json::Value = response.json().await?;
        extract_result(envelope)
    }
}

/// Pull the `result` member out of a JSON-RPC envelope, surfacing node-side
/// errors as [`ChainError::RpcNode`]. An envelope without a result resolves
/// to `Null`; callers decide whether that is acceptable.
fn extract_result(envelope: serde_json::Value) -> Result<serde_json::Value, ChainError> {
    if let Some(error) = envelope.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown node error")
            .to_string();
        return Err(ChainError::RpcNode { code, message });
    }

    Ok(envelope
        .get("result")
        .cloned()
        .unwrap_or(serde_json::Value::Null))
}

#[async_trait]
impl LedgerNode for HttpNodeClient {
    async fn account_state(&self, account: &ScriptHash) -> Result<AccountState, ChainError> {
        let result = self
            .call(
                "getaccountstate",
                serde_json::json!([account.to_address()]),
            )
            .await?;

        if result.is_null() {
            return Ok(AccountState::default());
        }
        serde_json::from_value(result)
            .map_err(|e| ChainError::RpcResponse(format!("bad account state: {}", e)))
    }

    async fn submit(&self, raw_tx: &[u8]) -> Result<TxId, ChainError> {
        let result = self
            .call(
                "sendrawtransaction",
                serde_json::json!([hex::encode(raw_tx)]),
            )
            .await?;

        let id = result
            .as_str()
            .ok_or_else(|| ChainError::RpcResponse("expected transaction id string".to_string()))?;
        Ok(TxId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_result_returns_result_member() {
        let envelope = serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {"nonce": 4}});
        let result = extract_result(envelope).unwrap();
        assert_eq!(result["nonce"], 4);
    }

    #[test]
    fn extract_result_surfaces_node_error() {
        let envelope = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "invalid params"}
        });

        match extract_result(envelope).unwrap_err() {
            ChainError::RpcNode { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "invalid params");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extract_result_tolerates_missing_result() {
        let envelope = serde_json::json!({"jsonrpc": "2.0", "id": 1});
        assert!(extract_result(envelope).unwrap().is_null());
    }

    #[test]
    fn account_state_parses_with_defaults() {
        let full: AccountState =
            serde_json::from_value(serde_json::json!({"nonce": 9, "balance": 5000})).unwrap();
        assert_eq!(full, AccountState { nonce: 9, balance: 5000 });

        let sparse: AccountState = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(sparse, AccountState::default());
    }
}
