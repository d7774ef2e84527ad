// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client for a Supra-compatible Move RPC node.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use url::Url;

use super::types::*;

/// VM status reported for a successful execution.
const VM_SUCCESS: &str = "Executed successfully";

/// Operations the token factory needs from a chain node.
///
/// `RpcClient` is the HTTP implementation. Tests substitute an in-memory
/// node through the same trait.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Account state, or `None` if the account does not exist.
    async fn account(&self, address: AccountAddress) -> Result<Option<AccountInfo>, ChainError>;

    /// Chain id to embed in raw transactions.
    async fn chain_id(&self) -> Result<u8, ChainError>;

    /// Dry-run a transaction. Fails with `SimulationRejected` when the VM
    /// would not execute it successfully.
    async fn simulate(&self, txn: &SignedTransaction) -> Result<Value, ChainError>;

    /// Submit a signed transaction and return its hash.
    async fn submit(&self, txn: &SignedTransaction) -> Result<String, ChainError>;

    /// Look up a submitted transaction.
    async fn transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, ChainError>;

    /// Call a view function and return its result values.
    async fn view(
        &self,
        function: &str,
        type_args: &[String],
        args: &[Value],
    ) -> Result<Vec<Value>, ChainError>;

    async fn account_exists(&self, address: AccountAddress) -> Result<bool, ChainError> {
        Ok(self.account(address).await?.is_some())
    }

    /// Current sequence number of `address`.
    async fn sequence_number(&self, address: AccountAddress) -> Result<u64, ChainError> {
        self.account(address)
            .await?
            .map(|info| info.sequence_number)
            .ok_or(ChainError::AccountNotFound(address))
    }
}

/// Transport settings for [`RpcClient`].
#[derive(Debug, Clone)]
pub struct RpcSettings {
    /// Per-request timeout
    pub timeout: Duration,
    /// Fixed chain id; fetched from the node when `None`
    pub chain_id: Option<u8>,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            chain_id: None,
        }
    }
}

/// HTTP client for one RPC endpoint.
pub struct RpcClient {
    base_url: Url,
    http: reqwest::Client,
    chain_id: OnceCell<u8>,
}

/// Submission body: the node expects signed Move transactions wrapped in a
/// `Move` variant.
#[derive(Serialize)]
enum RpcTransaction<'a> {
    Move(&'a SignedTransaction),
}

impl RpcClient {
    /// Create a client for the given RPC base URL.
    pub fn new(rpc_url: &str, settings: &RpcSettings) -> Result<Self, ChainError> {
        let mut base_url: Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(format!("{rpc_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ChainError::InvalidRpcUrl(format!(
                "{rpc_url}: unsupported scheme `{}`",
                base_url.scheme()
            )));
        }
        // Keep any path prefix when joining relative endpoints.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        let chain_id = match settings.chain_id {
            Some(id) => OnceCell::new_with(Some(id)),
            None => OnceCell::new(),
        };

        Ok(Self {
            base_url,
            http,
            chain_id,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChainError> {
        self.base_url
            .join(path)
            .map_err(|e| ChainError::InvalidRpcUrl(e.to_string()))
    }

    /// GET a JSON document. A 404 or a `null` body reads as `None`.
    async fn get_json(&self, path: &str) -> Result<Option<Value>, ChainError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "RPC GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value = read_json(response).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ChainError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "RPC POST");

        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ChainError::Transport(e.to_string()))?;

        read_json(response).await
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, ChainError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChainError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(ChainError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| ChainError::Decode(format!("{e}: {body}")))
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn account(&self, address: AccountAddress) -> Result<Option<AccountInfo>, ChainError> {
        let Some(value) = self.get_json(&format!("rpc/v1/accounts/{address}")).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ChainError::Decode(format!("account {address}: {e}")))
    }

    async fn chain_id(&self) -> Result<u8, ChainError> {
        self.chain_id
            .get_or_try_init(|| async {
                let value = self
                    .get_json("rpc/v1/transactions/chain_id")
                    .await?
                    .ok_or_else(|| ChainError::Decode("chain id endpoint returned nothing".into()))?;
                let id = value
                    .as_u64()
                    .or_else(|| value.get("id").and_then(Value::as_u64))
                    .ok_or_else(|| ChainError::Decode(format!("unexpected chain id: {value}")))?;
                u8::try_from(id).map_err(|_| ChainError::Decode(format!("chain id {id} out of range")))
            })
            .await
            .copied()
    }

    async fn simulate(&self, txn: &SignedTransaction) -> Result<Value, ChainError> {
        let output = self
            .post_json("rpc/v1/transactions/simulate", &RpcTransaction::Move(txn))
            .await?;

        if let Some(status) = vm_status(&output) {
            if status != VM_SUCCESS {
                return Err(ChainError::SimulationRejected(status));
            }
        }
        if let Some(status) = output.get("status").and_then(Value::as_str) {
            if status.eq_ignore_ascii_case("fail") || status.eq_ignore_ascii_case("invalid") {
                return Err(ChainError::SimulationRejected(output.to_string()));
            }
        }
        Ok(output)
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<String, ChainError> {
        let response = self
            .post_json("rpc/v1/transactions/submit", &RpcTransaction::Move(txn))
            .await?;

        match response {
            Value::String(hash) => Ok(hash),
            Value::Object(ref fields) => match fields.get("hash").and_then(Value::as_str) {
                Some(hash) => Ok(hash.to_string()),
                None => txn.committed_hash(),
            },
            _ => txn.committed_hash(),
        }
    }

    async fn transaction(&self, hash: &str) -> Result<Option<TransactionRecord>, ChainError> {
        Ok(self
            .get_json(&format!("rpc/v1/transactions/{hash}"))
            .await?
            .map(|raw| TransactionRecord::from_json(hash, raw)))
    }

    async fn view(
        &self,
        function: &str,
        type_args: &[String],
        args: &[Value],
    ) -> Result<Vec<Value>, ChainError> {
        let body = json!({
            "function": function,
            "type_arguments": type_args,
            "arguments": args,
        });
        let response = self.post_json("rpc/v1/view", &body).await?;

        match response {
            Value::Array(values) => Ok(values),
            Value::Object(mut fields) => match fields.remove("result") {
                Some(Value::Array(values)) => Ok(values),
                _ => Err(ChainError::Decode(format!(
                    "view {function}: missing `result` array"
                ))),
            },
            other => Err(ChainError::Decode(format!("view {function}: {other}"))),
        }
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    #[error("Account not found on chain: {0}")]
    AccountNotFound(AccountAddress),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("RPC error: {0}")]
    Transport(String),

    #[error("Node rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Transaction simulation rejected: {0}")]
    SimulationRejected(String),

    #[error("Transaction {hash} failed on chain: {vm_status}")]
    Aborted { hash: String, vm_status: String },

    #[error("Timed out waiting for transaction {0}; it may still be committed")]
    ConfirmationTimeout(String),

    #[error("Unexpected RPC response: {0}")]
    Decode(String),
}

impl ChainError {
    /// Whether the error came from submitting a transaction to the node
    /// (transport, simulation, execution, or confirmation).
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            ChainError::Transport(_)
                | ChainError::Rejected { .. }
                | ChainError::SimulationRejected(_)
                | ChainError::Aborted { .. }
                | ChainError::ConfirmationTimeout(_)
                | ChainError::Decode(_)
        )
    }
}
