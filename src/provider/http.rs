//! HTTP JSON-RPC transport (native) - talks to a dev node with unlocked accounts

use async_trait::async_trait;
use serde_json::Value;
use std::cell::Cell;

use super::{JsonRpcProvider, Transport};
use crate::core::rpc::{methods, RpcRequest, RpcResponse};
use crate::error::{DappError, DappResult};

/// Provider for a local node (Hardhat, Anvil, geth --dev).
pub type RpcProvider = JsonRpcProvider<HttpTransport>;

impl RpcProvider {
    pub fn connect_http(url: impl Into<String>) -> Self {
        JsonRpcProvider::new(HttpTransport::new(url))
    }
}

pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: Cell<u64>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new(), next_id: Cell::new(1) }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> DappResult<Value> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        tracing::debug!(id, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|e| DappError::ProviderUnavailable(format!("{}: {}", self.url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DappError::ProviderUnavailable(format!("{}: HTTP {}", self.url, status)));
        }
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| DappError::ContractCall(format!("rpc body: {}", e)))?;
        body.into_result()
    }

    // Dev nodes do not prompt; their accounts are already unlocked.
    fn accounts_method(&self) -> &'static str {
        methods::ACCOUNTS
    }
}
