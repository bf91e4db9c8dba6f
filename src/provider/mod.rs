//! Wallet providers - the seam between the orchestrator and an actual wallet
//!
//! ```text
//! WalletProvider (trait, async, single-threaded)
//!     │
//!     ├── JsonRpcProvider<T: Transport>   eth_* methods over any JSON transport
//!     │       ├── HttpTransport           native: reqwest → dev node (unlocked accounts)
//!     │       └── InjectedTransport       wasm: window.ethereum.request(...)
//!     │
//!     └── MockWallet                      in-memory chain + Whitelist ledger (tests)
//! ```
//!
//! `Notifier` is the blocking user-notification seam (`window.alert` in the browser).

pub mod mock;
#[cfg(feature = "native")]
mod http;
#[cfg(feature = "wasm")]
mod injected;

pub use mock::{MockWallet, RecordingNotifier};
#[cfg(feature = "native")]
pub use http::{HttpTransport, RpcProvider};
#[cfg(feature = "wasm")]
pub use injected::{AlertNotifier, InjectedProvider, InjectedTransport};

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::Cell;

use crate::core::rpc::{self, methods, TransactionReceipt, TransactionRequest};
use crate::error::{DappError, DappResult};

#[async_trait(?Send)]
pub trait WalletProvider {
    /// Ask the wallet to authorize this page. May prompt the user.
    async fn request_accounts(&self) -> DappResult<Vec<Address>>;
    /// Accounts authorized right now, without prompting. The user can switch them at any time.
    async fn accounts(&self) -> DappResult<Vec<Address>>;
    /// Network the wallet is currently on. Can change at any time.
    async fn chain_id(&self) -> DappResult<u64>;
    /// Read-only call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> DappResult<Bytes>;
    /// Sign and submit. Returns once the wallet has broadcast the transaction.
    async fn send_transaction(&self, tx: TransactionRequest) -> DappResult<B256>;
    /// `None` until the transaction is mined.
    async fn transaction_receipt(&self, hash: B256) -> DappResult<Option<TransactionReceipt>>;
}

/// Synchronous, blocking notification shown to the user.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Notifier for headless runs: the message goes to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(%message, "alert");
        eprintln!("{}", message);
    }
}

/// A JSON request/response channel speaking the eth_* namespace.
#[async_trait(?Send)]
pub trait Transport {
    async fn request(&self, method: &str, params: Value) -> DappResult<Value>;

    /// Method used to obtain accounts. Dev nodes have no prompt, only `eth_accounts`.
    fn accounts_method(&self) -> &'static str {
        methods::REQUEST_ACCOUNTS
    }
}

/// EIP-1193 style provider over any `Transport`.
pub struct JsonRpcProvider<T> {
    transport: T,
    account_index: Cell<usize>,
}

impl<T: Transport> JsonRpcProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, account_index: Cell::new(0) }
    }

    /// Pick which of the wallet's accounts is authorized (dev nodes expose many).
    pub fn with_account_index(self, index: usize) -> Self {
        self.account_index.set(index);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn select_accounts(&self, value: Value) -> DappResult<Vec<Address>> {
        let mut accounts = rpc::addresses_from_value(value)?;
        if accounts.is_empty() {
            return Err(DappError::UserRejected);
        }
        let index = self.account_index.get();
        if index > 0 {
            if index >= accounts.len() {
                return Err(DappError::Config(format!(
                    "account index {} out of range ({} accounts)",
                    index,
                    accounts.len()
                )));
            }
            accounts.rotate_left(index);
        }
        Ok(accounts)
    }
}

#[async_trait(?Send)]
impl<T: Transport> WalletProvider for JsonRpcProvider<T> {
    async fn request_accounts(&self) -> DappResult<Vec<Address>> {
        let value = self.transport.request(self.transport.accounts_method(), json!([])).await?;
        self.select_accounts(value)
    }

    async fn accounts(&self) -> DappResult<Vec<Address>> {
        let value = self.transport.request(methods::ACCOUNTS, json!([])).await?;
        self.select_accounts(value)
    }

    async fn chain_id(&self) -> DappResult<u64> {
        let value = self.transport.request(methods::CHAIN_ID, json!([])).await?;
        rpc::quantity_from_value(&value)
    }

    async fn call(&self, to: Address, data: Bytes) -> DappResult<Bytes> {
        let value = self.transport.request(methods::CALL, rpc::call_params(to, &data)).await?;
        rpc::bytes_from_value(value)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> DappResult<B256> {
        let value = self.transport.request(methods::SEND_TRANSACTION, rpc::send_params(&tx)).await?;
        rpc::hash_from_value(value)
    }

    async fn transaction_receipt(&self, hash: B256) -> DappResult<Option<TransactionReceipt>> {
        let value = self.transport.request(methods::TRANSACTION_RECEIPT, json!([hash])).await?;
        TransactionReceipt::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records the methods asked for.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<DappResult<Value>>>,
        seen: RefCell<Vec<(String, Value)>>,
    }

    impl Scripted {
        fn push(&self, response: DappResult<Value>) {
            self.responses.borrow_mut().push_back(response);
        }
    }

    #[async_trait(?Send)]
    impl Transport for Scripted {
        async fn request(&self, method: &str, params: Value) -> DappResult<Value> {
            self.seen.borrow_mut().push((method.to_string(), params));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(DappError::ProviderUnavailable("script exhausted".into())))
        }
    }

    const A: Address = address!("0x00000000000000000000000000000000000000aa");
    const B: Address = address!("0x00000000000000000000000000000000000000bb");

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn accounts_are_requested_and_rotated_by_index() {
        let provider = JsonRpcProvider::new(Scripted::default()).with_account_index(1);
        provider.transport().push(Ok(json!([A, B])));
        let accounts = block_on(provider.request_accounts()).unwrap();
        assert_eq!(accounts, vec![B, A]);
        assert_eq!(provider.transport().seen.borrow()[0].0, methods::REQUEST_ACCOUNTS);
    }

    #[test]
    fn current_accounts_use_eth_accounts() {
        let provider = JsonRpcProvider::new(Scripted::default()).with_account_index(1);
        provider.transport().push(Ok(json!([A, B])));
        assert_eq!(block_on(provider.accounts()).unwrap(), vec![B, A]);
        assert_eq!(provider.transport().seen.borrow()[0].0, methods::ACCOUNTS);
    }

    #[test]
    fn empty_account_list_is_a_rejection() {
        let provider = JsonRpcProvider::new(Scripted::default());
        provider.transport().push(Ok(json!([])));
        assert_eq!(block_on(provider.request_accounts()).unwrap_err(), DappError::UserRejected);
    }

    #[test]
    fn account_index_out_of_range_is_config_error() {
        let provider = JsonRpcProvider::new(Scripted::default()).with_account_index(5);
        provider.transport().push(Ok(json!([A])));
        assert!(matches!(block_on(provider.request_accounts()), Err(DappError::Config(_))));
    }

    #[test]
    fn chain_id_and_call_are_decoded() {
        let provider = JsonRpcProvider::new(Scripted::default());
        provider.transport().push(Ok(json!("0x4")));
        provider.transport().push(Ok(json!("0x01")));
        assert_eq!(block_on(provider.chain_id()).unwrap(), 4);
        let out = block_on(provider.call(A, Bytes::from(vec![0x12]))).unwrap();
        assert_eq!(out.as_ref(), &[0x01]);
        let seen = provider.transport().seen.borrow();
        assert_eq!(seen[1].0, methods::CALL);
        assert_eq!(seen[1].1[0]["data"], "0x12");
    }

    #[test]
    fn pending_receipt_is_none() {
        let provider = JsonRpcProvider::new(Scripted::default());
        provider.transport().push(Ok(Value::Null));
        assert_eq!(block_on(provider.transaction_receipt(B256::ZERO)).unwrap(), None);
    }
}
