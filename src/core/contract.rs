//! Whitelist contract: interface descriptor + per-call handle
//!
//! The contract itself is external and opaque. This module only knows its ABI:
//!
//! | Function | Kind | Returns |
//! |----------|------|---------|
//! | `addAddressToWhitelist()` | write (signer) | - |
//! | `numAddressesWhitelisted()` | read | `uint8` |
//! | `maxWhitelistedAddresses()` | read | `uint8` |
//! | `whitelistedAddresses(address)` | read | `bool` |

use alloy_primitives::{Address, B256};
use alloy_sol_types::{sol, SolCall};
use std::rc::Rc;
use std::time::Duration;

use crate::core::rpc::{TransactionReceipt, TransactionRequest};
use crate::error::{DappError, DappResult};
use crate::provider::WalletProvider;
use crate::runtime;
use crate::session::Accessor;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IWhitelist {
        /// Adds the caller to the membership set
        function addAddressToWhitelist() external;

        /// Cardinality of the membership set
        function numAddressesWhitelisted() external view returns (uint8);

        /// Cap fixed at deployment
        function maxWhitelistedAddresses() external view returns (uint8);

        /// Membership test (public mapping getter)
        function whitelistedAddresses(address account) external view returns (bool);
    }
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// (address, interface, accessor). Cheap; build one per call.
pub struct WhitelistContract<'a> {
    address: Address,
    accessor: &'a Accessor,
}

impl<'a> WhitelistContract<'a> {
    pub fn new(address: Address, accessor: &'a Accessor) -> Self {
        Self { address, accessor }
    }

    async fn read<C: SolCall>(&self, call: C) -> DappResult<C::Return> {
        let data = self.accessor.provider().call(self.address, call.abi_encode().into()).await?;
        Ok(C::abi_decode_returns(&data, true)?)
    }

    pub async fn num_addresses_whitelisted(&self) -> DappResult<u64> {
        let ret = self.read(IWhitelist::numAddressesWhitelistedCall {}).await?;
        Ok(u64::from(ret._0))
    }

    pub async fn max_whitelisted_addresses(&self) -> DappResult<u64> {
        let ret = self.read(IWhitelist::maxWhitelistedAddressesCall {}).await?;
        Ok(u64::from(ret._0))
    }

    pub async fn whitelisted_addresses(&self, account: Address) -> DappResult<bool> {
        let ret = self.read(IWhitelist::whitelistedAddressesCall { account }).await?;
        Ok(ret._0)
    }

    /// Submits the write. Returns as soon as the wallet has broadcast it.
    pub async fn add_address_to_whitelist(&self) -> DappResult<PendingTransaction> {
        let signer = self.accessor.signer().ok_or(DappError::AuthorityRequired)?;
        let tx = TransactionRequest {
            from: signer.address(),
            to: self.address,
            data: IWhitelist::addAddressToWhitelistCall {}.abi_encode().into(),
        };
        let hash = signer.provider().send_transaction(tx).await?;
        tracing::debug!(%hash, "addAddressToWhitelist submitted");
        Ok(PendingTransaction::new(hash, signer.provider().clone()))
    }
}

/// A broadcast transaction whose finality has not been observed yet.
pub struct PendingTransaction {
    hash: B256,
    provider: Rc<dyn WalletProvider>,
    poll_interval: Duration,
}

impl PendingTransaction {
    pub fn new(hash: B256, provider: Rc<dyn WalletProvider>) -> Self {
        Self { hash, provider, poll_interval: DEFAULT_POLL_INTERVAL }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Polls for the receipt until mined. No timeout of its own.
    pub async fn confirmed(self) -> DappResult<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.provider.transaction_receipt(self.hash).await? {
                if !receipt.status {
                    return Err(DappError::ContractCall(format!("transaction {} reverted", self.hash)));
                }
                return Ok(receipt);
            }
            runtime::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockWallet;
    use crate::session::SessionCell;
    use alloy_sol_types::SolInterface;

    #[test]
    fn selectors_match_solidity_signatures() {
        assert_eq!(IWhitelist::addAddressToWhitelistCall::SIGNATURE, "addAddressToWhitelist()");
        assert_eq!(IWhitelist::numAddressesWhitelistedCall::SIGNATURE, "numAddressesWhitelisted()");
        assert_eq!(IWhitelist::whitelistedAddressesCall::SIGNATURE, "whitelistedAddresses(address)");
    }

    #[test]
    fn calldata_decodes_back_to_the_call() {
        let account = Address::repeat_byte(0x42);
        let data = IWhitelist::whitelistedAddressesCall { account }.abi_encode();
        let decoded = IWhitelist::IWhitelistCalls::abi_decode(&data, true).unwrap();
        assert_eq!(
            decoded,
            IWhitelist::IWhitelistCalls::whitelistedAddresses(IWhitelist::whitelistedAddressesCall { account })
        );
    }

    #[test]
    fn write_that_loses_the_last_slot_is_reported_as_reverted() {
        let contract = Address::repeat_byte(0xcc);
        let (a, b) = (Address::with_last_byte(1), Address::with_last_byte(2));
        let wallet = Rc::new(MockWallet::new(contract, 1).with_accounts(vec![a, b]));
        let provider: Rc<dyn WalletProvider> = wallet.clone();
        let session = futures::executor::block_on(SessionCell::new().get_or_connect(&provider)).unwrap();
        let as_a = session.accessor(true, 4);
        session.observe_account(b);
        let as_b = session.accessor(true, 4);

        // Both are accepted while the list is empty; only one can be included.
        let first = futures::executor::block_on(WhitelistContract::new(contract, &as_a).add_address_to_whitelist()).unwrap();
        let second = futures::executor::block_on(WhitelistContract::new(contract, &as_b).add_address_to_whitelist()).unwrap();

        assert!(futures::executor::block_on(first.confirmed()).unwrap().status);
        let err = futures::executor::block_on(second.confirmed()).unwrap_err();
        assert!(matches!(err, DappError::ContractCall(msg) if msg.contains("reverted")));
        assert_eq!(wallet.ledger().count(), 1);
    }
}
