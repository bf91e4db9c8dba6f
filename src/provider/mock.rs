//! MockWallet - in-memory wallet + simulated Whitelist contract
//!
//! Follows the deployed contract's rules: a cap fixed at construction, one entry per
//! address, and the two revert reasons below. Writes validate at submission (as a
//! dev node's gas estimation would) and apply when the receipt is first observed.
//!
//! Knobs cover the failure modes the orchestrator must survive: a rejected prompt,
//! a network switch, a failed submission, a failed finality wait, and a write that
//! mines without taking effect.

use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolInterface};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{Notifier, WalletProvider};
use crate::core::contract::IWhitelist::{self, IWhitelistCalls};
use crate::core::rpc::{TransactionReceipt, TransactionRequest};
use crate::error::{DappError, DappResult};

pub const ALREADY_WHITELISTED: &str = "Sender has already been whitelisted";
pub const LIMIT_REACHED: &str = "More addresses cant be added, limit reached";

/// The contract's observable state.
#[derive(Debug, Clone, Default)]
pub struct WhitelistLedger {
    pub cap: u8,
    pub members: Vec<Address>,
}

impl WhitelistLedger {
    pub fn new(cap: u8) -> Self {
        Self { cap, members: Vec::new() }
    }

    pub fn contains(&self, account: &Address) -> bool {
        self.members.contains(account)
    }

    pub fn count(&self) -> u8 {
        self.members.len() as u8
    }

    fn check_add(&self, account: &Address) -> DappResult<()> {
        if self.contains(account) {
            return Err(revert(ALREADY_WHITELISTED));
        }
        if self.count() >= self.cap {
            return Err(revert(LIMIT_REACHED));
        }
        Ok(())
    }
}

fn revert(reason: &str) -> DappError {
    DappError::ContractCall(format!("execution reverted: {}", reason))
}

struct MinedLater {
    from: Address,
    polls_left: u32,
    /// Block and status, once mined.
    mined: Option<(u64, bool)>,
}

pub struct MockWallet {
    contract: Address,
    chain_id: Cell<u64>,
    accounts: RefCell<Vec<Address>>,
    ledger: RefCell<WhitelistLedger>,
    txs: RefCell<HashMap<B256, MinedLater>>,
    nonce: Cell<u64>,
    block: Cell<u64>,
    // knobs
    reject_prompt: Cell<bool>,
    fail_submission: Cell<bool>,
    fail_confirmation: Cell<bool>,
    drop_writes: Cell<bool>,
    confirmation_polls: Cell<u32>,
    // counters
    prompts: Cell<u32>,
    network_checks: Cell<u32>,
    contract_calls: Cell<u32>,
}

impl MockWallet {
    /// Wallet on Rinkeby (chain 4) with one account `0x…01`, contract deployed with `cap`.
    pub fn new(contract: Address, cap: u8) -> Self {
        Self {
            contract,
            chain_id: Cell::new(4),
            accounts: RefCell::new(vec![Address::with_last_byte(1)]),
            ledger: RefCell::new(WhitelistLedger::new(cap)),
            txs: RefCell::new(HashMap::new()),
            nonce: Cell::new(0),
            block: Cell::new(1),
            reject_prompt: Cell::new(false),
            fail_submission: Cell::new(false),
            fail_confirmation: Cell::new(false),
            drop_writes: Cell::new(false),
            confirmation_polls: Cell::new(0),
            prompts: Cell::new(0),
            network_checks: Cell::new(0),
            contract_calls: Cell::new(0),
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.chain_id.set(chain_id);
        self
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        *self.accounts.borrow_mut() = accounts;
        self
    }

    pub fn with_members(self, members: impl IntoIterator<Item = Address>) -> Self {
        self.ledger.borrow_mut().members.extend(members);
        self
    }

    // -- knobs ----------------------------------------------------------------

    /// Simulates the user flipping networks in the extension.
    pub fn switch_chain(&self, chain_id: u64) {
        self.chain_id.set(chain_id);
    }

    /// Simulates the user picking another account in the extension. No prompt.
    pub fn switch_account(&self, account: Address) {
        *self.accounts.borrow_mut() = vec![account];
    }

    /// Locked wallets report no accounts until unlocked.
    pub fn lock(&self) {
        self.accounts.borrow_mut().clear();
    }

    pub fn set_reject_prompt(&self, reject: bool) {
        self.reject_prompt.set(reject);
    }

    pub fn set_fail_submission(&self, fail: bool) {
        self.fail_submission.set(fail);
    }

    pub fn set_fail_confirmation(&self, fail: bool) {
        self.fail_confirmation.set(fail);
    }

    /// Writes mine with status 1 but leave the ledger untouched.
    pub fn set_drop_writes(&self, drop: bool) {
        self.drop_writes.set(drop);
    }

    /// Number of receipt polls answered with "not mined yet".
    pub fn set_confirmation_polls(&self, polls: u32) {
        self.confirmation_polls.set(polls);
    }

    // -- observation ----------------------------------------------------------

    pub fn prompts(&self) -> u32 {
        self.prompts.get()
    }

    pub fn network_checks(&self) -> u32 {
        self.network_checks.get()
    }

    /// `eth_call` + `eth_sendTransaction` against any address.
    pub fn contract_calls(&self) -> u32 {
        self.contract_calls.get()
    }

    pub fn ledger(&self) -> WhitelistLedger {
        self.ledger.borrow().clone()
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    fn encode_read(&self, call: IWhitelistCalls) -> Vec<u8> {
        let ledger = self.ledger.borrow();
        match call {
            IWhitelistCalls::numAddressesWhitelisted(_) => {
                IWhitelist::numAddressesWhitelistedCall::abi_encode_returns(&(ledger.count(),))
            }
            IWhitelistCalls::maxWhitelistedAddresses(_) => {
                IWhitelist::maxWhitelistedAddressesCall::abi_encode_returns(&(ledger.cap,))
            }
            IWhitelistCalls::whitelistedAddresses(c) => {
                IWhitelist::whitelistedAddressesCall::abi_encode_returns(&(ledger.contains(&c.account),))
            }
            IWhitelistCalls::addAddressToWhitelist(_) => Vec::new(),
        }
    }

    /// Returns the block and the receipt status.
    fn mine(&self, hash: B256, from: Address) -> (u64, bool) {
        let block = self.block.get() + 1;
        self.block.set(block);
        let status = if self.drop_writes.get() {
            true
        } else {
            let mut ledger = self.ledger.borrow_mut();
            // Re-checked at inclusion: another write may have landed in between.
            match ledger.check_add(&from) {
                Ok(()) => {
                    ledger.members.push(from);
                    true
                }
                Err(_) => false,
            }
        };
        tracing::debug!(%hash, block, status, "mock: mined");
        (block, status)
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> DappResult<Vec<Address>> {
        self.prompts.set(self.prompts.get() + 1);
        if self.reject_prompt.get() {
            return Err(DappError::UserRejected);
        }
        Ok(self.accounts.borrow().clone())
    }

    async fn accounts(&self) -> DappResult<Vec<Address>> {
        Ok(self.accounts.borrow().clone())
    }

    async fn chain_id(&self) -> DappResult<u64> {
        self.network_checks.set(self.network_checks.get() + 1);
        Ok(self.chain_id.get())
    }

    async fn call(&self, to: Address, data: Bytes) -> DappResult<Bytes> {
        self.contract_calls.set(self.contract_calls.get() + 1);
        if to != self.contract {
            // Calling an address without code returns nothing.
            return Ok(Bytes::new());
        }
        let call = IWhitelistCalls::abi_decode(&data, true)?;
        Ok(self.encode_read(call).into())
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> DappResult<B256> {
        self.contract_calls.set(self.contract_calls.get() + 1);
        if self.fail_submission.get() {
            return Err(DappError::Rpc { code: -32603, message: "mock: submission failed".into() });
        }
        if !self.accounts.borrow().contains(&tx.from) {
            return Err(DappError::Rpc { code: 4100, message: format!("{} is not authorized", tx.from) });
        }
        if tx.to != self.contract {
            return Err(DappError::ContractCall(format!("no contract at {}", tx.to)));
        }
        match IWhitelistCalls::abi_decode(&tx.data, true)? {
            IWhitelistCalls::addAddressToWhitelist(_) => self.ledger.borrow().check_add(&tx.from)?,
            other => return Err(DappError::ContractCall(format!("mock: unexpected write {:?}", other))),
        }

        let nonce = self.nonce.get() + 1;
        self.nonce.set(nonce);
        let hash = keccak256(nonce.to_be_bytes());
        self.txs.borrow_mut().insert(
            hash,
            MinedLater { from: tx.from, polls_left: self.confirmation_polls.get(), mined: None },
        );
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> DappResult<Option<TransactionReceipt>> {
        if self.fail_confirmation.get() {
            return Err(DappError::ContractCall("mock: receipt lookup failed".into()));
        }
        let mut txs = self.txs.borrow_mut();
        let Some(tx) = txs.get_mut(&hash) else {
            return Ok(None);
        };
        if tx.polls_left > 0 {
            tx.polls_left -= 1;
            return Ok(None);
        }
        let (block, status) = match tx.mined {
            Some(mined) => mined,
            None => {
                let mined = self.mine(hash, tx.from);
                tx.mined = Some(mined);
                mined
            }
        };
        Ok(Some(TransactionReceipt { transaction_hash: hash, block_number: Some(block), status }))
    }
}

/// Notifier that records instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn ledger_enforces_cap_and_uniqueness() {
        let mut ledger = WhitelistLedger::new(1);
        let a = Address::with_last_byte(1);
        assert!(ledger.check_add(&a).is_ok());
        ledger.members.push(a);
        assert_eq!(ledger.check_add(&a), Err(revert(ALREADY_WHITELISTED)));
        assert_eq!(ledger.check_add(&Address::with_last_byte(2)), Err(revert(LIMIT_REACHED)));
    }

    #[test]
    fn write_applies_when_receipt_is_observed() {
        let contract = Address::repeat_byte(0xcc);
        let wallet = MockWallet::new(contract, 10);
        wallet.set_confirmation_polls(1);
        let from = Address::with_last_byte(1);
        let tx = TransactionRequest {
            from,
            to: contract,
            data: IWhitelist::addAddressToWhitelistCall {}.abi_encode().into(),
        };
        let hash = block_on(wallet.send_transaction(tx)).unwrap();
        assert_eq!(wallet.ledger().count(), 0);

        assert_eq!(block_on(wallet.transaction_receipt(hash)).unwrap(), None);
        let receipt = block_on(wallet.transaction_receipt(hash)).unwrap().unwrap();
        assert!(receipt.status);
        assert!(wallet.ledger().contains(&from));

        // Receipt lookups are stable once mined.
        let again = block_on(wallet.transaction_receipt(hash)).unwrap().unwrap();
        assert_eq!(again.block_number, receipt.block_number);
        assert_eq!(wallet.ledger().count(), 1);
    }

    #[test]
    fn write_losing_the_last_slot_mines_as_reverted() {
        let contract = Address::repeat_byte(0xcc);
        let (a, b) = (Address::with_last_byte(1), Address::with_last_byte(2));
        let wallet = MockWallet::new(contract, 1).with_accounts(vec![a, b]);
        let join = |from| TransactionRequest {
            from,
            to: contract,
            data: IWhitelist::addAddressToWhitelistCall {}.abi_encode().into(),
        };
        // Both pass the submission check while the list is still empty.
        let first = block_on(wallet.send_transaction(join(a))).unwrap();
        let second = block_on(wallet.send_transaction(join(b))).unwrap();

        assert!(block_on(wallet.transaction_receipt(first)).unwrap().unwrap().status);
        let reverted = block_on(wallet.transaction_receipt(second)).unwrap().unwrap();
        assert!(!reverted.status);
        assert_eq!(wallet.ledger().count(), 1);
        assert!(!wallet.ledger().contains(&b));
    }

    #[test]
    fn switched_account_is_visible_without_prompt() {
        let wallet = MockWallet::new(Address::repeat_byte(0xcc), 10);
        wallet.switch_account(Address::with_last_byte(2));
        assert_eq!(block_on(wallet.accounts()).unwrap(), vec![Address::with_last_byte(2)]);
        assert_eq!(wallet.prompts(), 0);
    }

    #[test]
    fn unauthorized_sender_cannot_submit() {
        let contract = Address::repeat_byte(0xcc);
        let wallet = MockWallet::new(contract, 10);
        let tx = TransactionRequest {
            from: Address::with_last_byte(9),
            to: contract,
            data: IWhitelist::addAddressToWhitelistCall {}.abi_encode().into(),
        };
        assert!(matches!(block_on(wallet.send_transaction(tx)), Err(DappError::Rpc { code: 4100, .. })));
    }
}
