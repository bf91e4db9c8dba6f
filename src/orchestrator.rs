//! WhitelistDapp - wallet session + contract read/write orchestration
//!
//! # Operations
//!
//! | Operation | Accessor | Effect on `UiState` |
//! |-----------|----------|---------------------|
//! | `connect()` | reader | `wallet_connected = true`, then background refresh |
//! | `accessor(needs_authority)` | - | none (validates network every time, re-reads the account for a signer) |
//! | `submit_membership_request()` | signer | `pending` ↑ … ↓, count refreshed, `joined_whitelist = true` |
//! | `refresh_membership_and_count()` | reader + signer | `whitelisted_count`, `joined_whitelist` |
//!
//! # Flow
//!
//! ```text
//! connect ──► SessionCell (prompt once) ──► chain id == target? ──► connected
//!                                               │ no                    │
//!                                               ▼                       ▼ Spawner
//!                                       alert + WrongNetwork   refresh_membership_and_count
//!
//! submit ──► single-flight ──► signer ──► addAddressToWhitelist ──► pending = true
//!                                                                      │ finality
//!                                                                      ▼
//!                                   joined = true ◄── refresh count ◄── pending = false
//! ```
//!
//! After a confirmed write, `joined_whitelist` is set without re-reading membership.
//! `pending` is lowered on every exit path once raised, including a failed finality
//! wait. A second submit while one is in flight fails with `RequestInFlight`.

use alloy_primitives::B256;
use futures::channel::mpsc;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::DappConfig;
use crate::core::contract::WhitelistContract;
use crate::core::state::UiState;
use crate::error::{DappError, DappResult};
use crate::provider::{Notifier, WalletProvider};
use crate::runtime::Spawner;
use crate::session::{Accessor, Session, SessionCell, Signer};

struct Inner {
    config: DappConfig,
    provider: Rc<dyn WalletProvider>,
    notifier: Rc<dyn Notifier>,
    session: SessionCell,
    state: RefCell<UiState>,
    in_flight: Cell<bool>,
    spawner: Cell<Spawner>,
    watchers: RefCell<Vec<mpsc::UnboundedSender<UiState>>>,
}

/// Page-lifetime orchestrator. Clones share the same session and state.
#[derive(Clone)]
pub struct WhitelistDapp {
    inner: Rc<Inner>,
}

impl WhitelistDapp {
    pub fn new(config: DappConfig, provider: Rc<dyn WalletProvider>, notifier: Rc<dyn Notifier>) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                provider,
                notifier,
                session: SessionCell::new(),
                state: RefCell::new(UiState::default()),
                in_flight: Cell::new(false),
                spawner: Cell::new(Spawner::default()),
                watchers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Where the refresh after `connect()` runs. `Spawner::Local` needs a `LocalSet` natively.
    pub fn with_spawner(self, spawner: Spawner) -> Self {
        self.inner.spawner.set(spawner);
        self
    }

    pub fn config(&self) -> &DappConfig {
        &self.inner.config
    }

    /// Snapshot of the four UI flags.
    pub fn state(&self) -> UiState {
        *self.inner.state.borrow()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.session.current()
    }

    /// Receives a snapshot after every state change.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<UiState> {
        let (tx, rx) = mpsc::unbounded();
        self.inner.watchers.borrow_mut().push(tx);
        rx
    }

    fn update(&self, f: impl FnOnce(&mut UiState)) {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            let before = *state;
            f(&mut *state);
            if *state == before {
                return;
            }
            *state
        };
        tracing::debug!(?snapshot, "ui state changed");
        self.inner
            .watchers
            .borrow_mut()
            .retain(|tx| tx.unbounded_send(snapshot).is_ok());
    }

    fn contract<'a>(&self, accessor: &'a Accessor) -> WhitelistContract<'a> {
        WhitelistContract::new(self.inner.config.contract_address, accessor)
    }

    // =========================================================================
    // connect / accessor
    // =========================================================================

    /// Authorize the wallet (prompting at most once per page) and check its network.
    pub async fn connect(&self) -> DappResult<()> {
        self.accessor(false).await?;
        self.update(|s| s.wallet_connected = true);

        let this = self.clone();
        self.inner
            .spawner
            .get()
            .run(async move {
                if let Err(e) = this.refresh_membership_and_count().await {
                    tracing::error!(error = %e, "refresh after connect failed");
                }
            })
            .await;
        Ok(())
    }

    /// Reader by default, signer when `needs_authority`. The wallet can switch networks
    /// and accounts behind our back, so the chain id is checked on every call and a
    /// signer is built from the account authorized right now.
    pub async fn accessor(&self, needs_authority: bool) -> DappResult<Accessor> {
        let session = self.inner.session.get_or_connect(&self.inner.provider).await?;
        let chain_id = self.validate_network(&session).await?;
        if needs_authority {
            self.refresh_account(&session).await?;
        }
        Ok(session.accessor(needs_authority, chain_id))
    }

    /// No prompt: an empty list means the wallet locked or revoked access.
    async fn refresh_account(&self, session: &Session) -> DappResult<()> {
        let accounts = session.provider().accounts().await?;
        let account = *accounts.first().ok_or(DappError::UserRejected)?;
        session.observe_account(account);
        Ok(())
    }

    async fn validate_network(&self, session: &Session) -> DappResult<u64> {
        let actual = session.provider().chain_id().await?;
        let target = self.inner.config.target_network;
        let expected = target.chain_id();
        if actual != expected {
            tracing::warn!(expected, actual, "wallet is on the wrong network");
            // Blocking: the user sees this before the error propagates.
            self.inner.notifier.alert(&target.switch_prompt());
            return Err(DappError::WrongNetwork { expected, actual });
        }
        Ok(actual)
    }

    // =========================================================================
    // write
    // =========================================================================

    /// Add the connected address to the whitelist and wait for it to be mined.
    pub async fn submit_membership_request(&self) -> DappResult<B256> {
        let _flight = FlightGuard::acquire(&self.inner.in_flight)?;

        let signer = self.accessor(true).await?;
        let pending_tx = self
            .contract(&signer)
            .add_address_to_whitelist()
            .await?
            .with_poll_interval(self.inner.config.poll_interval);
        let hash = pending_tx.hash();

        let receipt = {
            let _pending = PendingGuard::raise(self);
            pending_tx.confirmed().await?
        };
        tracing::info!(%hash, block = ?receipt.block_number, "joined whitelist");

        if let Err(e) = self.refresh_count().await {
            tracing::error!(error = %e, "count refresh after join failed");
        }
        self.update(|s| s.joined_whitelist = true);
        Ok(hash)
    }

    // =========================================================================
    // reads
    // =========================================================================

    pub async fn refresh_count(&self) -> DappResult<u64> {
        let reader = self.accessor(false).await?;
        let count = self.contract(&reader).num_addresses_whitelisted().await?;
        self.update(|s| s.whitelisted_count = count);
        Ok(count)
    }

    /// Needs a signer only to learn the current address; nothing is signed.
    pub async fn refresh_membership(&self) -> DappResult<bool> {
        let signer = self.accessor(true).await?;
        let address = signer.signer().map(Signer::address).ok_or(DappError::AuthorityRequired)?;
        let joined = self.contract(&signer).whitelisted_addresses(address).await?;
        self.update(|s| s.joined_whitelist = joined);
        Ok(joined)
    }

    /// Both reads run concurrently; each applies its own result.
    pub async fn refresh_membership_and_count(&self) -> DappResult<UiState> {
        let (joined, count) = futures::join!(self.refresh_membership(), self.refresh_count());
        joined?;
        count?;
        Ok(self.state())
    }

    /// Cap fixed at deployment. Not part of `UiState`.
    pub async fn whitelist_cap(&self) -> DappResult<u64> {
        let reader = self.accessor(false).await?;
        self.contract(&reader).max_whitelisted_addresses().await
    }
}

/// Holds the single-flight slot for a membership request.
struct FlightGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> DappResult<Self> {
        if flag.replace(true) {
            return Err(DappError::RequestInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// `pending = true` while alive.
struct PendingGuard<'a> {
    dapp: &'a WhitelistDapp,
}

impl<'a> PendingGuard<'a> {
    fn raise(dapp: &'a WhitelistDapp) -> Self {
        dapp.update(|s| s.pending = true);
        Self { dapp }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.dapp.update(|s| s.pending = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockWallet, RecordingNotifier};
    use alloy_primitives::Address;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    fn dapp(wallet: &Rc<MockWallet>) -> WhitelistDapp {
        let config = DappConfig::new(wallet.contract());
        WhitelistDapp::new(config, wallet.clone(), Rc::new(RecordingNotifier::new()))
    }

    #[test]
    fn flight_guard_is_exclusive_until_dropped() {
        let flag = Cell::new(false);
        let guard = FlightGuard::acquire(&flag).unwrap();
        assert!(matches!(FlightGuard::acquire(&flag), Err(DappError::RequestInFlight)));
        drop(guard);
        assert!(FlightGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn pending_guard_lowers_on_drop() {
        let wallet = Rc::new(MockWallet::new(Address::repeat_byte(0xcc), 10));
        let dapp = dapp(&wallet);
        {
            let _guard = PendingGuard::raise(&dapp);
            assert!(dapp.state().pending);
        }
        assert!(!dapp.state().pending);
    }

    #[test]
    fn subscribers_see_only_changes() {
        let wallet = Rc::new(MockWallet::new(Address::repeat_byte(0xcc), 10).with_members([Address::with_last_byte(7)]));
        let dapp = dapp(&wallet);
        let mut rx = dapp.subscribe();

        block_on(dapp.refresh_count()).unwrap();
        block_on(dapp.refresh_count()).unwrap();

        let first = rx.try_next().unwrap().unwrap();
        assert_eq!(first.whitelisted_count, 1);
        // Second refresh changed nothing, so nothing was sent.
        assert!(rx.try_next().is_err());
    }

    #[test]
    fn connect_without_local_set_refreshes_inline() {
        let wallet = Rc::new(MockWallet::new(Address::repeat_byte(0xcc), 10).with_members([Address::with_last_byte(1)]));
        let dapp = dapp(&wallet);

        block_on(dapp.connect()).unwrap();
        let state = dapp.state();
        assert!(state.wallet_connected);
        assert!(state.joined_whitelist);
        assert_eq!(state.whitelisted_count, 1);
    }

    #[test]
    fn cap_is_read_from_the_contract() {
        let wallet = Rc::new(MockWallet::new(Address::repeat_byte(0xcc), 10));
        let dapp = dapp(&wallet);
        assert_eq!(block_on(dapp.whitelist_cap()).unwrap(), 10);
    }
}
