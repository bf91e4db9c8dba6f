//! Session - one wallet connection per page lifetime
//!
//! The session is created at most once, by the first caller that needs it. The cell
//! holds an async mutex across the wallet prompt, so overlapping first calls share a
//! single prompt instead of racing two. Nothing replaces a session once stored; it
//! is dropped with its owner. The account inside it follows the wallet: whoever
//! acquires a signer re-reads it first.

use alloy_primitives::Address;
use futures::lock::Mutex;
use std::cell::Cell;
use std::rc::Rc;

use crate::error::{DappError, DappResult};
use crate::provider::WalletProvider;

struct SessionInner {
    provider: Rc<dyn WalletProvider>,
    account: Cell<Address>,
}

/// Handle to an authorized wallet connection.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    fn new(provider: Rc<dyn WalletProvider>, account: Address) -> Self {
        Self { inner: Rc::new(SessionInner { provider, account: Cell::new(account) }) }
    }

    pub fn provider(&self) -> &Rc<dyn WalletProvider> {
        &self.inner.provider
    }

    /// Account the wallet reported most recently.
    pub fn account(&self) -> Address {
        self.inner.account.get()
    }

    pub(crate) fn observe_account(&self, account: Address) {
        let previous = self.inner.account.replace(account);
        if previous != account {
            tracing::info!(%previous, %account, "wallet switched accounts");
        }
    }

    /// Build an accessor for a network id that has just been validated.
    pub fn accessor(&self, needs_authority: bool, chain_id: u64) -> Accessor {
        let provider = self.inner.provider.clone();
        if needs_authority {
            Accessor::Signer(Signer { provider, chain_id, address: self.account() })
        } else {
            Accessor::Reader(Reader { provider, chain_id })
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account())
            .finish()
    }
}

/// Lazily-initialized slot owning the page's session.
#[derive(Default)]
pub struct SessionCell {
    slot: Mutex<Option<Session>>,
}

impl SessionCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored session, prompting the wallet only if none exists yet.
    pub async fn get_or_connect(&self, provider: &Rc<dyn WalletProvider>) -> DappResult<Session> {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }
        tracing::info!("requesting wallet authorization");
        let accounts = provider.request_accounts().await?;
        let account = *accounts.first().ok_or(DappError::UserRejected)?;
        let session = Session::new(provider.clone(), account);
        tracing::info!(%account, "wallet session established");
        *slot = Some(session.clone());
        Ok(session)
    }

    /// The session if one exists and no connect is mid-prompt.
    pub fn current(&self) -> Option<Session> {
        self.slot.try_lock().and_then(|slot| slot.clone())
    }
}

/// Read-only handle: enough for `eth_call`.
#[derive(Clone)]
pub struct Reader {
    provider: Rc<dyn WalletProvider>,
    chain_id: u64,
}

/// Authority-bearing handle: can submit state-changing calls as `address`.
#[derive(Clone)]
pub struct Signer {
    provider: Rc<dyn WalletProvider>,
    chain_id: u64,
    address: Address,
}

impl Signer {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &Rc<dyn WalletProvider> {
        &self.provider
    }
}

#[derive(Clone)]
pub enum Accessor {
    Reader(Reader),
    Signer(Signer),
}

impl Accessor {
    pub fn provider(&self) -> &Rc<dyn WalletProvider> {
        match self {
            Accessor::Reader(r) => &r.provider,
            Accessor::Signer(s) => &s.provider,
        }
    }

    /// Network id validated when this accessor was handed out.
    pub fn chain_id(&self) -> u64 {
        match self {
            Accessor::Reader(r) => r.chain_id,
            Accessor::Signer(s) => s.chain_id,
        }
    }

    pub fn signer(&self) -> Option<&Signer> {
        match self {
            Accessor::Signer(s) => Some(s),
            Accessor::Reader(_) => None,
        }
    }

    pub fn is_signer(&self) -> bool {
        self.signer().is_some()
    }
}
