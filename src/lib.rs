//! Whitelist dApp: connect a wallet, check the network, join an on-chain whitelist.
//!
//! # Architecture
//!
//! ```text
//! Page (error boundary: on_load, on_connect_click, on_join_click)
//!   │
//!   └── WhitelistDapp (orchestrator, UiState owner)
//!         │
//!         ├── SessionCell ──► Session (provider + account, prompted once)
//!         │                     └── Accessor::{Reader, Signer}
//!         │
//!         ├── WhitelistContract (IWhitelist ABI over an Accessor)
//!         │
//!         └── dyn WalletProvider
//!               ├── InjectedProvider (wasm: window.ethereum)
//!               ├── RpcProvider      (native: HTTP JSON-RPC dev node)
//!               └── MockWallet       (in-memory contract, tests)
//! ```
//!
//! # Operations
//!
//! | Operation | Method | Description |
//! |-----------|--------|-------------|
//! | connect | `dapp.connect()` | Prompt once, check network, refresh in background |
//! | accessor | `dapp.accessor(needs_authority)` | Reader or signer, network checked every call |
//! | join | `dapp.submit_membership_request()` | Send, wait for finality, mark joined |
//! | count | `dapp.refresh_count()` | `numAddressesWhitelisted()` |
//! | membership | `dapp.refresh_membership()` | `whitelistedAddresses(me)` |
//!
//! # Features
//!
//! - `native` - CLI against a JSON-RPC node (tokio, reqwest, clap)
//! - `wasm` - Browser page binding (window.ethereum, wasm-bindgen)
//!
//! # Usage
//!
//! ```ignore
//! use std::rc::Rc;
//! use whitelist_dapp::{DappConfig, Page, RpcProvider, StderrNotifier, WhitelistDapp};
//!
//! let config = DappConfig::from_env()?;
//! let provider = Rc::new(RpcProvider::connect_http(config.rpc_url.clone()));
//! let page = Page::new(WhitelistDapp::new(config, provider, Rc::new(StderrNotifier)));
//!
//! page.on_load().await;
//! println!("{}", page.view().label);
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod page;
pub mod provider;
pub mod runtime;
pub mod session;

#[cfg(any(feature = "native", feature = "wasm"))]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use config::DappConfig;
pub use core::contract::{PendingTransaction, WhitelistContract};
pub use core::network::Network;
pub use core::state::{Control, UiState, View};
pub use error::{DappError, DappResult};
pub use orchestrator::WhitelistDapp;
pub use page::Page;
pub use runtime::Spawner;
pub use provider::{MockWallet, Notifier, RecordingNotifier, StderrNotifier, WalletProvider};
pub use session::{Accessor, Session, SessionCell};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use provider::RpcProvider;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use provider::{AlertNotifier, InjectedProvider};
#[cfg(feature = "wasm")]
pub use wasm::WhitelistPage;
