//! WASM module: the whitelist page in the browser
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        WhitelistPage (JS API)           │
//! │  load, connectWallet, joinWhitelist,    │
//! │  state, view, onChange                  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │        Page (error boundary)            │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │        WhitelistDapp (orchestrator)     │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │  InjectedProvider (window.ethereum)     │
//! │  AlertNotifier (window.alert)           │
//! └─────────────────────────────────────────┘
//! ```

mod page;

pub use page::WhitelistPage;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    crate::logging::init_console_logging();
}
