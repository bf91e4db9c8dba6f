//! WhitelistPage: JS-facing wrapper around `Page`

use futures::StreamExt;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::config::{parse_address, DappConfig};
use crate::orchestrator::WhitelistDapp;
use crate::page::Page;
use crate::provider::{AlertNotifier, InjectedProvider};

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value.serialize(&serializer).map_err(js_error)
}

#[wasm_bindgen]
pub struct WhitelistPage {
    page: Page,
}

#[wasm_bindgen]
impl WhitelistPage {
    /// Binds to `window.ethereum`. Throws when no wallet is installed or the
    /// address does not parse; nothing is prompted until `load()`/`connectWallet()`.
    #[wasm_bindgen(constructor)]
    pub fn new(contract_address: &str, chain_id: Option<u32>) -> Result<WhitelistPage, JsValue> {
        let mut config = DappConfig::new(parse_address(contract_address).map_err(js_error)?);
        if let Some(id) = chain_id {
            config = config.with_chain_id(u64::from(id));
        }
        let provider = InjectedProvider::detect().map_err(|e| {
            tracing::error!(error = %e, "no injected wallet");
            js_error(e)
        })?;
        tracing::info!(contract = %config.contract_address, chain = config.target_chain_id(), "page created");
        let dapp = WhitelistDapp::new(config, Rc::new(provider), Rc::new(AlertNotifier));
        Ok(Self { page: Page::new(dapp) })
    }

    /// Call on mount: connects unless already connected.
    #[wasm_bindgen]
    pub async fn load(&self) -> bool {
        self.page.on_load().await
    }

    #[wasm_bindgen(js_name = "connectWallet")]
    pub async fn connect_wallet(&self) -> bool {
        self.page.on_connect_click().await
    }

    #[wasm_bindgen(js_name = "joinWhitelist")]
    pub async fn join_whitelist(&self) -> bool {
        self.page.on_join_click().await
    }

    #[wasm_bindgen]
    pub async fn refresh(&self) -> bool {
        self.page.on_refresh().await
    }

    /// `{walletConnected, joinedWhitelist, pending, whitelistedCount}`
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.page.dapp().state())
    }

    /// `{control, label, countLine}`
    #[wasm_bindgen]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_js(&self.page.view())
    }

    /// Calls `callback(view)` after every state change.
    #[wasm_bindgen(js_name = "onChange")]
    pub fn on_change(&self, callback: js_sys::Function) {
        let mut rx = self.page.dapp().subscribe();
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(state) = rx.next().await {
                if let Ok(view) = to_js(&state.view()) {
                    let _ = callback.call1(&JsValue::NULL, &view);
                }
            }
        });
    }
}
