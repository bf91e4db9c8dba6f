//! Injected provider (wasm) - EIP-1193 `window.ethereum`

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::{JsonRpcProvider, Notifier, Transport};
use crate::error::{DappError, DappResult};

pub type InjectedProvider = JsonRpcProvider<InjectedTransport>;

impl InjectedProvider {
    /// Fails with `ProviderUnavailable` when no wallet extension injected itself.
    pub fn detect() -> DappResult<Self> {
        Ok(JsonRpcProvider::new(InjectedTransport::detect()?))
    }
}

pub struct InjectedTransport {
    ethereum: Object,
}

#[derive(Serialize)]
struct RequestArgs<'a> {
    method: &'a str,
    params: &'a Value,
}

impl InjectedTransport {
    pub fn detect() -> DappResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| DappError::ProviderUnavailable("no window".into()))?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum"))
            .map_err(|_| DappError::ProviderUnavailable("window.ethereum unreadable".into()))?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return Err(DappError::ProviderUnavailable("window.ethereum not found".into()));
        }
        Ok(Self { ethereum: ethereum.unchecked_into() })
    }
}

#[async_trait(?Send)]
impl Transport for InjectedTransport {
    async fn request(&self, method: &str, params: Value) -> DappResult<Value> {
        tracing::debug!(method, "ethereum.request");
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let args = RequestArgs { method, params: &params }
            .serialize(&serializer)
            .map_err(|e| DappError::ContractCall(format!("encode {}: {}", method, e)))?;

        let request: Function = Reflect::get(&self.ethereum, &JsValue::from_str("request"))
            .ok()
            .and_then(|f| f.dyn_into().ok())
            .ok_or_else(|| DappError::ProviderUnavailable("ethereum.request missing".into()))?;
        let promise: Promise = request
            .call1(&self.ethereum, &args)
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| DappError::ProviderUnavailable("ethereum.request did not return a promise".into()))?;

        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|e| DappError::ContractCall(format!("decode {}: {}", method, e)))
    }
}

/// Wallet errors are `{code, message, data?}` objects.
fn js_error(err: JsValue) -> DappError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|v| v.as_f64())
        .map(|c| c as i64);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    match code {
        Some(code) => DappError::from_rpc(code, message),
        None => DappError::ContractCall(message),
    }
}

/// `window.alert` - blocks until dismissed.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertNotifier;

impl Notifier for AlertNotifier {
    fn alert(&self, message: &str) {
        match web_sys::window() {
            Some(window) => {
                let _ = window.alert_with_message(message);
            }
            None => tracing::warn!(%message, "alert without window"),
        }
    }
}
