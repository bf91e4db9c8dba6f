//! Runtime - single-threaded spawning and timers per platform
//!
//! `spawn_detached` needs a local executor: the JS event loop in the browser, a
//! `tokio::task::LocalSet` natively. Everything here is `!Send`. Code that cannot
//! promise a `LocalSet` runs its background work through `Spawner::Inline`.

use std::future::Future;
use std::time::Duration;

#[cfg(not(any(feature = "native", feature = "wasm")))]
compile_error!("enable either the `native` or the `wasm` feature");

/// How fire-and-forget work is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawner {
    /// Background task via `spawn_detached`. Natively this panics outside a `LocalSet`.
    Local,
    /// Awaited by the caller before it returns. Works under any executor.
    Inline,
}

/// `Local` in the browser, `Inline` natively.
impl Default for Spawner {
    fn default() -> Self {
        if cfg!(feature = "wasm") {
            Spawner::Local
        } else {
            Spawner::Inline
        }
    }
}

impl Spawner {
    pub async fn run<F>(self, fut: F)
    where
        F: Future<Output = ()> + 'static,
    {
        match self {
            Spawner::Local => spawn_detached(fut),
            Spawner::Inline => fut.await,
        }
    }
}

/// Run `fut` to completion in the background. Its output is discarded.
#[cfg(feature = "wasm")]
pub fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(fut);
}

#[cfg(all(feature = "native", not(feature = "wasm")))]
pub fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + 'static,
{
    drop(tokio::task::spawn_local(fut));
}

#[cfg(feature = "wasm")]
pub async fn sleep(duration: Duration) {
    let millis = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window()
            .ok_or(wasm_bindgen::JsValue::NULL)
            .and_then(|w| w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis));
        if scheduled.is_err() {
            // No window (worker): resolve immediately, the caller just polls again.
            let _ = resolve.call0(&wasm_bindgen::JsValue::UNDEFINED);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(all(feature = "native", not(feature = "wasm")))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
