//! Page - the error boundary between the orchestrator and whatever renders it
//!
//! Handlers never return errors. Every failure stops at this layer and is logged;
//! the returned `bool` only says whether the action went through.

use crate::core::state::{Control, View};
use crate::error::DappResult;
use crate::orchestrator::WhitelistDapp;

#[derive(Clone)]
pub struct Page {
    dapp: WhitelistDapp,
}

impl Page {
    pub fn new(dapp: WhitelistDapp) -> Self {
        Self { dapp }
    }

    pub fn dapp(&self) -> &WhitelistDapp {
        &self.dapp
    }

    /// Auto-connect on mount when the wallet is not connected yet.
    pub async fn on_load(&self) -> bool {
        if self.dapp.state().wallet_connected {
            return true;
        }
        self.on_connect_click().await
    }

    pub async fn on_connect_click(&self) -> bool {
        report("connect wallet", self.dapp.connect().await)
    }

    /// Only acts while the join control is the one being shown.
    pub async fn on_join_click(&self) -> bool {
        let control = self.dapp.state().control();
        if control != Control::Join {
            tracing::debug!(?control, "join click ignored");
            return false;
        }
        report("join whitelist", self.dapp.submit_membership_request().await)
    }

    pub async fn on_refresh(&self) -> bool {
        report("refresh whitelist", self.dapp.refresh_membership_and_count().await)
    }

    pub fn view(&self) -> View {
        self.dapp.state().view()
    }
}

fn report<T>(action: &str, result: DappResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) if e.is_user_rejection() => {
            tracing::warn!(action, "user rejected the wallet request");
            false
        }
        Err(e) => {
            tracing::error!(action, error = %e, "action failed");
            false
        }
    }
}
