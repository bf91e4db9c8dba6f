//! UI-facing flags and the view derived from them

use serde::{Deserialize, Serialize};

/// Four independent flags, all derived from the session and contract reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub wallet_connected: bool,
    pub joined_whitelist: bool,
    pub pending: bool,
    pub whitelisted_count: u64,
}

/// The single control (or message) the page renders for a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Control {
    Connect,
    Join,
    Loading,
    Joined,
}

impl Control {
    pub fn label(&self) -> &'static str {
        match self {
            Control::Connect => "Connect your Wallet",
            Control::Join => "Join the Whitelist",
            Control::Loading => "Loading...",
            Control::Joined => "Thanks for joining the Whitelist!",
        }
    }

    /// Whether the control accepts clicks.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Control::Connect | Control::Join)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub control: Control,
    pub label: String,
    /// False while the control only displays progress or the final message.
    pub actionable: bool,
    pub count_line: String,
}

impl UiState {
    /// Joined takes precedence over pending; pending hides the join control.
    pub fn control(&self) -> Control {
        if !self.wallet_connected {
            Control::Connect
        } else if self.joined_whitelist {
            Control::Joined
        } else if self.pending {
            Control::Loading
        } else {
            Control::Join
        }
    }

    pub fn view(&self) -> View {
        let control = self.control();
        View {
            control,
            label: control.label().to_string(),
            actionable: control.is_actionable(),
            count_line: format!("{} have already joined the Whitelist", self.whitelisted_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_renders_connect() {
        let state = UiState::default();
        assert_eq!(state.control(), Control::Connect);
        assert_eq!(state.view().count_line, "0 have already joined the Whitelist");
    }

    #[test]
    fn control_follows_flag_precedence() {
        let connected = UiState { wallet_connected: true, ..Default::default() };
        assert_eq!(connected.control(), Control::Join);

        let pending = UiState { pending: true, ..connected };
        assert_eq!(pending.control(), Control::Loading);
        assert!(!pending.view().actionable);

        let joined = UiState { joined_whitelist: true, pending: true, ..connected };
        assert_eq!(joined.control(), Control::Joined);

        // Flags other than `wallet_connected` are ignored while disconnected
        let stale = UiState { joined_whitelist: true, whitelisted_count: 3, ..Default::default() };
        assert_eq!(stale.control(), Control::Connect);
        assert_eq!(stale.view().count_line, "3 have already joined the Whitelist");
    }

    #[test]
    fn state_serializes_camel_case() {
        let json = serde_json::to_value(UiState { whitelisted_count: 2, ..Default::default() }).unwrap();
        assert_eq!(json["whitelistedCount"], 2);
        assert_eq!(json["walletConnected"], false);
        let view = serde_json::to_value(UiState::default().view()).unwrap();
        assert_eq!(view["control"], "connect");
        assert_eq!(view["actionable"], true);
        assert_eq!(view["countLine"], "0 have already joined the Whitelist");
    }
}
