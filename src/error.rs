//! Error taxonomy for wallet, network, and contract failures

use thiserror::Error;

pub type DappResult<T> = Result<T, DappError>;

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DappError {
    /// Wallet is on a different network than the one the contract lives on
    #[error("wrong network: expected chain {expected}, wallet is on chain {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("user rejected the wallet request")]
    UserRejected,

    #[error("no wallet provider available: {0}")]
    ProviderUnavailable(String),

    /// RPC failure, reverted execution, or an undecodable return value
    #[error("contract call failed: {0}")]
    ContractCall(String),

    #[error("state-changing call requires a signer")]
    AuthorityRequired,

    #[error("a membership request is already in flight")]
    RequestInFlight,

    #[error("config: {0}")]
    Config(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl DappError {
    /// Map a JSON-RPC error object onto the taxonomy.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => DappError::UserRejected,
            // -32000 / 3: execution reverted (geth, hardhat)
            -32000 | -32603 | 3 => DappError::ContractCall(message),
            _ => DappError::Rpc { code, message },
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, DappError::UserRejected)
    }
}

impl From<alloy_sol_types::Error> for DappError {
    fn from(e: alloy_sol_types::Error) -> Self {
        DappError::ContractCall(format!("abi: {}", e))
    }
}

impl From<serde_json::Error> for DappError {
    fn from(e: serde_json::Error) -> Self {
        DappError::ContractCall(format!("json: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_codes_map_to_taxonomy() {
        assert_eq!(DappError::from_rpc(4001, "denied"), DappError::UserRejected);
        assert!(matches!(DappError::from_rpc(3, "execution reverted"), DappError::ContractCall(_)));
        assert_eq!(
            DappError::from_rpc(-32601, "method not found"),
            DappError::Rpc { code: -32601, message: "method not found".into() }
        );
    }

    #[test]
    fn wrong_network_message_names_both_chains() {
        let e = DappError::WrongNetwork { expected: 4, actual: 1 };
        assert_eq!(e.to_string(), "wrong network: expected chain 4, wallet is on chain 1");
        assert!(!e.is_user_rejection());
    }
}
