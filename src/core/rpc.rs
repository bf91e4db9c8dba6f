//! JSON-RPC shapes shared by every provider (EIP-1193 / eth_* namespace)

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{Revert, SolError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DappError, DappResult};

pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_result(self) -> DappResult<Value> {
        if let Some(err) = self.error {
            return Err(err.into_error());
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Converts to a `DappError`, decoding an `Error(string)` revert payload when present.
    pub fn into_error(self) -> DappError {
        let reason = self
            .data
            .as_ref()
            .and_then(revert_payload)
            .and_then(|bytes| <Revert as SolError>::abi_decode(&bytes, true).ok())
            .map(|revert| revert.reason);
        match reason {
            Some(reason) => DappError::ContractCall(format!("{}: {}", self.message, reason)),
            None => DappError::from_rpc(self.code, self.message),
        }
    }
}

// Nodes put revert data either directly in `data` or under `data.data`.
fn revert_payload(data: &Value) -> Option<Vec<u8>> {
    let hex_str = data
        .as_str()
        .or_else(|| data.get("data").and_then(|v| v.as_str()))?;
    alloy_primitives::hex::decode(hex_str).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// `true` when execution succeeded (status 0x1)
    pub status: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl TransactionReceipt {
    /// `null` means "not mined yet".
    pub fn from_value(value: Value) -> DappResult<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt = serde_json::from_value(value)?;
        let block_number = raw.block_number.as_deref().map(parse_quantity).transpose()?;
        // Pre-Byzantium receipts carry no status; treat them as successful.
        let status = match raw.status.as_deref() {
            Some(s) => parse_quantity(s)? == 1,
            None => true,
        };
        Ok(Some(Self { transaction_hash: raw.transaction_hash, block_number, status }))
    }
}

/// Parses a hex quantity (`"0x4"`).
pub fn parse_quantity(value: &str) -> DappResult<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| DappError::ContractCall(format!("not a hex quantity: {}", value)))?;
    if digits.is_empty() {
        return Err(DappError::ContractCall("empty quantity".into()));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| DappError::ContractCall(format!("quantity {}: {}", value, e)))
}

/// Accepts hex strings and plain JSON numbers; some wallets report chain ids as numbers.
pub fn quantity_from_value(value: &Value) -> DappResult<u64> {
    match value {
        Value::String(s) => parse_quantity(s),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| DappError::ContractCall(format!("not a quantity: {}", n))),
        other => Err(DappError::ContractCall(format!("not a quantity: {}", other))),
    }
}

pub fn call_params(to: Address, data: &Bytes) -> Value {
    json!([{ "to": to, "data": data }, "latest"])
}

pub fn send_params(tx: &TransactionRequest) -> Value {
    json!([tx])
}

pub fn addresses_from_value(value: Value) -> DappResult<Vec<Address>> {
    Ok(serde_json::from_value(value)?)
}

pub fn bytes_from_value(value: Value) -> DappResult<Bytes> {
    Ok(serde_json::from_value(value)?)
}

pub fn hash_from_value(value: Value) -> DappResult<B256> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn quantities_parse_hex_and_numbers() {
        assert_eq!(parse_quantity("0x4").unwrap(), 4);
        assert_eq!(parse_quantity("0x7a69").unwrap(), 31_337);
        assert!(parse_quantity("4").is_err());
        assert!(parse_quantity("0x").is_err());
        assert_eq!(quantity_from_value(&json!(5)).unwrap(), 5);
        assert_eq!(quantity_from_value(&json!("0x1")).unwrap(), 1);
        assert!(quantity_from_value(&json!(true)).is_err());
    }

    #[test]
    fn null_receipt_means_not_mined() {
        assert_eq!(TransactionReceipt::from_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn receipt_status_is_decoded() {
        let hash = B256::repeat_byte(0xab);
        let ok = TransactionReceipt::from_value(json!({
            "transactionHash": hash,
            "blockNumber": "0x10",
            "status": "0x1",
        }))
        .unwrap()
        .unwrap();
        assert!(ok.status);
        assert_eq!(ok.block_number, Some(16));

        let reverted = TransactionReceipt::from_value(json!({
            "transactionHash": hash,
            "blockNumber": "0x11",
            "status": "0x0",
        }))
        .unwrap()
        .unwrap();
        assert!(!reverted.status);
    }

    #[test]
    fn error_objects_map_user_rejection_and_reverts() {
        let rejected: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": 4001, "message": "User rejected the request."}
        }))
        .unwrap();
        assert_eq!(rejected.into_result().unwrap_err(), DappError::UserRejected);

        // Error(string) selector 0x08c379a0 wrapping "Sender has already been whitelisted"
        let payload = Revert { reason: "Sender has already been whitelisted".into() };
        let encoded = payload.abi_encode();
        let reverted = RpcErrorObject {
            code: 3,
            message: "execution reverted".into(),
            data: Some(json!(alloy_primitives::hex::encode_prefixed(encoded))),
        };
        assert_eq!(
            reverted.into_error(),
            DappError::ContractCall("execution reverted: Sender has already been whitelisted".into())
        );
    }

    #[test]
    fn call_params_target_latest_block() {
        let to = address!("0x1111111111111111111111111111111111111111");
        let params = call_params(to, &Bytes::from(vec![0xde, 0xad]));
        assert_eq!(params[1], "latest");
        assert_eq!(params[0]["data"], "0xdead");
    }
}
