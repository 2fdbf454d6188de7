// rpc/src/types.rs
use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<serde_json::Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Vec<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    /// Echoed correlation id (null when the server could not parse the request)
    #[serde(default)]
    pub id: serde_json::Value,
    /// `null` and absent both decode to `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Block selector accepted by the block accessors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockId {
    Number(blockchain_core::BlockNumber),
    Hash(String),
}

impl std::str::FromStr for BlockId {
    type Err = std::num::ParseIntError;

    /// `0x`-prefixed 32-byte values are hashes, anything else a decimal height
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") && s.len() == 66 {
            Ok(BlockId::Hash(s.to_string()))
        } else {
            s.parse().map(BlockId::Number)
        }
    }
}
