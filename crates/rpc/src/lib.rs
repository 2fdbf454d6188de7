// rpc/src/lib.rs
pub mod client;
pub mod transport;
pub mod types;

pub use client::{ChainClient, ChainSource};
pub use transport::{HttpTransport, RpcConfig};
pub use types::*;

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("No result came back for {0}")]
    EmptyResult(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },
}

impl RpcError {
    /// Errors raised before a response envelope was available
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Timeout(_))
    }
}

pub type RpcResult<T> = Result<T, RpcError>;
