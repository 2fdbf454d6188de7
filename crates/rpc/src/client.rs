// rpc/src/client.rs
use crate::{BlockId, HttpTransport, RpcConfig, RpcError, RpcResult};
use async_trait::async_trait;
use blockchain_core::quantity::{decode_quantity, encode_block_number};
use blockchain_core::{BlockNumber, BlockSummary, BlockWithTransactions, Transaction};
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::ops::RangeInclusive;

/// Block source the sync engine pulls from
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current head height
    async fn block_number(&self) -> RpcResult<BlockNumber>;

    /// Block at `number` with embedded transactions
    async fn block_with_transactions(&self, number: BlockNumber) -> RpcResult<BlockWithTransactions>;

    /// Full blocks for `range` with up to `concurrency` requests in flight.
    ///
    /// Items come out in ascending height order regardless of completion
    /// order, each paired with the height it was requested for.
    fn blocks_with_transactions(
        &self,
        range: RangeInclusive<BlockNumber>,
        concurrency: usize,
    ) -> BoxStream<'_, (BlockNumber, RpcResult<BlockWithTransactions>)> {
        stream::iter(range)
            .map(move |number| async move { (number, self.block_with_transactions(number).await) })
            .buffered(concurrency.max(1))
            .boxed()
    }
}

/// Typed accessors over the node's JSON-RPC methods
pub struct ChainClient {
    transport: HttpTransport,
    config: RpcConfig,
}

impl ChainClient {
    pub fn new(config: RpcConfig) -> RpcResult<Self> {
        let transport = HttpTransport::new(&config)?;
        tracing::debug!("RPC client targeting {}", transport.endpoint());
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    // ==================== BLOCKS ====================

    pub async fn block_by_number(&self, number: BlockNumber) -> RpcResult<BlockSummary> {
        self.fetch("eth_getBlockByNumber", vec![json!(encode_block_number(number)), json!(false)])
            .await
    }

    pub async fn block_by_number_with_transactions(
        &self,
        number: BlockNumber,
    ) -> RpcResult<BlockWithTransactions> {
        self.fetch("eth_getBlockByNumber", vec![json!(encode_block_number(number)), json!(true)])
            .await
    }

    pub async fn block_by_hash(&self, hash: &str) -> RpcResult<BlockSummary> {
        self.fetch("eth_getBlockByHash", vec![json!(hash), json!(false)]).await
    }

    pub async fn block_by_hash_with_transactions(
        &self,
        hash: &str,
    ) -> RpcResult<BlockWithTransactions> {
        self.fetch("eth_getBlockByHash", vec![json!(hash), json!(true)]).await
    }

    pub async fn block(&self, id: &BlockId) -> RpcResult<BlockSummary> {
        match id {
            BlockId::Number(number) => self.block_by_number(*number).await,
            BlockId::Hash(hash) => self.block_by_hash(hash).await,
        }
    }

    pub async fn block_with_transactions_by_id(
        &self,
        id: &BlockId,
    ) -> RpcResult<BlockWithTransactions> {
        match id {
            BlockId::Number(number) => self.block_by_number_with_transactions(*number).await,
            BlockId::Hash(hash) => self.block_by_hash_with_transactions(hash).await,
        }
    }

    /// Current head height (`eth_blockNumber`)
    pub async fn block_number(&self) -> RpcResult<BlockNumber> {
        let result = self.transport.call("eth_blockNumber", vec![]).await?;
        decode_hex_result("eth_blockNumber", &result)
    }

    /// The `n` most recent blocks, newest first.
    ///
    /// The head is probed once; the window does not move if the chain grows
    /// while the blocks are fetched, and it stops at genesis.
    pub async fn latest_blocks(&self, n: u64) -> RpcResult<Vec<BlockSummary>> {
        let head = self.block_number().await?;
        let mut blocks = Vec::new();
        for number in latest_window(head, n) {
            blocks.push(self.block_by_number(number).await?);
        }
        Ok(blocks)
    }

    /// Same window as [`ChainClient::latest_blocks`], with transactions
    pub async fn latest_blocks_with_transactions(
        &self,
        n: u64,
    ) -> RpcResult<Vec<BlockWithTransactions>> {
        let head = self.block_number().await?;
        let mut blocks = Vec::new();
        for number in latest_window(head, n) {
            blocks.push(self.block_by_number_with_transactions(number).await?);
        }
        Ok(blocks)
    }

    // ==================== TRANSACTIONS ====================

    pub async fn transaction_by_hash(&self, hash: &str) -> RpcResult<Transaction> {
        self.fetch("eth_getTransactionByHash", vec![json!(hash)]).await
    }

    // ==================== VALIDATORS ====================

    /// Validator addresses at height `number` (`istanbul_getValidators`)
    pub async fn validators_by_number(&self, number: BlockNumber) -> RpcResult<Vec<String>> {
        self.validators("istanbul_getValidators", json!(encode_block_number(number)))
            .await
    }

    /// Validator addresses at block `hash` (`istanbul_getValidatorsAtHash`)
    pub async fn validators_by_hash(&self, hash: &str) -> RpcResult<Vec<String>> {
        self.validators("istanbul_getValidatorsAtHash", json!(hash)).await
    }

    pub async fn validators_at(&self, id: &BlockId) -> RpcResult<Vec<String>> {
        match id {
            BlockId::Number(number) => self.validators_by_number(*number).await,
            BlockId::Hash(hash) => self.validators_by_hash(hash).await,
        }
    }

    // ==================== CHAIN ====================

    pub async fn chain_id(&self) -> RpcResult<u64> {
        let result = self.transport.call("eth_chainId", vec![]).await?;
        decode_hex_result("eth_chainId", &result)
    }

    /// Compare the node's chain id against the configured one, if any
    pub async fn verify_chain_id(&self) -> RpcResult<()> {
        let Some(expected) = self.config.chain_id else {
            return Ok(());
        };

        let actual = self.chain_id().await?;
        if actual != expected {
            return Err(RpcError::ChainIdMismatch { expected, actual });
        }

        tracing::info!("Connected to chain {}", actual);
        Ok(())
    }

    async fn validators(&self, method: &str, param: serde_json::Value) -> RpcResult<Vec<String>> {
        let result = self.transport.call(method, vec![param]).await?;
        decode_result(method, result)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> RpcResult<T> {
        let result = self.transport.call(method, params).await?;
        decode_result(method, result)
    }
}

#[async_trait]
impl ChainSource for ChainClient {
    async fn block_number(&self) -> RpcResult<BlockNumber> {
        ChainClient::block_number(self).await
    }

    async fn block_with_transactions(&self, number: BlockNumber) -> RpcResult<BlockWithTransactions> {
        self.block_by_number_with_transactions(number).await
    }
}

/// Heights `head, head - 1, ...`, at most `n` of them, never below zero
pub fn latest_window(head: BlockNumber, n: u64) -> impl Iterator<Item = BlockNumber> {
    let count = n.min(head.saturating_add(1));
    (0..count).map(move |offset| head - offset)
}

/// Typed decode of a result value
pub fn decode_result<T: DeserializeOwned>(method: &str, result: serde_json::Value) -> RpcResult<T> {
    serde_json::from_value(result).map_err(|e| RpcError::Decode(format!("{}: {}", method, e)))
}

fn decode_hex_result(method: &str, result: &serde_json::Value) -> RpcResult<u64> {
    let text = result
        .as_str()
        .ok_or_else(|| RpcError::Decode(format!("{}: expected hex string, got {}", method, result)))?;
    decode_quantity(text).map_err(|e| RpcError::Decode(format!("{}: {}", method, e)))
}
