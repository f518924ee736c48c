//! Blockchain RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (transactions, receipts, block, base fee, nonces)
//! - Estimate gas and broadcast signed transactions
//! - Translate alloy responses into the crate's typed chain records

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::eips::BlockNumberOrTag;
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Transaction, TransactionReceipt, TransactionRequest};
use alloy::transports::TransportResult;
use async_trait::async_trait;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ReceiptSummary,
    TransactionDetails,
};
use crate::blockchain::ChainRpc;
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Fails only if the primary URL is malformed; an unreachable node is
    /// reported and tolerated so the process can start while the node syncs.
    pub async fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Run `call` against each provider in order until one answers in time.
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, operation, error = %e, "RPC error, trying next provider")
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, operation, "RPC timeout, trying next provider")
                }
            }
        }
        metrics::record_rpc_failure(operation);
        Err(BlockchainError::Rpc(format!("All RPC providers failed to {}", operation)))
    }
}

fn details_from_rpc(tx: Transaction) -> TransactionDetails {
    TransactionDetails {
        hash: TransactionResponse::tx_hash(&tx),
        from: TransactionResponse::from(&tx),
        to: ConsensusTransaction::to(&tx),
        value: ConsensusTransaction::value(&tx),
        input: ConsensusTransaction::input(&tx).clone(),
        block_number: tx.block_number,
    }
}

fn receipt_from_rpc(receipt: TransactionReceipt) -> ReceiptSummary {
    ReceiptSummary {
        success: receipt.status(),
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
    }
}

#[async_trait]
impl ChainRpc for BlockchainClient {
    async fn get_transaction(&self, hash: TxHash) -> BlockchainResult<Option<TransactionDetails>> {
        let tx = self
            .with_failover("get transaction", |p| async move {
                p.get_transaction_by_hash(hash).await
            })
            .await?;
        Ok(tx.map(details_from_rpc))
    }

    async fn get_receipt(&self, hash: TxHash) -> BlockchainResult<Option<ReceiptSummary>> {
        let receipt = self
            .with_failover("get receipt", |p| async move {
                p.get_transaction_receipt(hash).await
            })
            .await?;
        Ok(receipt.map(receipt_from_rpc))
    }

    async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    async fn get_base_fee(&self) -> BlockchainResult<u128> {
        let block = self
            .with_failover("get latest block", |p| async move {
                p.get_block_by_number(BlockNumberOrTag::Latest).await
            })
            .await?;
        Ok(block
            .and_then(|b| b.header.base_fee_per_gas)
            .map(u128::from)
            .unwrap_or(0))
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> BlockchainResult<u64> {
        self.with_failover("estimate gas", |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
    }

    async fn broadcast(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        self.with_failover("broadcast transaction", |p| {
            let raw = raw.clone();
            async move {
                p.send_raw_transaction(&raw)
                    .await
                    .map(|pending| *pending.tx_hash())
            }
        })
        .await
    }

    async fn get_transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get transaction count", |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        wait: Duration,
    ) -> BlockchainResult<Option<ReceiptSummary>> {
        let poll_interval = Duration::from_millis(self.config.receipt_poll_interval_ms.max(1));

        let result = timeout(wait, async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.get_receipt(hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => tracing::debug!(tx_hash = %hash, "Transaction pending"),
                    Err(e) => {
                        tracing::warn!(tx_hash = %hash, error = %e, "Receipt poll failed, retrying")
                    }
                }
            }
        })
        .await;

        Ok(result.ok())
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            // Nothing listens on port 1; connections are refused immediately
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            chain_id: 31337,
            rpc_timeout_secs: 1,
            receipt_poll_interval_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_node() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_primary_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let result = BlockchainClient::new(config).await;
        assert!(matches!(result, Err(BlockchainError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_rpc_failover_exhausted() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        config.failover_urls.push("::garbage::".to_string());

        let client = BlockchainClient::new(config).await.unwrap();
        assert_eq!(client.providers.len(), 2);

        let result = client.get_block_number().await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("All RPC providers failed"));
    }

    #[tokio::test]
    async fn test_wait_for_receipt_times_out_inconclusively() {
        let client = BlockchainClient::new(test_config()).await.unwrap();
        let outcome = client
            .wait_for_receipt(TxHash::ZERO, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(outcome.is_none());
    }
}
