//! Transfer orchestration: create, validate, list and watch.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use crate::blockchain::transaction::{FeeParams, TransferDraft, GWEI};
use crate::blockchain::units::{decimal_to_wei, wei_to_decimal};
use crate::blockchain::{ChainRpc, Wallet};
use crate::config::TransferConfig;
use crate::nonce::NonceAllocator;
use crate::observability::metrics;
use crate::store::{AddressStore, TransferStore};
use crate::transfers::classifier::TransferClassifier;
use crate::transfers::error::TransferError;
use crate::transfers::types::{Transfer, TransferStatus};
use crate::vault::{decode_at_rest, KeyVault};

/// Coordinates the vault, nonce allocator, chain and stores.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct TransferOrchestrator {
    chain: Arc<dyn ChainRpc>,
    transfers: Arc<dyn TransferStore>,
    addresses: Arc<dyn AddressStore>,
    vault: Arc<KeyVault>,
    nonces: Arc<NonceAllocator>,
    classifier: TransferClassifier,
    config: TransferConfig,
    chain_id: u64,
}

impl TransferOrchestrator {
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        transfers: Arc<dyn TransferStore>,
        addresses: Arc<dyn AddressStore>,
        vault: Arc<KeyVault>,
        nonces: Arc<NonceAllocator>,
        config: TransferConfig,
        chain_id: u64,
    ) -> Self {
        Self {
            chain,
            transfers,
            addresses,
            vault,
            nonces,
            classifier: TransferClassifier::default(),
            config,
            chain_id,
        }
    }

    /// The shared nonce allocator.
    pub fn nonces(&self) -> &Arc<NonceAllocator> {
        &self.nonces
    }

    /// Sign and broadcast a native transfer from a managed address.
    ///
    /// The nonce is consumed as soon as it is allocated: any later failure
    /// leaves a gap that the next [`NonceAllocator::track`] call closes.
    /// The record is stored `Pending` with zero effective cost.
    pub async fn create_transfer(
        &self,
        from: Address,
        to: Address,
        asset: &str,
        amount: Decimal,
    ) -> Result<Transfer, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount(amount));
        }
        let value = decimal_to_wei(amount)?;

        let nonce = self.nonces.next_nonce(&from)?;

        let sender = self
            .addresses
            .find_by_address(from)
            .await?
            .filter(|record| record.has_key_material())
            .ok_or(TransferError::SourceNotManaged(from))?;

        let wallet = {
            let ciphertext = decode_at_rest(&sender.encrypted_private_key)?;
            let secret = self.vault.decrypt(&ciphertext)?;
            Wallet::from_secret_bytes(&secret)?
        };

        let base_fee = self.chain.get_base_fee().await?;
        let tip = u128::from(self.config.priority_fee_gwei).saturating_mul(GWEI);
        let draft = TransferDraft {
            from,
            to,
            value,
            nonce,
            chain_id: self.chain_id,
            fees: FeeParams::from_base_fee(base_fee, tip),
        };

        let gas_limit = self.chain.estimate_gas(&draft.estimation_request()).await?;
        let signed = wallet.sign_transaction(draft.into_eip1559(gas_limit))?;
        drop(wallet);

        let tx_hash = match self.chain.broadcast(signed.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(
                    address = %from,
                    nonce,
                    error = %e,
                    "Broadcast failed after nonce allocation"
                );
                return Err(e.into());
            }
        };
        if tx_hash != signed.hash {
            tracing::warn!(
                expected = %signed.hash,
                reported = %tx_hash,
                "Node reported a different transaction hash"
            );
        }

        let transfer = self
            .transfers
            .create(Transfer {
                tx_hash,
                asset: asset.to_string(),
                from_address: from,
                to_address: to,
                value: amount,
                status: TransferStatus::Pending,
                effective_cost: Decimal::ZERO,
            })
            .await
            .inspect_err(|e| {
                tracing::error!(
                    tx_hash = %tx_hash,
                    error = %e,
                    "Transfer broadcast but not recorded; validate it once mined"
                )
            })?;

        metrics::record_transfer_created(asset);
        tracing::info!(
            tx_hash = %tx_hash,
            from = %from,
            to = %to,
            nonce,
            gas_limit,
            "Transfer broadcast"
        );

        Ok(transfer)
    }

    /// [`create_transfer`](Self::create_transfer), then watch for the receipt on a detached task.
    ///
    /// The handle may be dropped; the watcher keeps running.
    pub async fn submit_transfer(
        &self,
        from: Address,
        to: Address,
        asset: &str,
        amount: Decimal,
    ) -> Result<(Transfer, JoinHandle<()>), TransferError> {
        let transfer = self.create_transfer(from, to, asset, amount).await?;
        let watcher = self.spawn_confirmation_watch(transfer.tx_hash);
        Ok((transfer, watcher))
    }

    /// Accept an observed on-chain transfer into a managed address.
    ///
    /// `Ok(None)` means the transaction is not applicable: unknown, not
    /// successfully mined, too shallow, a contract creation, or paying an
    /// address this service does not manage.
    pub async fn validate_transfer(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<Transfer>, TransferError> {
        let Some(tx) = self.chain.get_transaction(tx_hash).await? else {
            return Ok(reject(tx_hash, "unknown_transaction"));
        };

        let receipt = match self.chain.get_receipt(tx_hash).await? {
            Some(receipt) if receipt.success => receipt,
            _ => return Ok(reject(tx_hash, "no_successful_receipt")),
        };

        let latest = self.chain.get_block_number().await?;
        let confirmations = receipt.confirmations(latest);
        if confirmations < self.config.min_confirmations {
            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations,
                required = self.config.min_confirmations,
                "Not enough confirmations"
            );
            return Ok(reject(tx_hash, "insufficient_confirmations"));
        }

        let Some(classified) = self.classifier.classify(&tx) else {
            return Ok(reject(tx_hash, "contract_creation"));
        };

        if self
            .addresses
            .find_by_address(classified.destination)
            .await?
            .is_none()
        {
            return Ok(reject(tx_hash, "unmanaged_destination"));
        }

        let effective_cost = wei_to_decimal(receipt.fee_wei())?;

        let record = match self.transfers.find_by_hash(tx_hash).await? {
            Some(mut existing) => {
                existing.status = TransferStatus::Validated;
                existing.effective_cost = effective_cost;
                self.transfers
                    .update(existing.clone())
                    .await?
                    .unwrap_or(existing)
            }
            None => {
                self.transfers
                    .create(Transfer {
                        tx_hash,
                        asset: classified.asset.to_string(),
                        from_address: classified.source,
                        to_address: classified.destination,
                        value: wei_to_decimal(classified.amount)?,
                        status: TransferStatus::Validated,
                        effective_cost,
                    })
                    .await?
            }
        };

        metrics::record_validation("accepted");
        metrics::record_transfer_status(TransferStatus::Validated.as_str());
        tracing::info!(
            tx_hash = %tx_hash,
            asset = %record.asset,
            destination = %record.to_address,
            confirmations,
            "Transfer validated"
        );

        Ok(Some(record))
    }

    /// All transfers in insertion order, or those touching `address`.
    pub async fn list_history(
        &self,
        address: Option<Address>,
    ) -> Result<Vec<Transfer>, TransferError> {
        let transfers = match address {
            Some(address) => self.transfers.list_by_address(address).await?,
            None => self.transfers.list_all().await?,
        };
        Ok(transfers)
    }

    /// Wait for the receipt of a broadcast transfer and record the outcome.
    ///
    /// Never fails: a timeout leaves the record `Pending`, and unexpected
    /// errors are logged and dropped.
    pub async fn watch_confirmation(&self, tx_hash: TxHash) {
        tracing::info!(tx_hash = %tx_hash, "Started monitoring transaction");

        if let Err(e) = self.settle(tx_hash).await {
            tracing::error!(
                tx_hash = %tx_hash,
                error = %e,
                "Unexpected error while monitoring transaction"
            );
        }
    }

    /// Run [`watch_confirmation`](Self::watch_confirmation) on a detached task.
    pub fn spawn_confirmation_watch(&self, tx_hash: TxHash) -> JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.watch_confirmation(tx_hash).await })
    }

    async fn settle(&self, tx_hash: TxHash) -> Result<(), TransferError> {
        let timeout = Duration::from_secs(self.config.confirmation_timeout_secs);

        let Some(receipt) = self.chain.wait_for_receipt(tx_hash, timeout).await? else {
            metrics::record_watch_timeout();
            tracing::warn!(
                tx_hash = %tx_hash,
                timeout_secs = self.config.confirmation_timeout_secs,
                "Timed out waiting for receipt; record left pending"
            );
            return Ok(());
        };

        let Some(mut transfer) = self.transfers.find_by_hash(tx_hash).await? else {
            tracing::error!(tx_hash = %tx_hash, "Could not find transaction to update");
            return Ok(());
        };

        if receipt.success {
            transfer.status = TransferStatus::Confirmed;
            transfer.effective_cost = wei_to_decimal(receipt.fee_wei())?;
            tracing::info!(
                tx_hash = %tx_hash,
                block = ?receipt.block_number,
                effective_cost = %transfer.effective_cost,
                "Transaction confirmed"
            );
        } else {
            transfer.status = TransferStatus::Failed;
            tracing::warn!(tx_hash = %tx_hash, block = ?receipt.block_number, "Transaction failed");
        }

        let status = transfer.status;
        self.transfers.update(transfer).await?;
        metrics::record_transfer_status(status.as_str());

        Ok(())
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("chain_id", &self.chain_id)
            .field("config", &self.config)
            .field("nonces", &self.nonces)
            .finish()
    }
}

fn reject(tx_hash: TxHash, reason: &'static str) -> Option<Transfer> {
    metrics::record_validation(reason);
    tracing::debug!(tx_hash = %tx_hash, reason, "Transfer not applicable");
    None
}
