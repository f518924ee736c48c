//! Transfer assembly: fee parameters, gas estimation request, and the unsigned EIP-1559 body.
//!
//! # Responsibilities
//! - Derive max fee / priority fee from the latest base fee and a fixed tip
//! - Build the estimation request and the signable transaction from the same inputs

use alloy::consensus::TxEip1559;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxKind, U256};
use alloy::rpc::types::TransactionRequest;

/// One gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// EIP-1559 fee parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    /// Upper bound paid per gas.
    pub max_fee_per_gas: u128,
    /// Tip paid to the block producer per gas.
    pub max_priority_fee_per_gas: u128,
}

impl FeeParams {
    /// `max_fee = 2 × base_fee + tip`, leaving headroom for base fee growth while pending.
    pub fn from_base_fee(base_fee: u128, priority_fee: u128) -> Self {
        Self {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// Everything needed to sign a native transfer except the gas limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDraft {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub nonce: u64,
    pub chain_id: u64,
    pub fees: FeeParams,
}

impl TransferDraft {
    /// Request used for `eth_estimateGas`.
    pub fn estimation_request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.to)
            .with_value(self.value)
            .with_nonce(self.nonce)
            .with_chain_id(self.chain_id)
            .with_max_fee_per_gas(self.fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(self.fees.max_priority_fee_per_gas)
    }

    /// Signable transaction body with the estimated gas limit.
    pub fn into_eip1559(self, gas_limit: u64) -> TxEip1559 {
        TxEip1559 {
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_limit,
            max_fee_per_gas: self.fees.max_fee_per_gas,
            max_priority_fee_per_gas: self.fees.max_priority_fee_per_gas,
            to: TxKind::Call(self.to),
            value: self.value,
            ..Default::default()
        }
    }
}
