//! Transfer records and lifecycle states.

use alloy::primitives::{Address, TxHash};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset marker for native-currency transfers.
pub const NATIVE_ASSET: &str = "ETH";

/// Asset marker for decoded token transfers. The token contract is not resolved to a symbol.
pub const TOKEN_ASSET: &str = "ERC-20_TOKEN";

/// Lifecycle of a transfer.
///
/// ```text
/// Pending ──receipt ok──▶ Confirmed
///    │    ──receipt err─▶ Failed
///    └────validated────▶ Validated
/// (observed externally) ▶ Validated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Broadcast, no receipt yet.
    Pending,
    /// Self-issued transfer with a successful receipt.
    Confirmed,
    /// Receipt reported failure.
    Failed,
    /// Observed on chain with enough confirmations, destination managed.
    Validated,
}

impl TransferStatus {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Confirmed => "confirmed",
            TransferStatus::Failed => "failed",
            TransferStatus::Validated => "validated",
        }
    }

    /// Both terminal-success variants.
    pub fn is_settled(&self) -> bool {
        matches!(self, TransferStatus::Confirmed | TransferStatus::Validated)
    }

    /// No further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value transfer known to the service, keyed by transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub tx_hash: TxHash,
    pub asset: String,
    pub from_address: Address,
    pub to_address: Address,
    /// Amount in whole units (18 decimals).
    pub value: Decimal,
    pub status: TransferStatus,
    /// Fee paid in native units; zero until known.
    pub effective_cost: Decimal,
}

impl Transfer {
    /// Whether `address` is on either side of the transfer.
    pub fn involves(&self, address: &Address) -> bool {
        self.from_address == *address || self.to_address == *address
    }
}
