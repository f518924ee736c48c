//! Classification of raw transactions into native or token transfers.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::blockchain::TransactionDetails;
use crate::transfers::types::{NATIVE_ASSET, TOKEN_ASSET};

sol! {
    /// The ERC-20 entry point recognised as a token transfer.
    interface IERC20 {
        function transfer(address _to, uint256 _value) external returns (bool);
    }
}

/// Recipient and amount decoded from a token transfer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub recipient: Address,
    pub amount: U256,
}

/// Decodes call input against a known token-transfer signature.
pub trait CallDecoder: Send + Sync {
    /// `None` when the input is not a recognisable transfer call.
    fn decode_transfer(&self, input: &[u8]) -> Option<TokenTransfer>;
}

/// Decoder for `transfer(address,uint256)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Erc20TransferDecoder;

impl CallDecoder for Erc20TransferDecoder {
    fn decode_transfer(&self, input: &[u8]) -> Option<TokenTransfer> {
        IERC20::transferCall::abi_decode(input)
            .ok()
            .map(|call| TokenTransfer {
                recipient: call._to,
                amount: call._value,
            })
    }
}

/// What a transaction moved, and to whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub asset: &'static str,
    pub source: Address,
    pub destination: Address,
    /// Raw amount in the asset's smallest unit.
    pub amount: U256,
}

/// Side-effect free classifier over transaction details.
#[derive(Clone)]
pub struct TransferClassifier {
    decoder: Arc<dyn CallDecoder>,
}

impl TransferClassifier {
    pub fn new(decoder: Arc<dyn CallDecoder>) -> Self {
        Self { decoder }
    }

    /// Classify a transaction.
    ///
    /// Native by default; a decodable token transfer call overrides asset,
    /// destination and amount. Contract creations (no receiver) yield `None`.
    pub fn classify(&self, tx: &TransactionDetails) -> Option<Classification> {
        let receiver = tx.to?;

        let mut classification = Classification {
            asset: NATIVE_ASSET,
            source: tx.from,
            destination: receiver,
            amount: tx.value,
        };

        if !tx.input.is_empty() {
            if let Some(token) = self.decoder.decode_transfer(&tx.input) {
                classification.asset = TOKEN_ASSET;
                classification.destination = token.recipient;
                classification.amount = token.amount;
            }
        }

        Some(classification)
    }
}

impl Default for TransferClassifier {
    fn default() -> Self {
        Self::new(Arc::new(Erc20TransferDecoder))
    }
}
