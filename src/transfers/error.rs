//! Transfer error types and their place in the service's error taxonomy.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::nonce::NonceError;
use crate::store::StoreError;
use crate::vault::VaultError;

/// Broad error classes surfaced to callers.
///
/// Policy rejections are not errors: operations report them as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unacceptable (bad input, unmanaged address).
    Validation,
    /// A collaborator failed (chain RPC, store).
    Infrastructure,
    /// Key material could not be decrypted or used.
    Security,
}

/// Errors raised by the transfer orchestrator.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Amount must be strictly positive.
    #[error("Transfer amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Sender has no stored key material.
    #[error("Source address {0} is not managed by this service")]
    SourceNotManaged(Address),

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransferError {
    /// Where this error sits in the service's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidAmount(_) | TransferError::SourceNotManaged(_) => {
                ErrorKind::Validation
            }
            TransferError::Nonce(NonceError::UnmanagedAddress(_)) => ErrorKind::Validation,
            TransferError::Nonce(_) => ErrorKind::Infrastructure,
            TransferError::Vault(_) => ErrorKind::Security,
            TransferError::Chain(BlockchainError::Units(_)) => ErrorKind::Validation,
            TransferError::Chain(BlockchainError::Wallet(_)) => ErrorKind::Security,
            TransferError::Chain(_) | TransferError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let unmanaged = TransferError::from(NonceError::UnmanagedAddress(Address::ZERO));
        assert_eq!(unmanaged.kind(), ErrorKind::Validation);

        let decrypt = TransferError::from(VaultError::DecryptionFailed);
        assert_eq!(decrypt.kind(), ErrorKind::Security);

        let rpc = TransferError::from(BlockchainError::Rpc("down".to_string()));
        assert_eq!(rpc.kind(), ErrorKind::Infrastructure);

        let seeding = TransferError::from(NonceError::Chain(BlockchainError::Timeout(3)));
        assert_eq!(seeding.kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_unmanaged_message_passes_through() {
        let err = TransferError::from(NonceError::UnmanagedAddress(Address::ZERO));
        assert!(err.to_string().contains("is not managed"));
    }
}
