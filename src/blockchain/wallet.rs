//! Key pair generation and transaction signing.
//!
//! # Security
//! - Secret bytes only ever leave this module inside `Zeroizing` buffers
//! - Keys are never logged or serialized
//! - A `Wallet` is built per signing and dropped right after

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;
use zeroize::Zeroizing;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// A transaction signed and encoded for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransfer {
    /// Hash the network will assign to the transaction.
    pub hash: TxHash,
    /// EIP-2718 envelope bytes.
    pub raw: Bytes,
}

/// Signing key for one managed address.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Rebuild a wallet from raw 32-byte secret key material.
    pub fn from_secret_bytes(secret: &[u8]) -> BlockchainResult<Self> {
        let signer = PrivateKeySigner::from_slice(secret)
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key material: {}", e)))?;
        Ok(Self { signer })
    }

    /// The wallet's public address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Copy of the secret key bytes, wiped when dropped.
    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signer.to_bytes().to_vec())
    }

    /// Sign an EIP-1559 transaction and encode it for broadcast.
    pub fn sign_transaction(&self, mut tx: TxEip1559) -> BlockchainResult<SignedTransfer> {
        let signature = self
            .signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let envelope = TxEnvelope::from(signed);

        Ok(SignedTransfer {
            hash,
            raw: Bytes::from(envelope.encoded_2718()),
        })
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::{keccak256, TxKind, U256};

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_wallet() -> Wallet {
        let bytes = alloy::primitives::hex::decode(TEST_PRIVATE_KEY).unwrap();
        Wallet::from_secret_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_wallet_from_secret_bytes() {
        assert_eq!(
            test_wallet().address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_secret_bytes_round_trip() {
        let wallet = Wallet::generate();
        let restored = Wallet::from_secret_bytes(&wallet.secret_bytes()).unwrap();
        assert_eq!(wallet.address(), restored.address());
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let result = Wallet::from_secret_bytes(&[1u8; 7]);
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", test_wallet());
        assert!(!rendered.contains(TEST_PRIVATE_KEY));
    }

    #[test]
    fn test_sign_transaction_encodes_envelope() {
        let tx = TxEip1559 {
            chain_id: 31337,
            nonce: 7,
            gas_limit: 21_000,
            max_fee_per_gas: 3_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            to: TxKind::Call(Address::repeat_byte(0x11)),
            value: U256::from(1_000u64),
            ..Default::default()
        };

        let signed = test_wallet().sign_transaction(tx).unwrap();
        assert_eq!(signed.hash, keccak256(&signed.raw));

        let envelope = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert_eq!(*envelope.tx_hash(), signed.hash);
        assert_eq!(alloy::consensus::Transaction::nonce(&envelope), 7);
    }
}
