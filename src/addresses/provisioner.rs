//! Minting and listing managed addresses.

use std::sync::Arc;

use alloy::primitives::Address;
use thiserror::Error;

use crate::addresses::types::ManagedAddress;
use crate::blockchain::Wallet;
use crate::config::AddressConfig;
use crate::store::{AddressStore, StoreError};
use crate::transfers::ErrorKind;
use crate::vault::{encode_at_rest, KeyVault, VaultError};

/// Errors raised while provisioning addresses.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Requested count outside `[1, max]`.
    #[error("Number of addresses to create must be between 1 and {max}, got {count}")]
    InvalidCount { count: usize, max: usize },

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProvisionError {
    /// Where this error sits in the service's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisionError::InvalidCount { .. } => ErrorKind::Validation,
            ProvisionError::Vault(_) => ErrorKind::Security,
            ProvisionError::Store(_) => ErrorKind::Infrastructure,
        }
    }
}

/// Creates new managed addresses with vault-encrypted keys.
pub struct AddressProvisioner {
    addresses: Arc<dyn AddressStore>,
    vault: Arc<KeyVault>,
    config: AddressConfig,
}

impl AddressProvisioner {
    pub fn new(addresses: Arc<dyn AddressStore>, vault: Arc<KeyVault>, config: AddressConfig) -> Self {
        Self {
            addresses,
            vault,
            config,
        }
    }

    /// Mint `count` addresses and persist them in one batch.
    ///
    /// The returned records are redacted; the stored ones keep their ciphertext.
    pub async fn create_addresses(&self, count: usize) -> Result<Vec<ManagedAddress>, ProvisionError> {
        let max = self.config.max_per_request;
        if count == 0 || count > max {
            return Err(ProvisionError::InvalidCount { count, max });
        }

        let records = (0..count)
            .map(|_| self.mint())
            .collect::<Result<Vec<_>, _>>()?;
        let public: Vec<ManagedAddress> = records.iter().map(ManagedAddress::redacted).collect();

        self.addresses.create_many(records).await?;

        tracing::info!(count, "Provisioned managed addresses");
        Ok(public)
    }

    /// Every managed address as stored.
    pub async fn list_addresses(&self) -> Result<Vec<ManagedAddress>, ProvisionError> {
        Ok(self.addresses.list_all().await?)
    }

    /// Lookup one managed address.
    pub async fn find_address(&self, address: Address) -> Result<Option<ManagedAddress>, ProvisionError> {
        Ok(self.addresses.find_by_address(address).await?)
    }

    fn mint(&self) -> Result<ManagedAddress, VaultError> {
        let wallet = Wallet::generate();
        let ciphertext = self.vault.encrypt(&wallet.secret_bytes())?;
        Ok(ManagedAddress {
            public_address: wallet.address(),
            encrypted_private_key: encode_at_rest(&ciphertext),
        })
    }
}
