//! Managed address records.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// An address whose private key this service holds, encrypted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedAddress {
    pub public_address: Address,
    /// Vault ciphertext in at-rest text form. Empty on redacted copies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encrypted_private_key: String,
}

impl ManagedAddress {
    /// Copy with the key material stripped, for handing back to callers.
    pub fn redacted(&self) -> Self {
        Self {
            public_address: self.public_address,
            encrypted_private_key: String::new(),
        }
    }

    /// Whether this record carries key material.
    pub fn has_key_material(&self) -> bool {
        !self.encrypted_private_key.is_empty()
    }
}

impl std::fmt::Debug for ManagedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedAddress")
            .field("public_address", &self.public_address)
            .field("has_key_material", &self.has_key_material())
            .finish()
    }
}
