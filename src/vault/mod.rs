//! Encryption of private key material at rest.
//!
//! # Data Flow
//! ```text
//! vault.keys (config / ENCRYPTION_KEYS, newest first)
//!     → KeyVault::new (decode + validate every key)
//!     → encrypt: newest key only
//!     → decrypt: each key in order until one authenticates
//! ```
//!
//! # Key Rotation
//! Prepend a new key and restart. Existing ciphertexts keep decrypting under the
//! older keys; [`KeyVault::rotate`] re-encrypts one under the newest key.

mod key_vault;

pub use key_vault::{decode_at_rest, encode_at_rest, KeyVault, VaultError, KEY_LEN, NONCE_LEN};
