use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of a vault key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the random nonce prefixed to every ciphertext.
pub const NONCE_LEN: usize = 12;

/// Errors raised by the key vault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// Key list empty or a key is malformed.
    #[error("Vault configuration error: {0}")]
    Configuration(String),

    /// The cipher refused to encrypt.
    #[error("Encryption failed")]
    EncryptionFailed,

    /// No configured key authenticates the ciphertext.
    #[error("Failed to decrypt data with any of the provided keys")]
    DecryptionFailed,
}

/// Symmetric vault holding an ordered list of keys, newest first.
pub struct KeyVault {
    ciphers: Vec<Aes256Gcm>,
}

impl KeyVault {
    /// Build a vault from URL-safe base64 keys, newest first.
    pub fn new<S: AsRef<str>>(keys: &[S]) -> Result<Self, VaultError> {
        if keys.is_empty() {
            return Err(VaultError::Configuration(
                "at least one key is required".to_string(),
            ));
        }

        let ciphers = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let bytes = Zeroizing::new(URL_SAFE.decode(key.as_ref().trim()).map_err(|e| {
                    VaultError::Configuration(format!("key #{} is not valid base64: {}", i, e))
                })?);
                if bytes.len() != KEY_LEN {
                    return Err(VaultError::Configuration(format!(
                        "key #{} must decode to {} bytes, got {}",
                        i,
                        KEY_LEN,
                        bytes.len()
                    )));
                }
                Aes256Gcm::new_from_slice(&bytes)
                    .map_err(|e| VaultError::Configuration(format!("key #{}: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ciphers })
    }

    /// Generate a new random key in the configuration format.
    pub fn generate_key() -> String {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        rand::thread_rng().fill_bytes(&mut key[..]);
        URL_SAFE.encode(&key[..])
    }

    /// Number of configured keys.
    pub fn key_count(&self) -> usize {
        self.ciphers.len()
    }

    /// Encrypt under the newest key. Output is `nonce || ciphertext+tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self.ciphers[0]
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt with the first key that authenticates the ciphertext.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        if ciphertext.len() <= NONCE_LEN {
            return Err(VaultError::DecryptionFailed);
        }
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.ciphers
            .iter()
            .find_map(|cipher| cipher.decrypt(nonce, body).ok())
            .map(Zeroizing::new)
            .ok_or(VaultError::DecryptionFailed)
    }

    /// Re-encrypt a ciphertext produced under any configured key with the newest key.
    pub fn rotate(&self, ciphertext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let plaintext = self.decrypt(ciphertext)?;
        self.encrypt(&plaintext)
    }
}

impl std::fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVault")
            .field("keys", &self.ciphers.len())
            .finish()
    }
}

/// Text form of a ciphertext for storage.
pub fn encode_at_rest(ciphertext: &[u8]) -> String {
    URL_SAFE.encode(ciphertext)
}

/// Inverse of [`encode_at_rest`]. Corrupt text counts as a decryption failure.
pub fn decode_at_rest(stored: &str) -> Result<Vec<u8>, VaultError> {
    URL_SAFE
        .decode(stored)
        .map_err(|_| VaultError::DecryptionFailed)
}
