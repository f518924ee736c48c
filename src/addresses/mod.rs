//! Managed address provisioning.
//!
//! # Data Flow
//! ```text
//! create_addresses(n)
//!     → Wallet::generate (n fresh key pairs)
//!     → KeyVault::encrypt (secret bytes, newest key)
//!     → AddressStore::create_many (one batch)
//!     → redacted records back to the caller
//! ```

pub mod provisioner;
pub mod types;

pub use provisioner::{AddressProvisioner, ProvisionError};
pub use types::ManagedAddress;
