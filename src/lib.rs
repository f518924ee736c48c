//! Custody-side transfer orchestration for an EIP-1559 chain.
//!
//! The library exposes the orchestrator and its collaborators; the
//! `wallet-orchestrator` binary wires them together for operators.

pub mod addresses;
pub mod blockchain;
pub mod config;
pub mod nonce;
pub mod observability;
pub mod store;
pub mod transfers;
pub mod vault;

pub use addresses::{AddressProvisioner, ManagedAddress, ProvisionError};
pub use config::OrchestratorConfig;
pub use nonce::{NonceAllocator, NonceError};
pub use transfers::{ErrorKind, Transfer, TransferError, TransferOrchestrator, TransferStatus};
pub use vault::{KeyVault, VaultError};
