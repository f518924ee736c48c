//! Transfer lifecycle: creation, external validation, history and confirmation tracking.
//!
//! # Data Flow
//! ```text
//! create_transfer(from, to, asset, amount)
//!     → NonceAllocator::next_nonce
//!     → AddressStore lookup → KeyVault::decrypt → Wallet
//!     → base fee + fixed tip → estimate_gas → sign → broadcast
//!     → TransferStore::create (Pending)
//!     → spawn_confirmation_watch (detached) → Confirmed | Failed
//!
//! validate_transfer(tx_hash)
//!     → transaction + receipt + confirmation depth
//!     → TransferClassifier → managed destination?
//!     → upsert as Validated
//! ```
//!
//! # Design Decisions
//! - Policy rejections return `Ok(None)`; only collaborator failures are errors
//! - Watchers swallow their own errors; a timeout never overwrites a record

pub mod classifier;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use classifier::{
    CallDecoder, Classification, Erc20TransferDecoder, TokenTransfer, TransferClassifier, IERC20,
};
pub use error::{ErrorKind, TransferError};
pub use orchestrator::TransferOrchestrator;
pub use types::{Transfer, TransferStatus, NATIVE_ASSET, TOKEN_ASSET};
