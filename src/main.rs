//! Wallet orchestrator operator CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml + ENCRYPTION_KEYS / ETHEREUM_RPC_URL
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────┐   ┌───────────────────┐
//!   │ KeyVault │   │ BlockchainCl.│   │ JSON-backed stores│
//!   └────┬─────┘   └──────┬───────┘   └─────────┬─────────┘
//!        │                │                     │
//!        ▼                ▼                     ▼
//!   ┌──────────────────────────────────────────────────────┐
//!   │ AddressProvisioner │ NonceAllocator │ Orchestrator   │
//!   └──────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   subcommand output (pretty JSON on stdout, logs on stderr)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use wallet_orchestrator::blockchain::{BlockchainClient, ChainRpc};
use wallet_orchestrator::config::{load_config, OrchestratorConfig};
use wallet_orchestrator::observability::{logging, metrics};
use wallet_orchestrator::store::{
    AddressStore, MemoryAddressStore, MemoryTransferStore, TransferStore,
};
use wallet_orchestrator::transfers::NATIVE_ASSET;
use wallet_orchestrator::{
    AddressProvisioner, KeyVault, ManagedAddress, NonceAllocator, TransferOrchestrator,
};

const ADDRESSES_FILE: &str = "addresses.json";
const TRANSFERS_FILE: &str = "transfers.json";

#[derive(Parser)]
#[command(name = "wallet-orchestrator")]
#[command(about = "Custody wallet and transfer orchestration", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh vault key
    GenerateKey,
    /// Mint new managed addresses
    CreateAddresses {
        count: usize,
    },
    /// List managed addresses
    ListAddresses,
    /// Sign and broadcast a transfer from a managed address
    Send {
        #[arg(long)]
        from: Address,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = NATIVE_ASSET)]
        asset: String,
        /// Block until the confirmation watcher finishes
        #[arg(long)]
        wait: bool,
    },
    /// Accept an observed transfer into a managed address
    Validate {
        tx_hash: TxHash,
    },
    /// Show stored transfers
    History {
        #[arg(long)]
        address: Option<Address>,
    },
    /// Wait for a broadcast transfer's receipt and record the outcome
    Watch {
        tx_hash: TxHash,
    },
}

struct Services {
    provisioner: AddressProvisioner,
    orchestrator: TransferOrchestrator,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::GenerateKey) {
        println!("{}", KeyVault::generate_key());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        chain_id = config.blockchain.chain_id,
        min_confirmations = config.transfers.min_confirmations,
        vault_keys = config.vault.keys.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let services = build_services(&config).await?;

    match cli.command {
        Commands::GenerateKey => {}
        Commands::CreateAddresses { count } => {
            let created = services.provisioner.create_addresses(count).await?;
            print_json(&created)?;
        }
        Commands::ListAddresses => {
            let addresses: Vec<_> = services
                .provisioner
                .list_addresses()
                .await?
                .iter()
                .map(ManagedAddress::redacted)
                .collect();
            print_json(&addresses)?;
        }
        Commands::Send {
            from,
            to,
            amount,
            asset,
            wait,
        } => {
            let seeded = services.orchestrator.nonces().initialize().await?;
            tracing::debug!(seeded, "Nonce allocator ready");

            let (transfer, watcher) = services
                .orchestrator
                .submit_transfer(from, to, &asset, amount)
                .await?;
            print_json(&transfer)?;

            if wait {
                watcher.await?;
                let settled = services.orchestrator.list_history(Some(from)).await?;
                if let Some(latest) = settled.iter().find(|t| t.tx_hash == transfer.tx_hash) {
                    print_json(latest)?;
                }
            }
        }
        Commands::Validate { tx_hash } => {
            match services.orchestrator.validate_transfer(tx_hash).await? {
                Some(transfer) => print_json(&transfer)?,
                None => {
                    eprintln!("Transaction {} is not applicable to this service", tx_hash);
                    std::process::exit(2);
                }
            }
        }
        Commands::History { address } => {
            let transfers = services.orchestrator.list_history(address).await?;
            print_json(&transfers)?;
        }
        Commands::Watch { tx_hash } => {
            services.orchestrator.watch_confirmation(tx_hash).await;
            let transfers = services.orchestrator.list_history(None).await?;
            if let Some(transfer) = transfers.iter().find(|t| t.tx_hash == tx_hash) {
                print_json(transfer)?;
            }
        }
    }

    Ok(())
}

async fn build_services(
    config: &OrchestratorConfig,
) -> Result<Services, Box<dyn std::error::Error>> {
    let vault = Arc::new(KeyVault::new(&config.vault.keys)?);
    tracing::debug!(keys = vault.key_count(), "Key vault ready");

    let (addresses, transfers) = open_stores(config.storage.data_dir.as_deref())?;

    let chain: Arc<dyn ChainRpc> =
        Arc::new(BlockchainClient::new(config.blockchain.clone()).await?);
    let nonces = Arc::new(NonceAllocator::new(chain.clone(), addresses.clone()));

    let provisioner =
        AddressProvisioner::new(addresses.clone(), vault.clone(), config.addresses.clone());
    let orchestrator = TransferOrchestrator::new(
        chain,
        transfers,
        addresses,
        vault,
        nonces,
        config.transfers.clone(),
        config.blockchain.chain_id,
    );

    Ok(Services {
        provisioner,
        orchestrator,
    })
}

type Stores = (Arc<dyn AddressStore>, Arc<dyn TransferStore>);

fn open_stores(data_dir: Option<&str>) -> Result<Stores, Box<dyn std::error::Error>> {
    let Some(dir) = data_dir else {
        tracing::warn!("No storage.data_dir configured; records will not outlive this run");
        let addresses: Arc<dyn AddressStore> = Arc::new(MemoryAddressStore::new());
        let transfers: Arc<dyn TransferStore> = Arc::new(MemoryTransferStore::new());
        return Ok((addresses, transfers));
    };

    let dir = Path::new(dir);
    std::fs::create_dir_all(dir)?;
    let addresses: Arc<dyn AddressStore> =
        Arc::new(MemoryAddressStore::load_from_file(dir.join(ADDRESSES_FILE))?);
    let transfers: Arc<dyn TransferStore> =
        Arc::new(MemoryTransferStore::load_from_file(dir.join(TRANSFERS_FILE))?);
    Ok((addresses, transfers))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
