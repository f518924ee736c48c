//! Nonce allocation under concurrency.

use std::collections::HashSet;

use alloy::primitives::Address;
use futures_util::future::join_all;
use rust_decimal::Decimal;

use wallet_orchestrator::transfers::NATIVE_ASSET;
use wallet_orchestrator::{ErrorKind, NonceError, TransferError};

mod common;

#[tokio::test]
async fn test_initialize_seeds_from_chain() {
    let h = common::harness();
    let created = h.provisioner.create_addresses(3).await.unwrap();
    for (i, record) in created.iter().enumerate() {
        h.chain.set_transaction_count(record.public_address, 10 * i as u64);
    }

    assert!(!h.nonces.is_ready());
    assert_eq!(h.nonces.initialize().await.unwrap(), 3);
    assert!(h.nonces.is_ready());

    for (i, record) in created.iter().enumerate() {
        assert_eq!(h.nonces.current(&record.public_address), Some(10 * i as u64));
    }
}

#[tokio::test]
async fn test_unmanaged_address_is_rejected() {
    let h = common::harness();
    h.managed_addresses(1).await;

    let stranger = Address::repeat_byte(0x55);
    assert!(matches!(
        h.nonces.next_nonce(&stranger),
        Err(NonceError::UnmanagedAddress(a)) if a == stranger
    ));
    assert_eq!(h.nonces.current(&stranger), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_get_consecutive_nonces() {
    let h = common::harness();
    let created = h.provisioner.create_addresses(1).await.unwrap();
    let address = created[0].public_address;
    h.chain.set_transaction_count(address, 5);
    h.nonces.initialize().await.unwrap();

    let tasks = (0..50).map(|_| {
        let nonces = h.nonces.clone();
        tokio::spawn(async move { nonces.next_nonce(&address).unwrap() })
    });
    let mut issued: Vec<u64> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    issued.sort_unstable();

    assert_eq!(issued, (5..55).collect::<Vec<_>>());
    assert_eq!(h.nonces.current(&address), Some(55));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_sign_distinct_nonces() {
    let h = common::harness();
    let from = h.managed_addresses(1).await[0];
    let to = Address::repeat_byte(0x22);

    let tasks = (0..10).map(|_| {
        let orchestrator = h.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .create_transfer(from, to, NATIVE_ASSET, Decimal::new(1, 3))
                .await
                .unwrap()
        })
    });
    let created = join_all(tasks).await;
    assert!(created.iter().all(|r| r.is_ok()));

    let nonces: HashSet<u64> = h.chain.broadcasts().iter().map(common::nonce_of).collect();
    assert_eq!(nonces, (0..10).collect::<HashSet<_>>());
    assert_eq!(h.transfers.count(), 10);
}

#[tokio::test]
async fn test_track_seeds_late_addresses() {
    let h = common::harness();
    h.nonces.initialize().await.unwrap();

    let late = h.provisioner.create_addresses(1).await.unwrap()[0].public_address;
    h.chain.set_transaction_count(late, 7);

    let err = h
        .orchestrator
        .create_transfer(late, Address::repeat_byte(0x01), NATIVE_ASSET, Decimal::ONE)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Nonce(NonceError::UnmanagedAddress(_))));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(h.nonces.track(late).await.unwrap(), 7);
    assert_eq!(h.nonces.next_nonce(&late).unwrap(), 7);
    assert_eq!(h.nonces.tracked(), 1);
}
