// Copyright 2022 Webb Technologies Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use std::sync::Arc;
use std::time::Duration;

use ethers::types::H256;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing_test::traced_test;

use qgb_relayer_context::Shutdown;
use qgb_relayer_store::InMemoryStore;
use qgb_relayer_types::{Attestation, DataCommitment, Vrs};
use qgb_relayer_utils::metric::Metrics;
use qgb_relayer_utils::Error;

use common::*;

#[tokio::test(start_paused = true)]
async fn caught_up_contract_gets_nothing() {
    let wallets = wallets();
    let chain = FakeChain::default();
    chain.push(Attestation::Valset(valset(1, &wallets, &[10, 10, 10])));
    let contract = FakeContract::at_nonce(1);
    let store = InMemoryStore::default();
    let relayer = relayer(&chain, &gossip(), &contract, store.clone());

    relayer.catch_up().await.unwrap();
    assert_eq!(chain.attestation_queries(), 0);
    assert!(contract.mined().is_empty());
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn relayed_confirms_are_stored_apart_from_their_source() {
    let wallets = wallets();
    let chain = FakeChain::default();
    let gossip = gossip();
    let first = valset(1, &wallets, &[10, 10, 10]);
    chain.push(Attestation::Valset(first.clone()));
    gossip_valset_confirms(&gossip, &wallets, &first).await;

    let contract = FakeContract::default();
    let store = InMemoryStore::default();
    let metrics = Arc::new(Metrics::new().unwrap());
    let relayer = relayer_with_metrics(
        &chain,
        &gossip,
        &contract,
        store.clone(),
        Some(metrics.clone()),
    );
    relayer.catch_up().await.unwrap();

    assert_eq!(contract.nonce(), 1);
    assert_eq!(store.len(), 3);
    assert_eq!(gossip.len(), 3);
    assert_eq!(metrics.confirms_stored.get(), 3.0);
    assert_eq!(metrics.valset_updates_relayed.get(), 1.0);
    assert_eq!(metrics.last_relayed_nonce.get(), 1.0);
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn catches_up_in_nonce_order() {
    let wallets = wallets();
    let chain = FakeChain::default();
    let gossip = gossip();

    // threshold is 167 out of 250, so the first two members suffice.
    let first = valset(1, &wallets, &[100, 100, 50]);
    let dc = DataCommitment {
        nonce: 2,
        begin_block: 1,
        end_block: 101,
    };
    let root = H256::repeat_byte(0xab);
    let second = valset(3, &wallets[..2], &[10, 10]);
    chain.push(Attestation::Valset(first.clone()));
    chain.push(Attestation::DataCommitment(dc.clone()));
    chain.push(Attestation::Valset(second.clone()));
    chain.set_commitment(1, 101, root);

    let signers = &wallets[..2];
    gossip_valset_confirms(&gossip, signers, &first).await;
    gossip_data_commitment_confirms(&gossip, signers, &dc, root).await;
    gossip_valset_confirms(&gossip, signers, &second).await;

    let contract = FakeContract::default();
    let store = InMemoryStore::default();
    let relayer = relayer(&chain, &gossip, &contract, store.clone());
    relayer.catch_up().await.unwrap();

    let mined = contract.mined();
    let nonces: Vec<_> = mined.iter().map(Submission::nonce).collect();
    assert_eq!(nonces, [1, 2, 3]);
    assert_eq!(contract.nonce(), 3);
    assert_eq!(store.len(), 6);

    // the first set vouches for itself, the later one is proven by the first.
    assert!(matches!(mined[0], Submission::Valset { current_nonce: 1, .. }));
    assert!(matches!(mined[2], Submission::Valset { current_nonce: 1, .. }));

    let expected = data_commitment_confirm(&wallets[0], &dc, root).await;
    match &mined[1] {
        Submission::DataRoot {
            root: submitted,
            signatures,
            ..
        } => {
            assert_eq!(*submitted, root);
            assert_eq!(signatures.len(), 3);
            let first: Vrs = expected.signature.parse().unwrap();
            assert_eq!(signatures[0], first);
            assert!(!signatures[1].is_empty());
            assert!(signatures[2].is_empty());
        }
        other => panic!("unexpected submission: {other:?}"),
    }
    assert!(logs_contain("relaying data commitment 1-101"));
}

#[tokio::test(start_paused = true)]
async fn rerunning_after_catch_up_is_a_no_op() {
    let wallets = wallets();
    let chain = FakeChain::default();
    let gossip = gossip();
    let first = valset(1, &wallets, &[10, 10, 10]);
    chain.push(Attestation::Valset(first.clone()));
    gossip_valset_confirms(&gossip, &wallets, &first).await;

    let contract = FakeContract::default();
    let store = InMemoryStore::default();
    let relayer = relayer(&chain, &gossip, &contract, store.clone());
    relayer.catch_up().await.unwrap();
    relayer.catch_up().await.unwrap();

    assert_eq!(contract.mined().len(), 1);
    assert_eq!(store.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn unknown_attestation_kind_stops_the_relayer() {
    let chain = FakeChain::default();
    chain.push(Attestation::Unknown {
        nonce: 7,
        type_url: "/qgb.SomethingElse".into(),
    });
    let contract = FakeContract::at_nonce(6);
    let relayer =
        relayer(&chain, &gossip(), &contract, InMemoryStore::default());

    let (_tx, rx) = broadcast::channel(1);
    let err = relayer.run(Shutdown::new(rx)).await.unwrap_err();
    assert_eq!(err.to_string(), "unknown attestation type: 7");
    // the ticker run and a single retry, which gives up right away.
    assert_eq!(chain.latest_nonce_queries(), 2);
    assert!(contract.mined().is_empty());
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn quorum_timeout_is_retried_then_surfaced() {
    let wallets = wallets();
    let chain = FakeChain::default();
    chain.push(Attestation::Valset(valset(1, &wallets, &[10, 10, 10])));
    let contract = FakeContract::default();
    let relayer =
        relayer(&chain, &gossip(), &contract, InMemoryStore::default());

    let (_tx, rx) = broadcast::channel(1);
    let start = Instant::now();
    let err = relayer.run(Shutdown::new(rx)).await.unwrap_err();
    assert!(matches!(err, Error::QuorumTimeout { nonce: 1, .. }));
    // one ticker run, then the first retry and `max_retries` more.
    assert_eq!(chain.latest_nonce_queries(), policy().max_retries + 2);
    // four 30s waits for confirms and two 5s pauses between retries.
    assert_eq!(start.elapsed(), Duration::from_secs(130));
    assert!(logs_contain("relay cycle failed"));
}

#[tokio::test(start_paused = true)]
async fn missing_attestation_is_an_error() {
    let chain = FakeChain::default();
    chain.announce(1);
    let contract = FakeContract::default();
    let relayer =
        relayer(&chain, &gossip(), &contract, InMemoryStore::default());

    let err = relayer.catch_up().await.unwrap_err();
    assert!(matches!(err, Error::AttestationNotFound { nonce: 1 }));

    let (_tx, rx) = broadcast::channel(1);
    let err = relayer.run(Shutdown::new(rx)).await.unwrap_err();
    assert!(matches!(err, Error::AttestationNotFound { nonce: 1 }));
    // the direct call, the ticker run and one retry that gives up.
    assert_eq!(chain.latest_nonce_queries(), 3);
}

#[tokio::test(start_paused = true)]
async fn new_attestations_are_picked_up_until_shutdown() {
    let wallets = wallets();
    let chain = FakeChain::default();
    let gossip = gossip();
    let first = valset(1, &wallets, &[10, 10, 10]);
    gossip_valset_confirms(&gossip, &wallets, &first).await;
    let contract = FakeContract::default();
    let relayer = relayer(&chain, &gossip, &contract, InMemoryStore::default());

    let late_chain = chain.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(150)).await;
        late_chain.push(Attestation::Valset(first));
    });
    let (tx, rx) = broadcast::channel(1);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(250)).await;
        let _ = tx.send(());
    });

    let err = relayer.run(Shutdown::new(rx)).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    // ticks at 0 and 100 find nothing, the one at 200 relays nonce 1 and
    // checks once more.
    assert_eq!(chain.latest_nonce_queries(), 4);
    assert_eq!(contract.nonce(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_confirm_commit_stores_and_submits_nothing() {
    let wallets = wallets();
    let chain = FakeChain::default();
    let gossip = gossip();
    let first = valset(1, &wallets, &[10, 10, 10]);
    chain.push(Attestation::Valset(first.clone()));
    gossip_valset_confirms(&gossip, &wallets, &first).await;

    let contract = FakeContract::default();
    let store = FailingStore::default();
    let relayer = relayer(&chain, &gossip, &contract, store.clone());

    let err = relayer.catch_up().await.unwrap_err();
    assert!(matches!(err, Error::Generic("disk full")));
    assert!(store.inner.is_empty());
    assert!(contract.mined().is_empty());
    assert_eq!(contract.nonce(), 0);
}
