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

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{TxHash, H256};
use parking_lot::Mutex;

use qgb_relayer::traits::{AppQuerier, CommitmentQuerier, ContractClient};
use qgb_relayer::{
    QuorumConfirmQuerier, Relayer, RelayerPolicy, StoreConfirmSource,
};
use qgb_relayer_store::{
    ConfirmBatch, ConfirmKey, ConfirmStore, ConfirmStoreExt, InMemoryStore,
};
use qgb_relayer_types::{
    Attestation, BridgeValidator, DataCommitment, DataCommitmentConfirm,
    Valset, ValsetConfirm, Vrs,
};
use qgb_relayer_utils::metric::Metrics;
use qgb_relayer_utils::{Error, Result};

pub const KEYS: [&str; 3] = [
    "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
    "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub fn wallets() -> Vec<LocalWallet> {
    KEYS.iter().map(|k| k.parse().unwrap()).collect()
}

pub fn valset(nonce: u64, wallets: &[LocalWallet], powers: &[u64]) -> Valset {
    let members = wallets
        .iter()
        .zip(powers)
        .map(|(w, p)| BridgeValidator {
            power: *p,
            evm_address: w.address(),
        })
        .collect();
    Valset::new(nonce, nonce * 10, members)
}

pub async fn valset_confirm(
    wallet: &LocalWallet,
    valset: &Valset,
) -> ValsetConfirm {
    let sign_bytes = valset.sign_bytes();
    let sig = wallet.sign_message(sign_bytes.as_bytes()).await.unwrap();
    ValsetConfirm {
        nonce: valset.nonce,
        evm_address: wallet.address(),
        signature: format!("0x{sig}"),
        sign_bytes,
    }
}

pub async fn data_commitment_confirm(
    wallet: &LocalWallet,
    dc: &DataCommitment,
    commitment: H256,
) -> DataCommitmentConfirm {
    let sig = wallet
        .sign_message(dc.sign_bytes(commitment).as_bytes())
        .await
        .unwrap();
    DataCommitmentConfirm {
        nonce: dc.nonce,
        evm_address: wallet.address(),
        signature: format!("0x{sig}"),
        commitment,
    }
}

/// The source chain: attestations by nonce and data commitments by range.
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
    latest_nonce_queries: Arc<AtomicUsize>,
    attestation_queries: Arc<AtomicUsize>,
}

#[derive(Default)]
struct ChainState {
    latest: u64,
    attestations: BTreeMap<u64, Attestation>,
    commitments: HashMap<(u64, u64), H256>,
}

impl FakeChain {
    pub fn push(&self, attestation: Attestation) {
        let mut state = self.state.lock();
        state.latest = state.latest.max(attestation.nonce());
        state.attestations.insert(attestation.nonce(), attestation);
    }

    /// Announces `nonce` as the latest attestation without serving it.
    pub fn announce(&self, nonce: u64) {
        self.state.lock().latest = nonce;
    }

    pub fn set_commitment(&self, begin: u64, end: u64, commitment: H256) {
        self.state.lock().commitments.insert((begin, end), commitment);
    }

    /// How many times the relayer asked for the latest nonce, which is once
    /// per catch-up run.
    pub fn latest_nonce_queries(&self) -> usize {
        self.latest_nonce_queries.load(Ordering::SeqCst)
    }

    /// How many attestations the relayer fetched by nonce.
    pub fn attestation_queries(&self) -> usize {
        self.attestation_queries.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AppQuerier for FakeChain {
    async fn latest_attestation_nonce(&self) -> Result<u64> {
        self.latest_nonce_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().latest)
    }

    async fn attestation_by_nonce(
        &self,
        nonce: u64,
    ) -> Result<Option<Attestation>> {
        self.attestation_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().attestations.get(&nonce).cloned())
    }

    async fn last_valset_before_nonce(&self, nonce: u64) -> Result<Valset> {
        let state = self.state.lock();
        state
            .attestations
            .range(..nonce)
            .rev()
            .find_map(|(_, a)| match a {
                Attestation::Valset(v) => Some(v.clone()),
                _ => None,
            })
            .ok_or(Error::Generic("no valset before nonce"))
    }
}

#[async_trait::async_trait]
impl CommitmentQuerier for FakeChain {
    async fn data_commitment(
        &self,
        begin_block: u64,
        end_block: u64,
    ) -> Result<H256> {
        self.state
            .lock()
            .commitments
            .get(&(begin_block, end_block))
            .copied()
            .ok_or(Error::Generic("unknown block range"))
    }
}

/// A call the relayer made to the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Valset {
        nonce: u64,
        current_nonce: u64,
        signatures: Vec<Vrs>,
    },
    DataRoot {
        nonce: u64,
        root: H256,
        signatures: Vec<Vrs>,
    },
}

impl Submission {
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Valset { nonce, .. } | Self::DataRoot { nonce, .. } => *nonce,
        }
    }
}

/// The contract: accepts a submission once its transaction is waited for.
#[derive(Clone, Default)]
pub struct FakeContract {
    state: Arc<Mutex<ContractState>>,
}

#[derive(Default)]
struct ContractState {
    nonce: u64,
    pending: HashMap<TxHash, Submission>,
    mined: Vec<Submission>,
}

impl FakeContract {
    pub fn at_nonce(nonce: u64) -> Self {
        let contract = Self::default();
        contract.state.lock().nonce = nonce;
        contract
    }

    pub fn mined(&self) -> Vec<Submission> {
        self.state.lock().mined.clone()
    }

    pub fn nonce(&self) -> u64 {
        self.state.lock().nonce
    }

    fn send(&self, submission: Submission) -> TxHash {
        let hash = H256::from_low_u64_be(submission.nonce());
        self.state.lock().pending.insert(hash, submission);
        hash
    }
}

#[async_trait::async_trait]
impl ContractClient for FakeContract {
    type TxOptions = ();

    async fn last_event_nonce(&self) -> Result<u64> {
        Ok(self.state.lock().nonce)
    }

    async fn transaction_options(&self) -> Result<Self::TxOptions> {
        Ok(())
    }

    async fn update_validator_set(
        &self,
        _opts: (),
        new_valset: &Valset,
        current_valset: &Valset,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash> {
        Ok(self.send(Submission::Valset {
            nonce: new_valset.nonce,
            current_nonce: current_valset.nonce,
            signatures,
        }))
    }

    async fn submit_data_root_tuple_root(
        &self,
        _opts: (),
        nonce: u64,
        _current_valset: &Valset,
        data_root_tuple_root: H256,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash> {
        Ok(self.send(Submission::DataRoot {
            nonce,
            root: data_root_tuple_root,
            signatures,
        }))
    }

    async fn wait_for_transaction(&self, tx_hash: TxHash) -> Result<()> {
        let mut state = self.state.lock();
        let submission = state.pending.remove(&tx_hash).ok_or(
            Error::TransactionDropped {
                tx_hash: format!("{tx_hash:?}"),
            },
        )?;
        state.nonce = submission.nonce();
        state.mined.push(submission);
        Ok(())
    }
}

/// A store whose batches never commit.
#[derive(Clone, Default)]
pub struct FailingStore {
    pub inner: InMemoryStore,
}

pub struct FailingBatch;

impl ConfirmBatch for FailingBatch {
    fn put(&mut self, _key: ConfirmKey, _value: Vec<u8>) {}

    fn commit(self) -> Result<usize> {
        Err(Error::Generic("disk full"))
    }
}

impl ConfirmStore for FailingStore {
    type Batch = FailingBatch;

    fn has(&self, key: &ConfirmKey) -> Result<bool> {
        self.inner.has(key)
    }

    fn batch(&self) -> Result<Self::Batch> {
        Ok(FailingBatch)
    }

    fn values_with_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>> {
        self.inner.values_with_prefix(prefix)
    }
}

pub type TestRelayer<S> = Relayer<
    FakeChain,
    FakeChain,
    QuorumConfirmQuerier<StoreConfirmSource<InMemoryStore>>,
    FakeContract,
    S,
>;

/// Confirms broadcast by the validators, as seen by the relayer.
pub fn gossip() -> InMemoryStore {
    InMemoryStore::default()
}

pub fn policy() -> RelayerPolicy {
    RelayerPolicy {
        relay_interval: Duration::from_secs(100),
        confirm_timeout: Duration::from_secs(30),
        confirm_poll_interval: Duration::from_secs(10),
        retry_interval: Duration::from_secs(5),
        max_retries: 2,
    }
}

pub fn relayer<S: ConfirmStore>(
    chain: &FakeChain,
    gossip: &InMemoryStore,
    contract: &FakeContract,
    store: S,
) -> TestRelayer<S> {
    relayer_with_metrics(chain, gossip, contract, store, None)
}

pub fn relayer_with_metrics<S: ConfirmStore>(
    chain: &FakeChain,
    gossip: &InMemoryStore,
    contract: &FakeContract,
    store: S,
    metrics: Option<Arc<Metrics>>,
) -> TestRelayer<S> {
    let builder = Relayer::builder()
        .app_querier(chain.clone())
        .commitment_querier(chain.clone())
        .quorum_querier(QuorumConfirmQuerier::new(StoreConfirmSource::new(
            gossip.clone(),
        )))
        .contract(contract.clone())
        .store(store)
        .policy(policy());
    match metrics {
        Some(metrics) => builder.metrics(metrics).build(),
        None => builder.build(),
    }
}

pub async fn gossip_valset_confirms(
    gossip: &InMemoryStore,
    signers: &[LocalWallet],
    valset: &Valset,
) {
    for wallet in signers {
        let confirm = valset_confirm(wallet, valset).await;
        gossip.save_confirms(&[confirm]).unwrap();
    }
}

pub async fn gossip_data_commitment_confirms(
    gossip: &InMemoryStore,
    signers: &[LocalWallet],
    dc: &DataCommitment,
    commitment: H256,
) {
    for wallet in signers {
        let confirm = data_commitment_confirm(wallet, dc, commitment).await;
        gossip.save_confirms(&[confirm]).unwrap();
    }
}
