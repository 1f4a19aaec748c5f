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

//! The collaborators the relayer talks to.

use std::time::Duration;

use ethers::types::{TxHash, H256};

use qgb_relayer_types::{
    Attestation, DataCommitmentConfirm, Valset, ValsetConfirm, Vrs,
};
use qgb_relayer_utils::Result;

/// Read access to the attestations stored by the source chain application.
#[async_trait::async_trait]
pub trait AppQuerier: Send + Sync {
    /// The nonce of the most recent attestation.
    async fn latest_attestation_nonce(&self) -> Result<u64>;

    /// The attestation at `nonce`, or `None` if there is none.
    async fn attestation_by_nonce(
        &self,
        nonce: u64,
    ) -> Result<Option<Attestation>>;

    /// The most recent validator set with a nonce strictly lower than
    /// `nonce`.
    async fn last_valset_before_nonce(&self, nonce: u64) -> Result<Valset>;
}

/// Read access to the data commitments of the source chain.
#[async_trait::async_trait]
pub trait CommitmentQuerier: Send + Sync {
    /// The data root tuple root of the blocks in `[begin_block, end_block)`.
    async fn data_commitment(
        &self,
        begin_block: u64,
        end_block: u64,
    ) -> Result<H256>;
}

/// Where the validators' confirms can be read from.
#[async_trait::async_trait]
pub trait ConfirmSource: Send + Sync {
    async fn valset_confirms(&self, nonce: u64) -> Result<Vec<ValsetConfirm>>;

    async fn data_commitment_confirms(
        &self,
        nonce: u64,
    ) -> Result<Vec<DataCommitmentConfirm>>;
}

/// Collects confirms until two thirds of a validator set's power signed.
#[async_trait::async_trait]
pub trait QuorumQuerier: Send + Sync {
    /// Waits until members of `valset` holding at least its
    /// [two thirds threshold](Valset::two_thirds_threshold) of power have
    /// confirmed `sign_bytes` for the validator set at `nonce`, polling every
    /// `poll_interval` and giving up after `timeout`.
    async fn two_thirds_valset_confirms(
        &self,
        timeout: Duration,
        poll_interval: Duration,
        nonce: u64,
        valset: &Valset,
        sign_bytes: H256,
    ) -> Result<Vec<ValsetConfirm>>;

    /// Same as [`Self::two_thirds_valset_confirms`], for the data
    /// commitment at `nonce`.
    async fn two_thirds_data_commitment_confirms(
        &self,
        timeout: Duration,
        poll_interval: Duration,
        nonce: u64,
        valset: &Valset,
        sign_bytes: H256,
    ) -> Result<Vec<DataCommitmentConfirm>>;
}

/// The QGB contract on the EVM chain.
#[async_trait::async_trait]
pub trait ContractClient: Send + Sync {
    /// Per-transaction settings, fetched right before submitting.
    type TxOptions: Send;

    /// The nonce of the last attestation the contract accepted.
    async fn last_event_nonce(&self) -> Result<u64>;

    async fn transaction_options(&self) -> Result<Self::TxOptions>;

    /// Moves the contract to `new_valset`, proving it with `signatures` from
    /// `current_valset`, ordered like its members.
    async fn update_validator_set(
        &self,
        opts: Self::TxOptions,
        new_valset: &Valset,
        current_valset: &Valset,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash>;

    /// Submits `data_root_tuple_root` as the commitment at `nonce`, proving
    /// it with `signatures` from `current_valset`, ordered like its members.
    async fn submit_data_root_tuple_root(
        &self,
        opts: Self::TxOptions,
        nonce: u64,
        current_valset: &Valset,
        data_root_tuple_root: H256,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash>;

    /// Resolves once `tx_hash` is mined, failing if it reverted or got
    /// dropped.
    async fn wait_for_transaction(&self, tx_hash: TxHash) -> Result<()>;
}
