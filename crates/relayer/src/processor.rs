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

use std::fmt::Debug;

use ethers::types::TxHash;
use serde::Serialize;
use tracing::Level;

use qgb_relayer_store::{ConfirmStore, ConfirmStoreExt};
use qgb_relayer_types::{Attestation, Confirm, DataCommitment, Valset};
use qgb_relayer_utils::{probe, Error, Result};

use crate::relayer::Relayer;
use crate::signatures::{match_attestation_confirm_sigs, signatures_by_signer};
use crate::traits::{
    AppQuerier, CommitmentQuerier, ContractClient, QuorumQuerier,
};

impl<A, T, Q, C, S> Relayer<A, T, Q, C, S>
where
    A: AppQuerier,
    T: CommitmentQuerier,
    Q: QuorumQuerier,
    C: ContractClient,
    S: ConfirmStore,
{
    /// Gathers a quorum of confirms for `attestation`, persists them and
    /// submits the matching contract call.
    ///
    /// Returns the hash of the submitted transaction without waiting for it.
    #[tracing::instrument(
        skip_all,
        fields(nonce = attestation.nonce(), kind = attestation.kind())
    )]
    pub async fn process_attestation(
        &self,
        opts: C::TxOptions,
        attestation: Attestation,
    ) -> Result<TxHash> {
        match attestation {
            Attestation::Valset(valset) => {
                self.relay_valset(opts, valset).await
            }
            Attestation::DataCommitment(dc) => {
                self.relay_data_commitment(opts, dc).await
            }
            Attestation::Unknown { nonce, type_url } => {
                tracing::error!(nonce, %type_url, "cannot relay attestation");
                Err(Error::UnknownAttestationType { nonce })
            }
        }
    }

    async fn relay_valset(
        &self,
        opts: C::TxOptions,
        valset: Valset,
    ) -> Result<TxHash> {
        // the first validator set has no predecessor and vouches for itself.
        let current = if valset.nonce == 1 {
            valset.clone()
        } else {
            self.app_querier.last_valset_before_nonce(valset.nonce).await?
        };
        let sign_bytes = valset.sign_bytes();
        let confirms = self
            .quorum_querier
            .two_thirds_valset_confirms(
                self.policy.confirm_timeout,
                self.policy.confirm_poll_interval,
                valset.nonce,
                &current,
                sign_bytes,
            )
            .await?;
        self.persist_confirms(&confirms)?;

        let signatures = match_attestation_confirm_sigs(
            &signatures_by_signer(&confirms),
            &current,
        )?;
        tracing::info!(
            members = valset.members.len(),
            "relaying valset {}",
            valset.nonce
        );
        self.contract
            .update_validator_set(opts, &valset, &current, signatures)
            .await
    }

    async fn relay_data_commitment(
        &self,
        opts: C::TxOptions,
        dc: DataCommitment,
    ) -> Result<TxHash> {
        let current =
            self.app_querier.last_valset_before_nonce(dc.nonce).await?;
        let commitment = self
            .commitment_querier
            .data_commitment(dc.begin_block, dc.end_block)
            .await?;
        let sign_bytes = dc.sign_bytes(commitment);
        let confirms = self
            .quorum_querier
            .two_thirds_data_commitment_confirms(
                self.policy.confirm_timeout,
                self.policy.confirm_poll_interval,
                dc.nonce,
                &current,
                sign_bytes,
            )
            .await?;
        self.persist_confirms(&confirms)?;

        let signatures = match_attestation_confirm_sigs(
            &signatures_by_signer(&confirms),
            &current,
        )?;
        tracing::info!(
            nonce = dc.nonce,
            "relaying data commitment {}-{}",
            dc.begin_block,
            dc.end_block
        );
        self.contract
            .submit_data_root_tuple_root(
                opts,
                dc.nonce,
                &current,
                commitment,
                signatures,
            )
            .await
    }

    fn persist_confirms<K>(&self, confirms: &[K]) -> Result<()>
    where
        K: Confirm + Serialize + Debug,
    {
        let written = self.store.save_confirms(confirms)?;
        tracing::event!(
            target: probe::TARGET,
            Level::DEBUG,
            kind = %probe::Kind::ConfirmStore,
            namespace = K::NAMESPACE,
            received = confirms.len(),
            written,
        );
        if let Some(metrics) = &self.metrics {
            metrics.confirms_stored.inc_by(written as f64);
        }
        Ok(())
    }
}
