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

use std::sync::Arc;
use std::time::Duration;

use tracing::Level;
use typed_builder::TypedBuilder;

use qgb_relayer_context::Shutdown;
use qgb_relayer_store::ConfirmStore;
use qgb_relayer_types::Attestation;
use qgb_relayer_utils::metric::Metrics;
use qgb_relayer_utils::retry::ConstantWithMaxRetryCount;
use qgb_relayer_utils::{probe, Error, Result};

use crate::policy::RelayerPolicy;
use crate::ticker;
use crate::traits::{
    AppQuerier, CommitmentQuerier, ContractClient, QuorumQuerier,
};

/// Relays attestations from the source chain to the QGB contract, one nonce
/// at a time and in order.
#[derive(TypedBuilder)]
pub struct Relayer<A, T, Q, C, S> {
    pub(crate) app_querier: A,
    pub(crate) commitment_querier: T,
    pub(crate) quorum_querier: Q,
    pub(crate) contract: C,
    pub(crate) store: S,
    #[builder(default)]
    pub(crate) policy: RelayerPolicy,
    #[builder(default, setter(strip_option))]
    pub(crate) metrics: Option<Arc<Metrics>>,
}

impl<A, T, Q, C, S> Relayer<A, T, Q, C, S>
where
    A: AppQuerier,
    T: CommitmentQuerier,
    Q: QuorumQuerier,
    C: ContractClient,
    S: ConfirmStore,
{
    /// Where the relayer waits for a quorum of confirms.
    pub fn quorum_querier(&self) -> &Q {
        &self.quorum_querier
    }

    /// Where the relayer persists the confirms it relayed with.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the relay loop until it fails for good or `shutdown` fires.
    ///
    /// Every `relay_interval` the relayer catches the contract up with the
    /// source chain. A failed catch-up is re-run up to `max_retries` times,
    /// `retry_interval` apart; if it still fails the error is returned.
    /// A shutdown returns [`Error::Cancelled`].
    pub async fn run(&self, mut shutdown: Shutdown) -> Result<()> {
        tracing::event!(
            target: probe::TARGET,
            Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            started = true,
        );
        let result = tokio::select! {
            res = self.relay_forever() => res,
            _ = shutdown.recv() => {
                tracing::warn!("Stopping the relayer");
                Err(Error::Cancelled)
            }
        };
        tracing::event!(
            target: probe::TARGET,
            Level::DEBUG,
            kind = %probe::Kind::Lifecycle,
            stopped = true,
        );
        result
    }

    async fn relay_forever(&self) -> Result<()> {
        loop {
            let err = ticker::run_until_error(self.policy.relay_interval, || {
                self.catch_up()
            })
            .await;
            tracing::error!(error = %err, "relay cycle failed");
            self.retry_catch_up().await?;
        }
    }

    /// Re-runs [`Self::catch_up`] until it succeeds, fails with an error
    /// that retrying cannot fix, or the retries are used up.
    async fn retry_catch_up(&self) -> Result<()> {
        let backoff = ConstantWithMaxRetryCount::new(
            self.policy.retry_interval,
            self.policy.max_retries,
        );
        let notify = |err: Error, wait: Duration| {
            tracing::event!(
                target: probe::TARGET,
                Level::DEBUG,
                kind = %probe::Kind::Retry,
                error = %err,
                ?wait,
            );
            tracing::warn!(
                "relay cycle failed again: {}, retrying in {:?}",
                err,
                wait
            );
            if let Some(metrics) = &self.metrics {
                metrics.relay_cycle_back_off.inc();
            }
        };
        backoff::future::retry_notify(
            backoff,
            || async { self.catch_up().await.map_err(Error::into_backoff) },
            notify,
        )
        .await
    }

    /// Relays attestations until the contract is level with the source
    /// chain.
    ///
    /// The next nonce is always derived from the contract, so a retry
    /// after any failure resumes from what was actually mined.
    #[tracing::instrument(skip_all)]
    pub async fn catch_up(&self) -> Result<()> {
        loop {
            let last_contract_nonce = self.contract.last_event_nonce().await?;
            let latest_nonce =
                self.app_querier.latest_attestation_nonce().await?;
            if last_contract_nonce >= latest_nonce {
                tracing::debug!(
                    current_contract_nonce = last_contract_nonce,
                    "waiting for new nonce"
                );
                return Ok(());
            }

            let nonce = last_contract_nonce + 1;
            let attestation = self
                .app_querier
                .attestation_by_nonce(nonce)
                .await?
                .ok_or(Error::AttestationNotFound { nonce })?;
            if attestation.nonce() != nonce {
                return Err(Error::UnexpectedAttestationNonce {
                    expected: nonce,
                    found: attestation.nonce(),
                });
            }
            tracing::event!(
                target: probe::TARGET,
                Level::DEBUG,
                kind = %probe::Kind::Relay,
                nonce,
                latest_nonce,
                attestation = attestation.kind(),
            );

            let opts = self.contract.transaction_options().await?;
            let relayed = RelayedKind::of(&attestation);
            let tx_hash = self.process_attestation(opts, attestation).await?;
            self.contract.wait_for_transaction(tx_hash).await?;
            self.record_relayed(nonce, relayed);
        }
    }

    fn record_relayed(&self, nonce: u64, relayed: Option<RelayedKind>) {
        tracing::info!(nonce, "attestation relayed");
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.attestations_relayed.inc();
        metrics.last_relayed_nonce.set(nonce as f64);
        match relayed {
            Some(RelayedKind::Valset) => metrics.valset_updates_relayed.inc(),
            Some(RelayedKind::DataCommitment) => {
                metrics.data_commitments_relayed.inc()
            }
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayedKind {
    Valset,
    DataCommitment,
}

impl RelayedKind {
    fn of(attestation: &Attestation) -> Option<Self> {
        match attestation {
            Attestation::Valset(_) => Some(Self::Valset),
            Attestation::DataCommitment(_) => Some(Self::DataCommitment),
            Attestation::Unknown { .. } => None,
        }
    }
}
