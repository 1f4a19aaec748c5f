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

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use ethers::types::H256;
use tracing::Level;

use qgb_relayer_store::{ConfirmStore, ConfirmStoreExt};
use qgb_relayer_types::signature::is_signed_by;
use qgb_relayer_types::{
    Confirm, DataCommitmentConfirm, Valset, ValsetConfirm,
};
use qgb_relayer_utils::{probe, Error, Result};

use crate::traits::{ConfirmSource, QuorumQuerier};

/// Reads confirms from a confirm store that something other than the
/// relayer writes into, such as an in-process gossip layer.
#[derive(Debug, Clone)]
pub struct StoreConfirmSource<S> {
    store: S,
}

impl<S> StoreConfirmSource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: ConfirmStore> ConfirmSource for StoreConfirmSource<S> {
    async fn valset_confirms(&self, nonce: u64) -> Result<Vec<ValsetConfirm>> {
        self.store.confirms_for_nonce(nonce)
    }

    async fn data_commitment_confirms(
        &self,
        nonce: u64,
    ) -> Result<Vec<DataCommitmentConfirm>> {
        self.store.confirms_for_nonce(nonce)
    }
}

/// A [`QuorumQuerier`] polling a [`ConfirmSource`] until enough power
/// signed.
#[derive(Debug, Clone)]
pub struct QuorumConfirmQuerier<S> {
    source: S,
}

impl<S> QuorumConfirmQuerier<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Where confirms are read from.
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Keeps the confirms that count towards `valset`'s quorum over
/// `sign_bytes`, returning them with the power they add up to.
///
/// A confirm counts if its signer is a member not seen before, it signed
/// exactly `sign_bytes`, and its signature checks out.
fn select_quorum<C: Confirm>(
    valset: &Valset,
    sign_bytes: H256,
    confirms: Vec<C>,
) -> (u64, Vec<C>) {
    let mut seen = HashSet::new();
    let mut power = 0u64;
    let mut accepted = Vec::new();
    for confirm in confirms {
        let signer = confirm.evm_address();
        let Some(member_power) = valset.power_of(&signer) else {
            tracing::trace!(?signer, "ignoring confirm from non member");
            continue;
        };
        if confirm.sign_bytes() != sign_bytes {
            tracing::trace!(?signer, "ignoring confirm over other sign bytes");
            continue;
        }
        if seen.contains(&signer) {
            continue;
        }
        if !is_signed_by(confirm.signature(), sign_bytes, signer) {
            tracing::warn!(?signer, "ignoring confirm with invalid signature");
            continue;
        }
        seen.insert(signer);
        power = power.saturating_add(member_power);
        accepted.push(confirm);
    }
    (power, accepted)
}

/// Polls `fetch` every `poll_interval` until the confirms it returns reach
/// `valset`'s threshold.
async fn poll_quorum<C, F, Fut>(
    nonce: u64,
    valset: &Valset,
    sign_bytes: H256,
    poll_interval: Duration,
    fetch: F,
) -> Result<Vec<C>>
where
    C: Confirm,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<C>>>,
{
    let threshold = valset.two_thirds_threshold();
    loop {
        let confirms = fetch().await?;
        let (power, accepted) = select_quorum(valset, sign_bytes, confirms);
        tracing::event!(
            target: probe::TARGET,
            Level::DEBUG,
            kind = %probe::Kind::Quorum,
            nonce,
            power,
            threshold,
            signers = accepted.len(),
        );
        if power >= threshold {
            tracing::debug!(
                nonce,
                power,
                threshold,
                "found enough confirms to relay"
            );
            return Ok(accepted);
        }
        tracing::debug!(
            nonce,
            power,
            threshold,
            "waiting for more confirms"
        );
        tokio::time::sleep(poll_interval).await;
    }
}

async fn with_deadline<C, Fut>(
    nonce: u64,
    timeout: Duration,
    poll: Fut,
) -> Result<Vec<C>>
where
    Fut: Future<Output = Result<Vec<C>>>,
{
    match tokio::time::timeout(timeout, poll).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(nonce, ?timeout, "gave up waiting for confirms");
            Err(Error::QuorumTimeout { nonce, timeout })
        }
    }
}

#[async_trait::async_trait]
impl<S: ConfirmSource> QuorumQuerier for QuorumConfirmQuerier<S> {
    #[tracing::instrument(
        skip(self, valset),
        fields(valset_nonce = valset.nonce)
    )]
    async fn two_thirds_valset_confirms(
        &self,
        timeout: Duration,
        poll_interval: Duration,
        nonce: u64,
        valset: &Valset,
        sign_bytes: H256,
    ) -> Result<Vec<ValsetConfirm>> {
        let poll = poll_quorum(nonce, valset, sign_bytes, poll_interval, || {
            self.source.valset_confirms(nonce)
        });
        with_deadline(nonce, timeout, poll).await
    }

    #[tracing::instrument(
        skip(self, valset),
        fields(valset_nonce = valset.nonce)
    )]
    async fn two_thirds_data_commitment_confirms(
        &self,
        timeout: Duration,
        poll_interval: Duration,
        nonce: u64,
        valset: &Valset,
        sign_bytes: H256,
    ) -> Result<Vec<DataCommitmentConfirm>> {
        let poll = poll_quorum(nonce, valset, sign_bytes, poll_interval, || {
            self.source.data_commitment_confirms(nonce)
        });
        with_deadline(nonce, timeout, poll).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};
    use qgb_relayer_store::InMemoryStore;
    use qgb_relayer_types::BridgeValidator;
    use tokio::time::Instant;

    const KEYS: [&str; 3] = [
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ];

    fn wallets() -> Vec<LocalWallet> {
        KEYS.iter().map(|k| k.parse().unwrap()).collect()
    }

    fn valset_of(wallets: &[LocalWallet], powers: &[u64]) -> Valset {
        let members = wallets
            .iter()
            .zip(powers)
            .map(|(w, p)| BridgeValidator {
                power: *p,
                evm_address: w.address(),
            })
            .collect();
        Valset::new(1, 0, members)
    }

    async fn confirm(
        wallet: &LocalWallet,
        nonce: u64,
        sign_bytes: H256,
    ) -> ValsetConfirm {
        let sig = wallet.sign_message(sign_bytes.as_bytes()).await.unwrap();
        ValsetConfirm {
            nonce,
            evm_address: wallet.address(),
            signature: format!("0x{sig}"),
            sign_bytes,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_once_threshold_is_reached() {
        let wallets = wallets();
        // threshold is 167 out of 250.
        let current = valset_of(&wallets, &[100, 100, 50]);
        let sign_bytes = H256::repeat_byte(0x42);
        let store = InMemoryStore::default();
        let querier =
            QuorumConfirmQuerier::new(StoreConfirmSource::new(store.clone()));

        store
            .save_confirms(&[confirm(&wallets[0], 2, sign_bytes).await])
            .unwrap();
        let late = confirm(&wallets[1], 2, sign_bytes).await;
        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            writer.save_confirms(&[late]).unwrap();
        });

        let start = Instant::now();
        let confirms = querier
            .two_thirds_valset_confirms(
                Duration::from_secs(60),
                Duration::from_secs(10),
                2,
                &current,
                sign_bytes,
            )
            .await
            .unwrap();
        assert_eq!(confirms.len(), 2);
        // picked up by the poll at t=30.
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_enough_power() {
        let wallets = wallets();
        let sign_bytes = H256::repeat_byte(0x42);
        let store = InMemoryStore::default();
        // 199 out of 300 is short of the 200 threshold.
        let current = valset_of(&wallets, &[100, 99, 101]);
        store
            .save_confirms(&[
                confirm(&wallets[0], 2, sign_bytes).await,
                confirm(&wallets[1], 2, sign_bytes).await,
            ])
            .unwrap();
        let querier = QuorumConfirmQuerier::new(StoreConfirmSource::new(store));

        let err = querier
            .two_thirds_valset_confirms(
                Duration::from_secs(30),
                Duration::from_secs(10),
                2,
                &current,
                sign_bytes,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuorumTimeout { nonce: 2, .. }));
    }

    #[tokio::test]
    async fn ignores_outsiders_forgeries_and_stale_sign_bytes() {
        let wallets = wallets();
        let current = valset_of(&wallets[..2], &[10, 10]);
        let sign_bytes = H256::repeat_byte(0x42);

        let outsider = confirm(&wallets[2], 2, sign_bytes).await;
        let stale = confirm(&wallets[0], 2, H256::zero()).await;
        let mut forged = confirm(&wallets[1], 2, sign_bytes).await;
        forged.evm_address = wallets[0].address();
        let honest = confirm(&wallets[1], 2, sign_bytes).await;
        let duplicate = honest.clone();

        let (power, accepted) = select_quorum(
            &current,
            sign_bytes,
            vec![outsider, stale, forged, honest.clone(), duplicate],
        );
        assert_eq!(power, 10);
        assert_eq!(accepted, vec![honest]);
    }

    #[tokio::test]
    async fn partial_quorum_leaves_empty_slots() {
        use crate::signatures::{
            match_attestation_confirm_sigs, signatures_by_signer,
        };
        use qgb_relayer_types::Vrs;

        let wallets = wallets();
        let current = valset_of(&wallets, &[1, 1, 1]);
        let sign_bytes = H256::repeat_byte(0x07);
        let confirms = vec![
            confirm(&wallets[0], 2, sign_bytes).await,
            confirm(&wallets[2], 2, sign_bytes).await,
        ];

        let (power, accepted) = select_quorum(&current, sign_bytes, confirms);
        assert!(power >= current.two_thirds_threshold());
        let by_signer = signatures_by_signer(&accepted);
        let slots =
            match_attestation_confirm_sigs(&by_signer, &current).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0], accepted[0].signature.parse::<Vrs>().unwrap());
        assert!(slots[1].is_empty());
        assert_eq!(slots[2], accepted[1].signature.parse::<Vrs>().unwrap());
    }
}
