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

#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # QGB Relayer Service 🕸️
//!
//! Wires the relay loop to the configured chains and runs it in the
//! background.
//!
//! ## Overview
//!
//! The relayer watches the QGB module of the source chain for attestations
//! (validator set updates and data commitments), waits until two thirds of
//! the validator power confirmed each of them, and submits them in nonce
//! order to the QGB contract on the EVM chain.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;

use qgb_relayer::{QuorumConfirmQuerier, Relayer, RelayerPolicy};
use qgb_relayer_clients::{
    EvmContractClient, HttpAppQuerier, HttpConfirmSource,
};
use qgb_relayer_context::RelayerContext;
use qgb_relayer_store::{ConfirmStore, SledStore};

/// Type alias for [Sled](https://sled.rs)-based database store
pub type Store = SledStore;

/// The relayer running against live chains.
pub type QgbRelayer = Relayer<
    HttpAppQuerier,
    HttpAppQuerier,
    QuorumConfirmQuerier<HttpConfirmSource>,
    EvmContractClient,
    Store,
>;

/// Builds the relayer from the context's configuration.
///
/// Confirms are read from the configured confirm gateway, while the
/// context's store only keeps the confirms the relayer relayed with.
pub fn build_relayer(
    ctx: &RelayerContext,
) -> qgb_relayer_utils::Result<QgbRelayer> {
    let evm = &ctx.config.evm;
    let source = &ctx.config.source;
    let http_client = ctx.source_http_client()?;

    let app_querier = HttpAppQuerier::new(
        http_client.clone(),
        source.app_endpoint.as_url().clone(),
        source.rpc_endpoint.as_url().clone(),
    );
    let contract = EvmContractClient::new(
        ctx.evm_signer_client()?,
        evm.contract_address,
        evm.gas_limit,
        evm.tx_polling_interval(),
        evm.block_confirmations,
        evm.explorer.clone(),
    );
    let quorum_querier = QuorumConfirmQuerier::new(HttpConfirmSource::new(
        http_client,
        source.confirm_endpoint().clone(),
    ));

    let relayer = Relayer::builder()
        .app_querier(app_querier.clone())
        .commitment_querier(app_querier)
        .quorum_querier(quorum_querier)
        .contract(contract)
        .store(ctx.store().clone())
        .policy(RelayerPolicy::from(&ctx.config.relayer))
        .metrics(ctx.metrics.clone())
        .build();
    Ok(relayer)
}

/// Starts the relayer on a background task.
///
/// The task ends when the relayer gives up or the context shuts down, and
/// resolves to the relayer's outcome.
pub fn ignite(
    ctx: &RelayerContext,
) -> qgb_relayer_utils::Result<JoinHandle<qgb_relayer_utils::Result<()>>> {
    tracing::debug!(
        "Relayer configuration: {}",
        serde_json::to_string_pretty(&ctx.config)?
    );
    let relayer = build_relayer(ctx)?;
    let shutdown = ctx.shutdown_signal();
    tracing::debug!(
        contract = ?ctx.config.evm.contract_address,
        chain = %ctx.config.evm.name,
        "Starting the QGB relayer",
    );
    let handle = tokio::spawn(async move {
        let result = relayer.run(shutdown).await;
        match &result {
            Err(qgb_relayer_utils::Error::Cancelled) => {
                tracing::info!("QGB relayer stopped");
            }
            Err(e) => tracing::error!("QGB relayer stopped with error: {}", e),
            Ok(()) => {}
        }
        result
    });
    Ok(handle)
}

/// Refreshes the stored data size metric every hour.
pub fn start_data_stored_metric(ctx: &RelayerContext) -> JoinHandle<()> {
    let store = ctx.store().clone();
    let metrics = ctx.metrics.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            metrics
                .total_amount_of_data_stored
                .set(store.data_stored_size() as f64);
        }
    })
}
