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

#![warn(missing_docs)]
//! # Relayer Context Module 🕸️
//!
//! A module for managing the context of the relayer.

use std::convert::TryFrom;
use std::sync::Arc;

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use tokio::sync::broadcast;

use qgb_relayer_config::QgbRelayerConfig;
use qgb_relayer_store::SledStore;
use qgb_relayer_utils::metric::Metrics;
use qgb_relayer_utils::EthersSignerClient;

/// RelayerContext contains Relayer's configuration and shutdown signal.
#[derive(Clone)]
pub struct RelayerContext {
    /// The configuration of the relayer.
    pub config: QgbRelayerConfig,
    /// Broadcasts a shutdown signal to all active connections.
    ///
    /// The initial `shutdown` trigger is provided by the `run` caller. The
    /// server is responsible for gracefully shutting down active connections.
    /// When a connection task is spawned, it is passed a broadcast receiver
    /// handle. When a graceful shutdown is initiated, a `()` value is sent via
    /// the broadcast::Sender. Each active connection receives it, reaches a
    /// safe terminal state, and completes the task.
    notify_shutdown: broadcast::Sender<()>,
    /// Represents the metrics for the relayer
    pub metrics: Arc<Metrics>,
    store: SledStore,
}

impl RelayerContext {
    /// Creates a new RelayerContext.
    pub fn new(
        config: QgbRelayerConfig,
        store: SledStore,
    ) -> qgb_relayer_utils::Result<Self> {
        let (notify_shutdown, _) = broadcast::channel(2);
        let metrics = Arc::new(Metrics::new()?);
        Ok(Self {
            config,
            notify_shutdown,
            metrics,
            store,
        })
    }

    /// Returns a broadcast receiver handle for the shutdown signal.
    pub fn shutdown_signal(&self) -> Shutdown {
        Shutdown::new(self.notify_shutdown.subscribe())
    }

    /// Sends a shutdown signal to all subscribed tasks/connections.
    pub fn shutdown(&self) {
        let _ = self.notify_shutdown.send(());
    }

    /// Returns a new `EthereumProvider` for the configured EVM chain,
    /// polling at the configured transaction polling interval.
    pub fn evm_provider(&self) -> qgb_relayer_utils::Result<Provider<Http>> {
        let evm = &self.config.evm;
        let provider = Provider::try_from(evm.http_endpoint.as_str())?
            .interval(evm.tx_polling_interval());
        Ok(provider)
    }

    /// Returns the wallet relayed transactions are signed with.
    pub fn evm_wallet(&self) -> qgb_relayer_utils::Result<LocalWallet> {
        let evm = &self.config.evm;
        let private_key = evm
            .private_key
            .as_ref()
            .ok_or(qgb_relayer_utils::Error::MissingSecrets)?;
        let wallet = private_key.to_wallet(evm.chain_id)?;
        Ok(wallet)
    }

    /// Returns a client that signs and sends transactions to the configured
    /// EVM chain.
    pub fn evm_signer_client(
        &self,
    ) -> qgb_relayer_utils::Result<Arc<EthersSignerClient>> {
        let provider = self.evm_provider()?;
        let wallet = self.evm_wallet()?;
        Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
    }

    /// Returns the HTTP client used to query the source chain.
    pub fn source_http_client(
        &self,
    ) -> qgb_relayer_utils::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.config.source.request_timeout())
            .user_agent(concat!("qgb-relayer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }

    /// Returns [Sled](https://sled.rs)-based database store
    pub fn store(&self) -> &SledStore {
        &self.store
    }
}

/// Listens for the server shutdown signal.
///
/// Shutdown is signalled using a `broadcast::Receiver`. Only a single value is
/// ever sent. Once a value has been sent via the broadcast channel, the server
/// should shutdown.
///
/// The `Shutdown` struct listens for the signal and tracks that the signal has
/// been received. Callers may query for whether the shutdown signal has been
/// received or not.
#[derive(Debug)]
pub struct Shutdown {
    /// `true` if the shutdown signal has been received
    shutdown: bool,

    /// The receive half of the channel used to listen for shutdown.
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    /// Create a new `Shutdown` backed by the given `broadcast::Receiver`.
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            shutdown: false,
            notify,
        }
    }

    /// Returns `true` if the shutdown signal has been received.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Receive the shutdown notice, waiting if necessary.
    pub async fn recv(&mut self) {
        if self.shutdown {
            return;
        }

        // Cannot receive a "lag error" as only one value is ever sent. A
        // closed channel means every sender is gone, which is a shutdown too.
        let _ = self.notify.recv().await;

        self.shutdown = true;
    }
}
