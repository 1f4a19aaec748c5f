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

//! QGB Relayer Binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use tokio::signal::unix;

use qgb_relayer_config::cli::{create_store, load_config, setup_logger, Opts};
use qgb_relayer_context::RelayerContext;
use qgb_relayer_utils::probe;

/// The main entry point for the relayer.
///
/// # Arguments
///
/// * `args` - The command line arguments.
#[paw::main]
#[tokio::main]
async fn main(args: Opts) -> anyhow::Result<()> {
    setup_logger(args.verbose)?;
    match dotenv::dotenv() {
        Ok(_) => {
            tracing::trace!("Loaded .env file");
        }
        Err(e) => {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    // The configuration is validated and configured from the given directory
    let config = load_config(args.config_dir.clone())?;

    // persistent storage for the confirms the relayer collects
    let store = create_store(&args)?;

    let ctx = RelayerContext::new(config, store)?;
    let data_metric_handle =
        qgb_relayer_service::start_data_stored_metric(&ctx);
    let mut relayer_handle = qgb_relayer_service::ignite(&ctx)?;
    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        started = true
    );

    // watch for signals
    let mut ctrlc_signal = unix::signal(unix::SignalKind::interrupt())?;
    let mut termination_signal = unix::signal(unix::SignalKind::terminate())?;
    let mut quit_signal = unix::signal(unix::SignalKind::quit())?;
    let outcome = tokio::select! {
        _ = ctrlc_signal.recv() => {
            tracing::warn!("Interrupted (Ctrl+C) ...");
            Ok(())
        },
        _ = termination_signal.recv() => {
            tracing::warn!("Got Terminate signal ...");
            Ok(())
        },
        _ = quit_signal.recv() => {
            tracing::warn!("Quitting ...");
            Ok(())
        },
        res = &mut relayer_handle => match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(anyhow::Error::from(e)),
            Err(e) => Err(anyhow::Error::from(e)),
        },
    };

    tracing::event!(
        target: probe::TARGET,
        tracing::Level::DEBUG,
        kind = %probe::Kind::Lifecycle,
        shutdown = true
    );
    tracing::warn!("Shutting down...");
    // send shutdown signal to all of the application.
    ctx.shutdown();
    data_metric_handle.abort();
    if !relayer_handle.is_finished() {
        let _ = relayer_handle.await;
    }
    match ctx.metrics.gather() {
        Ok(metrics) => tracing::debug!("Final metrics:\n{}", metrics),
        Err(e) => tracing::warn!("Failed to gather metrics: {}", e),
    }
    tracing::info!("Clean Exit ..");
    outcome
}
