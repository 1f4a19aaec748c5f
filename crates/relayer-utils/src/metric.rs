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

use prometheus::core::{AtomicF64, GenericCounter, GenericGauge};
use prometheus::{
    register_counter_with_registry, register_gauge_with_registry, Encoder,
    Registry, TextEncoder,
};

/// A struct definition for collecting metrics in the relayer.
///
/// Every instance owns its own [`Registry`], so several relayers (or
/// tests) can live in the same process.
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    /// Total attestations relayed to the EVM chain.
    pub attestations_relayed: GenericCounter<AtomicF64>,
    /// Validator set updates relayed.
    pub valset_updates_relayed: GenericCounter<AtomicF64>,
    /// Data commitments relayed.
    pub data_commitments_relayed: GenericCounter<AtomicF64>,
    /// Confirms newly persisted to the confirm store.
    pub confirms_stored: GenericCounter<AtomicF64>,
    /// How many times a relay cycle failed and backed off.
    pub relay_cycle_back_off: GenericCounter<AtomicF64>,
    /// The last attestation nonce known to be relayed.
    pub last_relayed_nonce: GenericGauge<AtomicF64>,
    /// Total amount of data stored metric
    pub total_amount_of_data_stored: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Instantiates the various metrics and their counters, also creates a
    /// registry for the counters and registers the counters
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("qgb".into()), None)?;

        let attestations_relayed = register_counter_with_registry!(
            "attestations_relayed",
            "The total number of attestations relayed to the EVM chain",
            registry
        )?;

        let valset_updates_relayed = register_counter_with_registry!(
            "valset_updates_relayed",
            "The total number of validator set updates relayed",
            registry
        )?;

        let data_commitments_relayed = register_counter_with_registry!(
            "data_commitments_relayed",
            "The total number of data commitments relayed",
            registry
        )?;

        let confirms_stored = register_counter_with_registry!(
            "confirms_stored",
            "The total number of confirms written to the confirm store",
            registry
        )?;

        let relay_cycle_back_off = register_counter_with_registry!(
            "relay_cycle_back_off",
            "specifies how many times the relay loop backed off",
            registry
        )?;

        let last_relayed_nonce = register_gauge_with_registry!(
            "last_relayed_nonce",
            "The last attestation nonce relayed to the EVM chain",
            registry
        )?;

        let total_amount_of_data_stored = register_gauge_with_registry!(
            "total_amount_of_data_stored",
            "The Total number of data stored",
            registry
        )?;

        Ok(Self {
            registry,
            attestations_relayed,
            valset_updates_relayed,
            data_commitments_relayed,
            confirms_stored,
            relay_cycle_back_off,
            last_relayed_nonce,
            total_amount_of_data_stored,
        })
    }

    /// Gathers the whole relayer metrics in the prometheus text format.
    pub fn gather(&self) -> Result<String, GatherMetricsError> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatherMetricsError {
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    #[error(transparent)]
    FromUtf8Error(#[from] std::string::FromUtf8Error),
}
