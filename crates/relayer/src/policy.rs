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

use std::time::Duration;

use qgb_relayer_config::relayer::RelayerPolicyConfig;

/// Timing of the relay loop and of its two retry tiers.
///
/// The inner tier is the confirm polling (`confirm_poll_interval` up to
/// `confirm_timeout`), the outer one re-runs a whole failed relay cycle
/// (`retry_interval`, `max_retries` times).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayerPolicy {
    pub relay_interval: Duration,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
    pub retry_interval: Duration,
    pub max_retries: usize,
}

impl Default for RelayerPolicy {
    fn default() -> Self {
        Self::from(&RelayerPolicyConfig::default())
    }
}

impl From<&RelayerPolicyConfig> for RelayerPolicy {
    fn from(config: &RelayerPolicyConfig) -> Self {
        Self {
            relay_interval: config.relay_interval(),
            confirm_timeout: config.confirm_timeout(),
            confirm_poll_interval: config.confirm_poll_interval(),
            retry_interval: config.retry_interval(),
            max_retries: config.max_retries,
        }
    }
}
