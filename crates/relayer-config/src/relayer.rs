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

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Timing and retry policy of the relay loop. All durations are in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelayerPolicyConfig {
    /// How often the relay loop checks for new attestations.
    #[serde(default = "defaults::relay_interval")]
    pub relay_interval: u64,
    /// How long to wait for 2/3 of the signing power to confirm an
    /// attestation.
    #[serde(default = "defaults::confirm_timeout")]
    pub confirm_timeout: u64,
    /// How often confirms are polled while waiting for 2/3 of the power.
    #[serde(default = "defaults::confirm_poll_interval")]
    pub confirm_poll_interval: u64,
    /// Delay between re-runs of a failed relay cycle.
    #[serde(default = "defaults::retry_interval")]
    pub retry_interval: u64,
    /// How many times a failed relay cycle is re-run before giving up.
    #[serde(default = "defaults::max_retries")]
    pub max_retries: usize,
}

impl Default for RelayerPolicyConfig {
    fn default() -> Self {
        Self {
            relay_interval: defaults::relay_interval(),
            confirm_timeout: defaults::confirm_timeout(),
            confirm_poll_interval: defaults::confirm_poll_interval(),
            retry_interval: defaults::retry_interval(),
            max_retries: defaults::max_retries(),
        }
    }
}

impl RelayerPolicyConfig {
    /// [`Self::relay_interval`] as a [`Duration`].
    pub fn relay_interval(&self) -> Duration {
        Duration::from_millis(self.relay_interval)
    }

    /// [`Self::confirm_timeout`] as a [`Duration`].
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout)
    }

    /// [`Self::confirm_poll_interval`] as a [`Duration`].
    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval)
    }

    /// [`Self::retry_interval`] as a [`Duration`].
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval)
    }
}
