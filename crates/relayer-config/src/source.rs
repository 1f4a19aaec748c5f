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
use url::Url;

use qgb_relayer_types::rpc_url::RpcUrl;

use crate::defaults;

/// SourceChainConfig describes where attestations, validator sets and data
/// commitments are read from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceChainConfig {
    /// REST gateway of the source chain application, serving the QGB
    /// attestation queries.
    #[serde(skip_serializing)]
    pub app_endpoint: RpcUrl,
    /// Consensus RPC endpoint, serving data commitments.
    #[serde(skip_serializing)]
    pub rpc_endpoint: RpcUrl,
    /// Gateway serving the confirms broadcast by the orchestrators.
    ///
    /// Defaults to [`Self::app_endpoint`].
    #[serde(default, skip_serializing)]
    pub confirm_endpoint: Option<RpcUrl>,
    /// Timeout of a single request, in milliseconds.
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout: u64,
}

impl SourceChainConfig {
    /// [`Self::request_timeout`] as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    /// Where the orchestrators' confirms are read from.
    pub fn confirm_endpoint(&self) -> &Url {
        self.confirm_endpoint
            .as_ref()
            .unwrap_or(&self.app_endpoint)
            .as_url()
    }
}
