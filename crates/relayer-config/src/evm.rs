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

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use qgb_relayer_types::{private_key::PrivateKey, rpc_url::RpcUrl};

use crate::defaults;

/// EvmChainConfig is the configuration for the EVM chain hosting the QGB
/// contract.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvmChainConfig {
    /// String that groups configuration for this chain on a human-readable name.
    pub name: String,
    /// chain specific id (output of chainId opcode on EVM networks)
    #[serde(rename(serialize = "chainId"))]
    pub chain_id: u64,
    /// Http(s) Endpoint for quick Req/Res
    #[serde(skip_serializing)]
    pub http_endpoint: RpcUrl,
    /// Block Explorer for this chain.
    ///
    /// Optional, and only used for printing a clickable links
    /// for transactions.
    #[serde(skip_serializing)]
    pub explorer: Option<url::Url>,
    /// The Private Key of the relayer account on this network
    /// the format is:
    /// 1. if it starts with '0x' then this would be raw (64 bytes) hex encoded
    ///    private key.
    ///    Example: 0x8917174396171783496173419137618235192359106130478137647163400318
    ///
    /// 2. if it starts with '$' then it would be considered as an Enviroment variable
    ///    of a hex-encoded private key.
    ///    Example: $QGB_EVM_PRIVATE_KEY
    #[serde(skip_serializing)]
    pub private_key: Option<PrivateKey>,
    /// The address of the QGB contract.
    pub contract_address: Address,
    /// Blocks to wait on top of the one including a relayed transaction
    /// before considering it final.
    #[serde(default)]
    pub block_confirmations: usize,
    /// Gas limit of relayed transactions.
    #[serde(default = "defaults::gas_limit")]
    pub gas_limit: u64,
    /// How often to poll for the receipt of a pending transaction, in
    /// milliseconds.
    #[serde(default = "defaults::tx_polling_interval")]
    pub tx_polling_interval: u64,
}

impl EvmChainConfig {
    /// [`Self::tx_polling_interval`] as a [`Duration`].
    pub fn tx_polling_interval(&self) -> Duration {
        Duration::from_millis(self.tx_polling_interval)
    }
}
