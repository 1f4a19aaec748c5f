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

//! # Relayer Configuration Module 🕸️
//!
//! A module for configuring the QGB relayer.
//!
//! ## Overview
//!
//! Configuration is read from every `.toml` and `.json` file in the config
//! directory, merged with `QGB_` prefixed environment variables.
//! It has three sections:
//! * `evm`: the EVM chain hosting the QGB contract, and the key used to
//!   submit transactions to it.
//! * `source`: the endpoints of the source chain the attestations and data
//!   commitments are read from.
//! * `relayer`: timing and retry policy of the relay loop.

/// CLI configuration
#[cfg(feature = "cli")]
pub mod cli;
/// Default values for optional configuration keys.
pub mod defaults;
/// EVM configuration
pub mod evm;
/// Relay loop timing and retry configuration
pub mod relayer;
/// Source chain configuration
pub mod source;
/// Utils for processing configuration
pub mod utils;

use serde::{Deserialize, Serialize};

use evm::EvmChainConfig;
use relayer::RelayerPolicyConfig;
use source::SourceChainConfig;

/// QgbRelayerConfig is the configuration for the QGB relayer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct QgbRelayerConfig {
    /// The EVM chain the QGB contract is deployed on.
    pub evm: EvmChainConfig,
    /// The source chain producing attestations.
    pub source: SourceChainConfig,
    /// Relay loop policy.
    ///
    /// Every key has a default, so the whole section is optional.
    #[serde(default)]
    pub relayer: RelayerPolicyConfig,
}
