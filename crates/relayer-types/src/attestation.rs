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

use ethers::abi::{self, Token};
use ethers::types::{H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::valset::{domain_separator, Valset};

/// `bytes32("transactionBatch")`
pub const DATA_COMMITMENT_DOMAIN_SEPARATOR: [u8; 32] =
    domain_separator(b"transactionBatch");

/// A request to commit to the data roots of the source chain blocks in
/// `[begin_block, end_block)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCommitment {
    #[serde(with = "crate::u64_string")]
    pub nonce: u64,
    #[serde(with = "crate::u64_string")]
    pub begin_block: u64,
    #[serde(with = "crate::u64_string")]
    pub end_block: u64,
}

impl DataCommitment {
    /// The digest validators sign to approve `commitment`, the data root
    /// tuple root of this range, at this nonce.
    pub fn sign_bytes(&self, commitment: H256) -> H256 {
        data_commitment_sign_bytes(self.nonce, commitment)
    }
}

/// `keccak256(abi.encode(DATA_COMMITMENT_DOMAIN_SEPARATOR, nonce, commitment))`
pub fn data_commitment_sign_bytes(nonce: u64, commitment: H256) -> H256 {
    let encoded = abi::encode(&[
        Token::FixedBytes(DATA_COMMITMENT_DOMAIN_SEPARATOR.to_vec()),
        Token::Uint(U256::from(nonce)),
        Token::FixedBytes(commitment.as_bytes().to_vec()),
    ]);
    H256(keccak256(encoded))
}

/// A unit of work for the relayer, identified by a strictly increasing nonce
/// shared by every kind of attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attestation {
    Valset(Valset),
    DataCommitment(DataCommitment),
    /// An attestation kind this relayer does not know how to relay.
    Unknown { nonce: u64, type_url: String },
}

impl Attestation {
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Valset(v) => v.nonce,
            Self::DataCommitment(dc) => dc.nonce,
            Self::Unknown { nonce, .. } => *nonce,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Valset(_) => "valset",
            Self::DataCommitment(_) => "data_commitment",
            Self::Unknown { type_url, .. } => type_url,
        }
    }

    /// Decodes an `@type`-tagged attestation, as returned by the source
    /// chain's query gateway.
    ///
    /// Attestation kinds other than validator sets and data commitments
    /// decode into [`Attestation::Unknown`] so the caller decides what to do
    /// with them.
    pub fn from_json(
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Tagged {
            #[serde(rename = "@type", default)]
            type_url: String,
            #[serde(with = "crate::u64_string")]
            nonce: u64,
        }

        let tagged = Tagged::deserialize(&value)?;
        let type_name = tagged.type_url.rsplit('.').next().unwrap_or_default();
        match type_name {
            "Valset" => serde_json::from_value(value).map(Self::Valset),
            "DataCommitment" => {
                serde_json::from_value(value).map(Self::DataCommitment)
            }
            _ => Ok(Self::Unknown {
                nonce: tagged.nonce,
                type_url: tagged.type_url,
            }),
        }
    }
}
