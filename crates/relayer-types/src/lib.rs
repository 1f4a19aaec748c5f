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

//! Core data types of the QGB relayer: attestations produced by the source
//! chain, the validator sets that sign them, and the per-validator confirms
//! that carry those signatures.

/// Attestations: validator set updates and data commitments.
pub mod attestation;
/// Per-validator confirms over an attestation.
pub mod confirm;
pub mod private_key;
pub mod rpc_url;
/// Decoding of 65-byte ECDSA signatures into their `(v, r, s)` parts.
pub mod signature;
/// Validator sets and their signing power.
pub mod valset;

pub use attestation::{Attestation, DataCommitment};
pub use confirm::{Confirm, DataCommitmentConfirm, ValsetConfirm};
pub use signature::Vrs;
pub use valset::{BridgeValidator, Valset};

/// Deserializes a `u64` that may be encoded as either a JSON number or a
/// decimal string, as protobuf JSON gateways do for 64-bit integers.
pub mod u64_string {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => {
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    }
}
