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

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};

use crate::attestation::data_commitment_sign_bytes;

/// A single validator's signature over an attestation.
pub trait Confirm {
    /// Short tag used to namespace this confirm kind in the store.
    const NAMESPACE: &'static str;

    fn nonce(&self) -> u64;
    fn evm_address(&self) -> Address;
    /// Hex encoded 65-byte `r || s || v` signature.
    fn signature(&self) -> &str;
    /// The digest that was signed.
    fn sign_bytes(&self) -> H256;
}

/// A validator's approval of the validator set at `nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValsetConfirm {
    #[serde(with = "crate::u64_string")]
    pub nonce: u64,
    pub evm_address: Address,
    pub signature: String,
    pub sign_bytes: H256,
}

impl Confirm for ValsetConfirm {
    const NAMESPACE: &'static str = "vc";

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn evm_address(&self) -> Address {
        self.evm_address
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn sign_bytes(&self) -> H256 {
        self.sign_bytes
    }
}

/// A validator's approval of the data root tuple root committed at `nonce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCommitmentConfirm {
    #[serde(with = "crate::u64_string")]
    pub nonce: u64,
    pub evm_address: Address,
    pub signature: String,
    /// The data root tuple root the validator signed over.
    pub commitment: H256,
}

impl Confirm for DataCommitmentConfirm {
    const NAMESPACE: &'static str = "dcc";

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn evm_address(&self) -> Address {
        self.evm_address
    }

    fn signature(&self) -> &str {
        &self.signature
    }

    fn sign_bytes(&self) -> H256 {
        data_commitment_sign_bytes(self.nonce, self.commitment)
    }
}
