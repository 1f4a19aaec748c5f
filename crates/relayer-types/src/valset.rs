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
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

/// Right pads an ASCII tag to 32 bytes, the way the QGB contract declares
/// its domain separators.
pub(crate) const fn domain_separator(tag: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < tag.len() && i < 32 {
        out[i] = tag[i];
        i += 1;
    }
    out
}

/// `bytes32("checkpoint")`
pub const VALSET_DOMAIN_SEPARATOR: [u8; 32] = domain_separator(b"checkpoint");

/// A validator as seen by the QGB contract: an EVM address and its power.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeValidator {
    #[serde(with = "crate::u64_string")]
    pub power: u64,
    pub evm_address: Address,
}

/// An ordered validator set at a given attestation nonce.
///
/// Member order is significant: it is the order the contract expects
/// signatures in, and the order used to compute the set hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valset {
    #[serde(with = "crate::u64_string")]
    pub nonce: u64,
    pub members: Vec<BridgeValidator>,
    #[serde(with = "crate::u64_string", default)]
    pub height: u64,
}

impl Valset {
    pub fn new(nonce: u64, height: u64, members: Vec<BridgeValidator>) -> Self {
        Self {
            nonce,
            members,
            height,
        }
    }

    pub fn total_power(&self) -> u64 {
        self.members
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.power))
    }

    /// The signing power needed to move the contract forward with this set:
    /// the smallest integer that is at least two thirds of the total power.
    pub fn two_thirds_threshold(&self) -> u64 {
        let total = u128::from(self.total_power());
        ((2 * total + 2) / 3) as u64
    }

    /// Returns the power of `address` if it is a member of this set.
    pub fn power_of(&self, address: &Address) -> Option<u64> {
        self.members
            .iter()
            .find(|m| &m.evm_address == address)
            .map(|m| m.power)
    }

    /// The members encoded as the contract's `Validator[]` tuple array.
    pub fn to_abi_validators(&self) -> Token {
        Token::Array(
            self.members
                .iter()
                .map(|m| {
                    Token::Tuple(vec![
                        Token::Address(m.evm_address),
                        Token::Uint(U256::from(m.power)),
                    ])
                })
                .collect(),
        )
    }

    /// `keccak256(abi.encode(Validator[]))`, the validator set hash stored
    /// by the contract.
    pub fn hash(&self) -> H256 {
        H256(keccak256(abi::encode(&[self.to_abi_validators()])))
    }

    /// The digest validators sign to approve this set as the next one.
    pub fn sign_bytes(&self) -> H256 {
        let encoded = abi::encode(&[
            Token::FixedBytes(VALSET_DOMAIN_SEPARATOR.to_vec()),
            Token::Uint(U256::from(self.nonce)),
            Token::Uint(U256::from(self.two_thirds_threshold())),
            Token::FixedBytes(self.hash().as_bytes().to_vec()),
        ]);
        H256(keccak256(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(byte: u8, power: u64) -> BridgeValidator {
        BridgeValidator {
            power,
            evm_address: Address::repeat_byte(byte),
        }
    }

    #[test]
    fn threshold_rounds_two_thirds_up() {
        let set = Valset::new(1, 10, vec![member(1, 1); 3]);
        assert_eq!(set.two_thirds_threshold(), 2);

        let set = Valset::new(1, 10, vec![member(1, 100); 3]);
        assert_eq!(set.total_power(), 300);
        assert_eq!(set.two_thirds_threshold(), 200);

        let set = Valset::new(1, 10, vec![member(1, 5), member(2, 5)]);
        assert_eq!(set.two_thirds_threshold(), 7);

        let set = Valset::new(1, 10, vec![member(1, u64::MAX), member(2, 1)]);
        assert_eq!(set.two_thirds_threshold(), 12_297_829_382_473_034_410);

        let empty = Valset::new(1, 10, vec![]);
        assert_eq!(empty.two_thirds_threshold(), 0);
    }

    #[test]
    fn sign_bytes_depend_on_member_order() {
        let a = Valset::new(2, 10, vec![member(1, 10), member(2, 20)]);
        let b = Valset::new(2, 10, vec![member(2, 20), member(1, 10)]);
        assert_eq!(a.sign_bytes(), a.clone().sign_bytes());
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.sign_bytes(), b.sign_bytes());

        let mut c = a.clone();
        c.nonce = 3;
        assert_eq!(a.hash(), c.hash());
        assert_ne!(a.sign_bytes(), c.sign_bytes());
    }

    #[test]
    fn separator_is_right_padded() {
        assert_eq!(&VALSET_DOMAIN_SEPARATOR[..10], b"checkpoint");
        assert!(VALSET_DOMAIN_SEPARATOR[10..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decodes_gateway_json() {
        let json = r#"{
            "nonce": "4",
            "height": "120",
            "members": [
                {"power": "1000", "evm_address": "0x9c2B12b5a07FC6D719Ed7646e5041A7E85758329"}
            ]
        }"#;
        let set: Valset = serde_json::from_str(json).expect("valid valset");
        assert_eq!(set.nonce, 4);
        assert_eq!(set.members[0].power, 1000);
        assert_eq!(set.power_of(&set.members[0].evm_address), Some(1000));
    }
}
