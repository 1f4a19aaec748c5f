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

use std::collections::HashMap;

use ethers::types::Address;

use qgb_relayer_types::{Confirm, Valset, Vrs};
use qgb_relayer_utils::{Error, Result};

/// Indexes the signatures carried by `confirms` by signer.
///
/// If a signer shows up more than once, its first confirm wins.
pub fn signatures_by_signer<C: Confirm>(
    confirms: &[C],
) -> HashMap<Address, String> {
    let mut signatures = HashMap::with_capacity(confirms.len());
    for confirm in confirms {
        signatures
            .entry(confirm.evm_address())
            .or_insert_with(|| confirm.signature().to_owned());
    }
    signatures
}

/// Lays `signatures` out in the order of `valset`'s members, the order the
/// QGB contract checks them in.
///
/// Members that did not sign get [`Vrs::EMPTY`]. Fails on the first
/// signature that cannot be decoded; signatures from non-members are
/// ignored.
pub fn match_attestation_confirm_sigs(
    signatures: &HashMap<Address, String>,
    valset: &Valset,
) -> Result<Vec<Vrs>> {
    valset
        .members
        .iter()
        .map(|member| match signatures.get(&member.evm_address) {
            None => Ok(Vrs::EMPTY),
            Some(sig) => sig.parse::<Vrs>().map_err(|e| {
                Error::MalformedSignature {
                    signer: format!("{:?}", member.evm_address),
                    reason: e.to_string(),
                }
            }),
        })
        .collect()
}
