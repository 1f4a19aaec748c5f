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

use std::str::FromStr;

use ethers::types::{Address, Signature, SignatureError, H256};

/// An ECDSA signature split into the components the QGB contract takes.
///
/// The all-zero value stands for "this validator did not sign".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vrs {
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

#[derive(Debug, thiserror::Error)]
pub enum VrsError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u64),
}

impl Vrs {
    pub const EMPTY: Vrs = Vrs {
        v: 0,
        r: [0u8; 32],
        s: [0u8; 32],
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl TryFrom<Signature> for Vrs {
    type Error = VrsError;

    fn try_from(sig: Signature) -> Result<Self, Self::Error> {
        // Some signers emit the raw recovery id, the contract wants 27/28.
        let v = match sig.v {
            0 | 1 => sig.v + 27,
            27 | 28 => sig.v,
            other => return Err(VrsError::InvalidRecoveryId(other)),
        };
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        sig.r.to_big_endian(&mut r);
        sig.s.to_big_endian(&mut s);
        Ok(Self { v: v as u8, r, s })
    }
}

impl FromStr for Vrs {
    type Err = VrsError;

    /// Parses a hex encoded (optionally `0x` prefixed) 65-byte
    /// `r || s || v` signature.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sig = Signature::from_str(s)?;
        Self::try_from(sig)
    }
}

/// Checks that `signature` is an EIP-191 signature of `digest` by `signer`,
/// which is what the QGB contract verifies on chain.
pub fn is_signed_by(signature: &str, digest: H256, signer: Address) -> bool {
    Signature::from_str(signature)
        .and_then(|sig| sig.verify(digest.as_bytes(), signer))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};

    const KEY: &str =
        "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[tokio::test]
    async fn splits_wallet_signature() {
        let wallet = LocalWallet::from_str(KEY).expect("valid key");
        let digest = H256::repeat_byte(7);
        let sig = wallet
            .sign_message(digest.as_bytes())
            .await
            .expect("signs");
        let hex_sig = format!("0x{sig}");

        let vrs: Vrs = hex_sig.parse().expect("decodes");
        assert!(vrs.v == 27 || vrs.v == 28);
        assert_eq!(&vrs.r[..], &sig.to_vec()[..32]);
        assert_eq!(&vrs.s[..], &sig.to_vec()[32..64]);
        assert!(is_signed_by(&hex_sig, digest, wallet.address()));
        assert!(!is_signed_by(&hex_sig, H256::zero(), wallet.address()));
    }

    #[test]
    fn normalizes_raw_recovery_id() {
        let mut bytes = vec![1u8; 64];
        bytes.push(1);
        let vrs: Vrs = hex::encode(&bytes).parse().expect("decodes");
        assert_eq!(vrs.v, 28);
    }

    #[test]
    fn rejects_malformed_signatures() {
        assert!("0xdeadbeef".parse::<Vrs>().is_err());
        assert!("not hex at all".parse::<Vrs>().is_err());

        let mut bytes = vec![1u8; 64];
        bytes.push(5);
        assert!(matches!(
            hex::encode(&bytes).parse::<Vrs>(),
            Err(VrsError::InvalidRecoveryId(5))
        ));
        assert!(Vrs::EMPTY.is_empty());
    }
}
