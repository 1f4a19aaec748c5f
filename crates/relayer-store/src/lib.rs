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

//! # Confirm Store Module 🕸️
//!
//! A module for persisting the validator confirms the relayer collected.
//!
//! ## Overview
//!
//! Confirms are stored under a deterministic key derived from the attestation
//! nonce, the signer and the signed digest, so writing the same confirm twice
//! is a no-op. Writes are grouped in batches that commit atomically.
//!
use std::fmt::{self, Debug, Display};

use ethers::types::{Address, H256};
use serde::de::DeserializeOwned;
use serde::Serialize;

use qgb_relayer_types::Confirm;
use qgb_relayer_utils::Result;

/// A module for managing in-memory storage of the relayer.
pub mod mem;
/// A module for setting up and managing a [Sled](https://sled.rs)-based database.
#[cfg(feature = "sled")]
pub mod sled;

#[cfg(feature = "sled")]
pub use self::sled::SledStore;
pub use mem::InMemoryStore;

/// The key a confirm is stored under.
///
/// Rendered as `/{namespace}/{nonce:x}:{signer}:{sign_bytes}`, where
/// `namespace` is `vc` for validator set confirms and `dcc` for data
/// commitment confirms, so all confirms for one nonce share a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmKey {
    namespace: &'static str,
    nonce: u64,
    signer: Address,
    sign_bytes: H256,
}

impl ConfirmKey {
    pub fn new<C: Confirm>(confirm: &C) -> Self {
        Self {
            namespace: C::NAMESPACE,
            nonce: confirm.nonce(),
            signer: confirm.evm_address(),
            sign_bytes: confirm.sign_bytes(),
        }
    }

    /// The prefix shared by every confirm of kind `C` for `nonce`.
    pub fn nonce_prefix<C: Confirm>(nonce: u64) -> String {
        format!("/{}/{:x}:", C::NAMESPACE, nonce)
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn signer(&self) -> Address {
        self.signer
    }
}

impl Display for ConfirmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/{}/{:x}:0x{}:0x{}",
            self.namespace,
            self.nonce,
            hex::encode(self.signer.as_bytes()),
            hex::encode(self.sign_bytes.as_bytes()),
        )
    }
}

/// A set of writes that is applied to the store all at once.
pub trait ConfirmBatch {
    /// Stages `value` under `key`.
    fn put(&mut self, key: ConfirmKey, value: Vec<u8>);
    /// Applies every staged write, skipping keys that already exist.
    ///
    /// Either every staged write lands or none does. Returns the number of
    /// keys that were newly written.
    fn commit(self) -> Result<usize>;
}

/// A key-value datastore holding serialized confirms.
pub trait ConfirmStore: Clone + Send + Sync {
    type Batch: ConfirmBatch;

    fn has(&self, key: &ConfirmKey) -> Result<bool>;

    /// Opens a new write batch.
    fn batch(&self) -> Result<Self::Batch>;

    /// Returns every value whose key starts with `prefix`, in key order.
    fn values_with_prefix(&self, prefix: &str) -> Result<Vec<Vec<u8>>>;

    /// Total size of the stored data in bytes, when the backend knows it.
    fn data_stored_size(&self) -> u64 {
        0
    }
}

/// Typed confirm persistence on top of any [`ConfirmStore`].
pub trait ConfirmStoreExt: ConfirmStore {
    /// Persists `confirms`, writing only the ones not already stored.
    ///
    /// Returns how many confirms were newly written.
    #[tracing::instrument(skip_all, fields(count = confirms.len()))]
    fn save_confirms<C>(&self, confirms: &[C]) -> Result<usize>
    where
        C: Confirm + Serialize + Debug,
    {
        let mut batch = self.batch()?;
        for confirm in confirms {
            let key = ConfirmKey::new(confirm);
            if self.has(&key)? {
                tracing::trace!(%key, "confirm already stored");
                continue;
            }
            batch.put(key, serde_json::to_vec(confirm)?);
        }
        batch.commit()
    }

    /// Loads every stored confirm of kind `C` for `nonce`.
    fn confirms_for_nonce<C>(&self, nonce: u64) -> Result<Vec<C>>
    where
        C: Confirm + DeserializeOwned,
    {
        let prefix = ConfirmKey::nonce_prefix::<C>(nonce);
        self.values_with_prefix(&prefix)?
            .iter()
            .map(|raw| serde_json::from_slice(raw).map_err(Into::into))
            .collect()
    }
}

impl<S: ConfirmStore> ConfirmStoreExt for S {}
