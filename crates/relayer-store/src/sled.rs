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

use std::path::Path;

use super::{ConfirmBatch, ConfirmKey, ConfirmStore};

const CONFIRMS_TREE: &str = "confirms";

/// SledStore is a store that keeps the collected confirms in a
/// [Sled](https://sled.rs)-based database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    confirms: sled::Tree,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore").finish()
    }
}

impl SledStore {
    /// Create a new SledStore.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let db = sled::Config::new()
            .path(path)
            .temporary(cfg!(test))
            .mode(sled::Mode::HighThroughput)
            .open()?;
        let confirms = db.open_tree(CONFIRMS_TREE)?;
        Ok(Self { db, confirms })
    }

    /// Creates a temporary SledStore.
    pub fn temporary() -> crate::Result<Self> {
        let dir = tempfile::tempdir()?;
        Self::open(dir.path())
    }
}

/// A write batch against a [`SledStore`], applied in a single sled
/// transaction on commit.
pub struct SledBatch {
    db: sled::Db,
    confirms: sled::Tree,
    staged: Vec<(String, Vec<u8>)>,
}

impl ConfirmBatch for SledBatch {
    fn put(&mut self, key: ConfirmKey, value: Vec<u8>) {
        self.staged.push((key.to_string(), value));
    }

    #[tracing::instrument(skip_all, fields(staged = self.staged.len()))]
    fn commit(self) -> crate::Result<usize> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let staged = &self.staged;
        let written = self.confirms.transaction::<_, _, std::io::Error>(
            |tx| {
                let mut written = 0;
                for (key, value) in staged {
                    if tx.get(key.as_bytes())?.is_some() {
                        continue;
                    }
                    tx.insert(key.as_bytes(), value.as_slice())?;
                    written += 1;
                }
                Ok(written)
            },
        )?;
        self.db.flush()?;
        Ok(written)
    }
}

impl ConfirmStore for SledStore {
    type Batch = SledBatch;

    #[tracing::instrument(skip(self), fields(key = %key))]
    fn has(&self, key: &ConfirmKey) -> crate::Result<bool> {
        let exists = self.confirms.contains_key(key.to_string().as_bytes())?;
        Ok(exists)
    }

    fn batch(&self) -> crate::Result<Self::Batch> {
        Ok(SledBatch {
            db: self.db.clone(),
            confirms: self.confirms.clone(),
            staged: Vec::new(),
        })
    }

    fn values_with_prefix(&self, prefix: &str) -> crate::Result<Vec<Vec<u8>>> {
        self.confirms
            .scan_prefix(prefix.as_bytes())
            .values()
            .map(|v| v.map(|v| v.to_vec()).map_err(Into::into))
            .collect()
    }

    fn data_stored_size(&self) -> u64 {
        self.db.size_on_disk().unwrap_or_default()
    }
}
