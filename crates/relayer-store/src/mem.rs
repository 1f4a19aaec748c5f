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

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{ConfirmBatch, ConfirmKey, ConfirmStore};

type MemStore = BTreeMap<String, Vec<u8>>;

/// InMemoryStore is a store that keeps the collected confirms in memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    confirms: Arc<RwLock<MemStore>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish()
    }
}

impl InMemoryStore {
    /// Number of stored confirms.
    pub fn len(&self) -> usize {
        self.confirms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirms.read().is_empty()
    }
}

/// A write batch against an [`InMemoryStore`], applied under a single
/// write lock on commit.
pub struct InMemoryBatch {
    confirms: Arc<RwLock<MemStore>>,
    staged: Vec<(String, Vec<u8>)>,
}

impl ConfirmBatch for InMemoryBatch {
    fn put(&mut self, key: ConfirmKey, value: Vec<u8>) {
        self.staged.push((key.to_string(), value));
    }

    fn commit(self) -> crate::Result<usize> {
        let mut guard = self.confirms.write();
        let mut written = 0;
        for (key, value) in self.staged {
            if guard.contains_key(&key) {
                continue;
            }
            guard.insert(key, value);
            written += 1;
        }
        Ok(written)
    }
}

impl ConfirmStore for InMemoryStore {
    type Batch = InMemoryBatch;

    #[tracing::instrument(skip(self), fields(key = %key))]
    fn has(&self, key: &ConfirmKey) -> crate::Result<bool> {
        Ok(self.confirms.read().contains_key(&key.to_string()))
    }

    fn batch(&self) -> crate::Result<Self::Batch> {
        Ok(InMemoryBatch {
            confirms: self.confirms.clone(),
            staged: Vec::new(),
        })
    }

    fn values_with_prefix(&self, prefix: &str) -> crate::Result<Vec<Vec<u8>>> {
        let guard = self.confirms.read();
        let values = guard
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, v)| v.clone())
            .collect();
        Ok(values)
    }
}
