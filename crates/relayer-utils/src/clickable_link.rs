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

use std::fmt;

/// A terminal hyperlink (OSC 8), used to print explorer links for
/// relayed transactions.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClickableLink {
    text: String,
    url: String,
}

impl ClickableLink {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }

    /// A link to `tx_hash` on the given block explorer.
    ///
    /// Without an explorer the link degrades to plain text.
    pub fn tx(explorer: Option<&url::Url>, tx_hash: &str) -> Self {
        let url = explorer
            .and_then(|e| e.join(&format!("tx/{tx_hash}")).ok())
            .map(|u| u.to_string())
            .unwrap_or_default();
        Self::new(tx_hash, url)
    }
}

impl fmt::Display for ClickableLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.is_empty() {
            return write!(f, "{}", self.text);
        }
        write!(
            f,
            "\u{1b}]8;;{}\u{1b}\\{}\u{1b}]8;;\u{1b}\\",
            self.url, self.text
        )
    }
}
