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

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use qgb_relayer::traits::ConfirmSource;
use qgb_relayer_types::{DataCommitmentConfirm, ValsetConfirm};
use qgb_relayer_utils::Result;

/// Reads the confirms the orchestrators broadcast from the confirm
/// gateway, apart from the relayer's own confirm store.
#[derive(Debug, Clone)]
pub struct HttpConfirmSource {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ConfirmsResponse<C> {
    #[serde(default = "Vec::new")]
    confirms: Vec<C>,
}

impl HttpConfirmSource {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// The gateway confirms are read from.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn confirms_url(&self, kind: &str, nonce: u64) -> Result<Url> {
        Ok(self.endpoint.join(&format!("qgb/v1/{kind}/{nonce}"))?)
    }

    async fn get_confirms<C>(&self, kind: &str, nonce: u64) -> Result<Vec<C>>
    where
        C: DeserializeOwned,
    {
        let url = self.confirms_url(kind, nonce)?;
        tracing::trace!(%url, "querying confirms");
        let response = self.client.get(url).send().await?;
        // nobody confirmed yet.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = response.error_for_status()?.json().await?;
        parse_confirms(body)
    }
}

fn parse_confirms<C: DeserializeOwned>(
    body: serde_json::Value,
) -> Result<Vec<C>> {
    let response: ConfirmsResponse<C> = serde_json::from_value(body)?;
    Ok(response.confirms)
}

#[async_trait::async_trait]
impl ConfirmSource for HttpConfirmSource {
    async fn valset_confirms(&self, nonce: u64) -> Result<Vec<ValsetConfirm>> {
        self.get_confirms("valset_confirms", nonce).await
    }

    async fn data_commitment_confirms(
        &self,
        nonce: u64,
    ) -> Result<Vec<DataCommitmentConfirm>> {
        self.get_confirms("data_commitment_confirms", nonce).await
    }
}
