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

use ethers::types::H256;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use qgb_relayer::traits::{AppQuerier, CommitmentQuerier};
use qgb_relayer_types::{Attestation, Valset};
use qgb_relayer_utils::{Error, Result};

/// Queries the QGB module of the source chain through its REST gateway,
/// and data commitments through its Tendermint RPC.
#[derive(Debug, Clone)]
pub struct HttpAppQuerier {
    client: reqwest::Client,
    app_endpoint: Url,
    rpc_endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct LatestNonceResponse {
    #[serde(with = "qgb_relayer_types::u64_string")]
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct AttestationResponse {
    #[serde(default)]
    attestation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ValsetResponse {
    valset: Valset,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct DataCommitmentResult {
    data_commitment: String,
}

impl HttpAppQuerier {
    pub fn new(
        client: reqwest::Client,
        app_endpoint: Url,
        rpc_endpoint: Url,
    ) -> Self {
        Self {
            client,
            app_endpoint,
            rpc_endpoint,
        }
    }

    fn app_url(&self, path: &str) -> Result<Url> {
        Ok(self.app_endpoint.join(path)?)
    }

    async fn get_app(&self, path: &str) -> Result<Option<serde_json::Value>> {
        let url = self.app_url(path)?;
        tracing::trace!(%url, "querying source chain");
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.json().await?;
        Ok(Some(body))
    }
}

fn parse_attestation(body: serde_json::Value) -> Result<Option<Attestation>> {
    let response: AttestationResponse = serde_json::from_value(body)?;
    match response.attestation {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(raw) => Ok(Some(Attestation::from_json(raw)?)),
    }
}

fn parse_data_commitment(
    body: RpcResponse<DataCommitmentResult>,
) -> Result<H256> {
    if let Some(err) = body.error {
        tracing::error!(
            message = %err.message,
            data = %err.data,
            "data commitment query failed"
        );
        return Err(Error::Generic("data commitment query failed"));
    }
    let result = body
        .result
        .ok_or(Error::Generic("data commitment response has no result"))?;
    let raw = result.data_commitment.trim_start_matches("0x");
    let bytes = hex::decode(raw)?;
    if bytes.len() != H256::len_bytes() {
        return Err(Error::Generic("data commitment is not 32 bytes long"));
    }
    Ok(H256::from_slice(&bytes))
}

#[async_trait::async_trait]
impl AppQuerier for HttpAppQuerier {
    async fn latest_attestation_nonce(&self) -> Result<u64> {
        let body = self
            .get_app("qgb/v1/nonce/latest_attestation")
            .await?
            .ok_or(Error::Generic("latest attestation nonce not found"))?;
        let response: LatestNonceResponse = serde_json::from_value(body)?;
        Ok(response.nonce)
    }

    async fn attestation_by_nonce(
        &self,
        nonce: u64,
    ) -> Result<Option<Attestation>> {
        match self
            .get_app(&format!("qgb/v1/attestations/requests/{nonce}"))
            .await?
        {
            Some(body) => parse_attestation(body),
            None => Ok(None),
        }
    }

    async fn last_valset_before_nonce(&self, nonce: u64) -> Result<Valset> {
        let body = self
            .get_app(&format!("qgb/v1/valset/request/before/{nonce}"))
            .await?
            .ok_or(Error::AttestationNotFound { nonce })?;
        let response: ValsetResponse = serde_json::from_value(body)?;
        Ok(response.valset)
    }
}

#[async_trait::async_trait]
impl CommitmentQuerier for HttpAppQuerier {
    #[tracing::instrument(skip(self))]
    async fn data_commitment(
        &self,
        begin_block: u64,
        end_block: u64,
    ) -> Result<H256> {
        let mut url = self.rpc_endpoint.join("data_commitment")?;
        url.query_pairs_mut()
            .append_pair("first_block", &begin_block.to_string())
            .append_pair("last_block", &end_block.to_string());
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        parse_data_commitment(body)
    }
}
