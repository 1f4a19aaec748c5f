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

use std::sync::Arc;
use std::time::Duration;

use ethers::providers::{Middleware, PendingTransaction};
use ethers::types::{Address, TxHash, H256, U256};
use tracing::Level;
use url::Url;

use qgb_relayer::traits::ContractClient;
use qgb_relayer_types::{Valset, Vrs};
use qgb_relayer_utils::clickable_link::ClickableLink;
use qgb_relayer_utils::{probe, EthersSignerClient, Error, Result};

use self::bindings::{QuantumGravityBridge, Signature, Validator};

#[allow(clippy::all)]
pub mod bindings {
    ethers::contract::abigen!(
        QuantumGravityBridge,
        r#"[
            struct Validator { address addr; uint256 power; }
            struct Signature { uint8 v; bytes32 r; bytes32 s; }
            function state_lastEventNonce() external view returns (uint256)
            function updateValidatorSet(uint256 _newNonce, uint256 _oldNonce, uint256 _newPowerThreshold, bytes32 _newValidatorSetHash, Validator[] _currentValidatorSet, Signature[] _sigs) external
            function submitDataRootTupleRoot(uint256 _newNonce, uint256 _validatorSetNonce, bytes32 _dataRootTupleRoot, Validator[] _currentValidatorSet, Signature[] _sigs) external
        ]"#,
    );
}

/// Nonce and gas price of the next relayed transaction.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    pub nonce: U256,
    pub gas_price: U256,
}

/// The QGB contract, reached through a signing ethers client.
#[derive(Debug, Clone)]
pub struct EvmContractClient {
    contract: QuantumGravityBridge<EthersSignerClient>,
    client: Arc<EthersSignerClient>,
    gas_limit: u64,
    polling_interval: Duration,
    block_confirmations: usize,
    explorer: Option<Url>,
}

impl EvmContractClient {
    pub fn new(
        client: Arc<EthersSignerClient>,
        contract_address: Address,
        gas_limit: u64,
        polling_interval: Duration,
        block_confirmations: usize,
        explorer: Option<Url>,
    ) -> Self {
        let contract =
            QuantumGravityBridge::new(contract_address, client.clone());
        Self {
            contract,
            client,
            gas_limit,
            polling_interval,
            block_confirmations,
            explorer,
        }
    }

    fn tx_link(&self, tx_hash: TxHash) -> ClickableLink {
        ClickableLink::tx(self.explorer.as_ref(), &format!("0x{tx_hash:x}"))
    }

    fn submitted(&self, tx_hash: TxHash, nonce: u64) -> TxHash {
        tracing::event!(
            target: probe::TARGET,
            Level::DEBUG,
            kind = %probe::Kind::Tx,
            pending = true,
            nonce,
            %tx_hash,
        );
        tracing::info!(
            "Tx {} is submitted and pending!",
            self.tx_link(tx_hash)
        );
        tx_hash
    }
}

fn event_nonce(nonce: U256) -> Result<u64> {
    u64::try_from(nonce)
        .map_err(|_| Error::Generic("contract event nonce overflows u64"))
}

fn abi_validators(valset: &Valset) -> Vec<Validator> {
    valset
        .members
        .iter()
        .map(|m| Validator {
            addr: m.evm_address,
            power: U256::from(m.power),
        })
        .collect()
}

fn abi_signatures(signatures: Vec<Vrs>) -> Vec<Signature> {
    signatures
        .into_iter()
        .map(|sig| Signature {
            v: sig.v,
            r: sig.r,
            s: sig.s,
        })
        .collect()
}

#[async_trait::async_trait]
impl ContractClient for EvmContractClient {
    type TxOptions = TxOptions;

    async fn last_event_nonce(&self) -> Result<u64> {
        let nonce = self.contract.state_last_event_nonce().call().await?;
        event_nonce(nonce)
    }

    async fn transaction_options(&self) -> Result<Self::TxOptions> {
        let provider = self.client.inner();
        let nonce = provider
            .get_transaction_count(self.client.address(), None)
            .await?;
        let gas_price = provider.get_gas_price().await?;
        Ok(TxOptions { nonce, gas_price })
    }

    #[tracing::instrument(skip_all, fields(nonce = new_valset.nonce))]
    async fn update_validator_set(
        &self,
        opts: Self::TxOptions,
        new_valset: &Valset,
        current_valset: &Valset,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash> {
        let call = self
            .contract
            .update_validator_set(
                U256::from(new_valset.nonce),
                U256::from(current_valset.nonce),
                U256::from(new_valset.two_thirds_threshold()),
                new_valset.hash().to_fixed_bytes(),
                abi_validators(current_valset),
                abi_signatures(signatures),
            )
            .gas(self.gas_limit)
            .gas_price(opts.gas_price)
            .nonce(opts.nonce);
        let pending = call.send().await?;
        Ok(self.submitted(*pending, new_valset.nonce))
    }

    #[tracing::instrument(skip_all, fields(nonce = nonce))]
    async fn submit_data_root_tuple_root(
        &self,
        opts: Self::TxOptions,
        nonce: u64,
        current_valset: &Valset,
        data_root_tuple_root: H256,
        signatures: Vec<Vrs>,
    ) -> Result<TxHash> {
        let call = self
            .contract
            .submit_data_root_tuple_root(
                U256::from(nonce),
                U256::from(current_valset.nonce),
                data_root_tuple_root.to_fixed_bytes(),
                abi_validators(current_valset),
                abi_signatures(signatures),
            )
            .gas(self.gas_limit)
            .gas_price(opts.gas_price)
            .nonce(opts.nonce);
        let pending = call.send().await?;
        Ok(self.submitted(*pending, nonce))
    }

    async fn wait_for_transaction(&self, tx_hash: TxHash) -> Result<()> {
        tracing::debug!(%tx_hash, "waiting for transaction to be confirmed");
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .interval(self.polling_interval)
            .confirmations(self.block_confirmations)
            .await?;
        let link = self.tx_link(tx_hash);
        let tx_hash_string = format!("0x{tx_hash:x}");
        match receipt {
            Some(receipt) if receipt.status.map_or(false, |s| s.is_zero()) => {
                tracing::error!("Tx {} Failed", link);
                tracing::event!(
                    target: probe::TARGET,
                    Level::DEBUG,
                    kind = %probe::Kind::Tx,
                    errored = true,
                    %tx_hash,
                );
                Err(Error::TransactionFailed {
                    tx_hash: tx_hash_string,
                })
            }
            Some(receipt) => {
                tracing::info!("Tx {} Finalized", link);
                tracing::event!(
                    target: probe::TARGET,
                    Level::DEBUG,
                    kind = %probe::Kind::Tx,
                    finalized = true,
                    %tx_hash,
                    block_number = ?receipt.block_number,
                );
                Ok(())
            }
            None => {
                tracing::warn!("Tx {} Dropped from Mempool!!", link);
                Err(Error::TransactionDropped {
                    tx_hash: tx_hash_string,
                })
            }
        }
    }
}
