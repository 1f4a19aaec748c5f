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

use std::time::Duration;

use ethers::contract::ContractError;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;

pub mod clickable_link;

/// Metrics functionality
pub mod metric;
/// A module used for debugging relayer lifecycle, relay progress, or other relayer state.
pub mod probe;
/// Retry functionality
pub mod retry;

/// The signer-enabled ethers client used to submit transactions to the
/// QGB contract.
pub type EthersSignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// An enum of all possible errors that could be encountered during the
/// execution of the QGB Relayer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An Io error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// JSON Error occurred.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Config loading error.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Error while iterating over a glob pattern.
    #[error(transparent)]
    GlobPattern(#[from] glob::PatternError),
    /// Error from Glob Iterator.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    /// Error while parsing a URL.
    #[error(transparent)]
    Url(#[from] url::ParseError),
    /// Error while decoding a hex string.
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// Elliptic Curve error.
    #[error(transparent)]
    EllipticCurve(#[from] ethers::core::k256::elliptic_curve::Error),
    /// Error in Http Provider (ethers client).
    #[error(transparent)]
    EthersProvider(#[from] ethers::providers::ProviderError),
    /// Smart contract error.
    #[error(transparent)]
    EthersContractCallWithSigner(#[from] ContractError<EthersSignerClient>),
    /// Ether wallet errors.
    #[error(transparent)]
    EtherWalletError(#[from] ethers::signers::WalletError),
    /// Sled database error.
    #[error(transparent)]
    Sled(#[from] sled::Error),
    /// Sled transaction error.
    #[error(transparent)]
    SledTransaction(
        #[from] sled::transaction::TransactionError<std::io::Error>,
    ),
    /// Reqwest error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    PrometheusError(#[from] prometheus::Error),
    /// Generic error.
    #[error("{}", _0)]
    Generic(&'static str),
    /// Error while parsing the config files.
    #[error("Config parse error: {}", _0)]
    ParseConfig(#[from] serde_path_to_error::Error<config::ConfigError>),
    /// Missing Secrets in the config, i.e. the EVM private key.
    #[error("Missing required private-key in the config")]
    MissingSecrets,
    /// The source chain has no attestation stored at the requested nonce.
    #[error("attestation not found: nonce {}", nonce)]
    AttestationNotFound {
        /// The requested attestation nonce.
        nonce: u64,
    },
    /// The source chain returned an attestation for a different nonce than
    /// the one requested.
    #[error("unexpected attestation nonce: expected {expected} got {found}")]
    UnexpectedAttestationNonce {
        /// The requested attestation nonce.
        expected: u64,
        /// The nonce of the returned attestation.
        found: u64,
    },
    /// The attestation is neither a validator set nor a data commitment.
    #[error("unknown attestation type: {}", nonce)]
    UnknownAttestationType {
        /// The nonce of the offending attestation.
        nonce: u64,
    },
    /// A stored confirm carries a signature that cannot be decoded into
    /// its `(v, r, s)` components.
    #[error("malformed signature from {signer}: {reason}")]
    MalformedSignature {
        /// The EVM address of the signer.
        signer: String,
        /// Why the signature was rejected.
        reason: String,
    },
    /// Not enough signing power was collected before the deadline.
    #[error(
        "timed out after {:?} waiting for 2/3 confirms for nonce {}",
        timeout,
        nonce
    )]
    QuorumTimeout {
        /// The attestation nonce we were collecting confirms for.
        nonce: u64,
        /// How long we waited.
        timeout: Duration,
    },
    /// The transaction was dropped from the mempool before being mined.
    #[error("transaction {} dropped from the mempool", tx_hash)]
    TransactionDropped {
        /// The hash of the dropped transaction.
        tx_hash: String,
    },
    /// The transaction was mined but reverted.
    #[error("transaction {} failed", tx_hash)]
    TransactionFailed {
        /// The hash of the failed transaction.
        tx_hash: String,
    },
    /// The relayer was asked to stop.
    #[error("relayer cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if retrying the operation that produced this error
    /// could lead to a different outcome.
    ///
    /// Unknown attestation kinds, malformed signatures and missing or
    /// inconsistent source data are surfaced immediately instead of being
    /// retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::UnknownAttestationType { .. }
                | Self::AttestationNotFound { .. }
                | Self::MalformedSignature { .. }
                | Self::UnexpectedAttestationNonce { .. }
                | Self::MissingSecrets
                | Self::Cancelled
        )
    }

    /// Classifies this error for the [`backoff`] retry helpers.
    pub fn into_backoff(self) -> backoff::Error<Self> {
        if self.is_retryable() {
            backoff::Error::transient(self)
        } else {
            backoff::Error::permanent(self)
        }
    }
}

/// A type alias for the result for qgb relayer, that uses the `Error` enum.
pub type Result<T> = std::result::Result<T, Error>;
