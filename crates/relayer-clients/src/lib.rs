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

//! Network clients backing the relayer's collaborator traits.

/// The confirm gateway.
pub mod confirms;
/// The QGB contract on the EVM chain.
pub mod evm;
/// The source chain's REST gateway and Tendermint RPC.
pub mod rpc;

pub use confirms::HttpConfirmSource;
pub use evm::EvmContractClient;
pub use rpc::HttpAppQuerier;
