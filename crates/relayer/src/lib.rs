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

//! # QGB Relayer 🕸️
//!
//! Keeps a Quantum Gravity Bridge contract on an EVM chain in step with the
//! attestations of its source chain.
//!
//! ## Overview
//!
//! On every tick the [`Relayer`] reads the last nonce the contract accepted,
//! and relays each newer attestation in order: it waits until two thirds of
//! the validator set's power confirmed it, stores those confirms, orders
//! their signatures like the validator set and submits the contract call.
//!
//! Everything the relayer talks to sits behind the traits of [`traits`], so
//! the loop runs the same against real chains and in-process fakes.

/// Processing of a single attestation.
mod processor;
/// Waiting for a quorum of confirms.
pub mod quorum;
/// The relay loop.
mod relayer;
/// Ordering confirm signatures the way the contract expects them.
pub mod signatures;
/// A fixed-period task runner.
pub mod ticker;
/// The collaborators of the relay loop.
pub mod traits;

/// Timing settings of the relayer.
pub mod policy;

pub use policy::RelayerPolicy;
pub use quorum::{QuorumConfirmQuerier, StoreConfirmSource};
pub use relayer::Relayer;
pub use signatures::{match_attestation_confirm_sigs, signatures_by_signer};
