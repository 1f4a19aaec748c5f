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

/// The relay loop wakes up every `100s` by default.
pub const fn relay_interval() -> u64 {
    100_000
}
/// Collecting 2/3 of the confirms gives up after `30min` by default.
pub const fn confirm_timeout() -> u64 {
    30 * 60 * 1000
}
/// Confirms are polled every `10s` by default.
pub const fn confirm_poll_interval() -> u64 {
    10_000
}
/// A failed relay cycle is retried after `10s` by default.
pub const fn retry_interval() -> u64 {
    10_000
}
/// A failed relay cycle is retried `5` times by default.
pub const fn max_retries() -> usize {
    5
}
/// Gas limit for `updateValidatorSet` and `submitDataRootTupleRoot`.
pub const fn gas_limit() -> u64 {
    2_500_000
}
/// Pending transactions are polled every `1s` by default.
pub const fn tx_polling_interval() -> u64 {
    1_000
}
/// HTTP requests to the source chain time out after `30s` by default.
pub const fn request_timeout() -> u64 {
    30_000
}
