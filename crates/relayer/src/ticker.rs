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

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use qgb_relayer_utils::{Error, Result};

/// Runs `task` right away, then every `period`, until it fails.
///
/// A run that outlasts `period` delays the next one instead of stacking
/// runs up. Returns the error of the failed run.
pub async fn run_until_error<F, Fut>(period: Duration, mut task: F) -> Error
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if let Err(e) = task().await {
            return e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn first_run_is_immediate() {
        let runs = AtomicUsize::new(0);
        let start = Instant::now();
        let err = run_until_error(Duration::from_secs(100), || async {
            let n = runs.fetch_add(1, Ordering::SeqCst);
            if n == 2 {
                Err(Error::AttestationNotFound { nonce: 9 })
            } else {
                Ok(())
            }
        })
        .await;
        assert!(matches!(err, Error::AttestationNotFound { nonce: 9 }));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        // run 1 at t=0, run 2 at t=100, run 3 at t=200.
        assert_eq!(start.elapsed(), Duration::from_secs(200));
    }
}
