// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bounded retries.

use std::future::Future;

use super::super::{Error, Result};

/// Run an action until it succeeds, retrying selected errors.
///
/// The action receives the 1-based attempt number. Errors for which
/// `is_retryable` returns `true` are swallowed until `max_attempts` attempts
/// have been made; the error of the last attempt is returned as is. Any other
/// error is returned immediately. A `max_attempts` of zero is treated as one.
pub async fn retry<T, F, Fut, P>(max_attempts: u32, is_retryable: P, mut action: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match action(attempt).await {
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                debug!(
                    "Attempt {} of {} failed, retrying: {}",
                    attempt, max_attempts, err
                );
                attempt += 1;
            }
            other => return other,
        }
    }
}
