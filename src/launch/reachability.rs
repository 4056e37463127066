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

//! Waiting for the server to become reachable.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;

use super::super::common::Interrupt;
use super::super::{ErrorKind, Result};
use super::env::Reachability;
use super::WaitOutcome;

/// Polls a reachability check until it passes.
///
/// There is no attempt limit: only success, a non-transient error or the
/// interrupt flag end the loop.
pub struct ReachabilityWaiter<'a> {
    check: &'a dyn Reachability,
    interrupt: &'a Interrupt,
    interval: Duration,
}

impl<'a> ReachabilityWaiter<'a> {
    /// Create a waiter polling every `interval`.
    pub fn new(
        check: &'a dyn Reachability,
        interrupt: &'a Interrupt,
        interval: Duration,
    ) -> ReachabilityWaiter<'a> {
        ReachabilityWaiter {
            check,
            interrupt,
            interval,
        }
    }

    /// Wait until the check passes or the interrupt flag is raised.
    pub async fn wait(&self) -> Result<WaitOutcome> {
        loop {
            if self.interrupt.is_set() {
                debug!("Waiting for reachability interrupted");
                return Ok(WaitOutcome::Cancelled);
            }

            match self.check.is_reachable().await {
                Ok(true) => {
                    debug!("Server is reachable");
                    return Ok(WaitOutcome::Ready);
                }
                Ok(false) => trace!("Server is not reachable yet"),
                Err(err) if err.kind() == ErrorKind::Unreachable => {
                    debug!("Server is not reachable yet: {}", err)
                }
                Err(err) => return Err(err),
            }

            sleep(self.interval).await;
        }
    }
}

impl fmt::Debug for ReachabilityWaiter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReachabilityWaiter")
            .field("interrupt", self.interrupt)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::super::super::common::Interrupt;
    use super::super::super::{Error, ErrorKind};
    use super::super::fakes::FakeReachability;
    use super::super::WaitOutcome;
    use super::ReachabilityWaiter;

    fn unreachable() -> Error {
        Error::new(ErrorKind::Unreachable, "No route to host")
    }

    #[tokio::test]
    async fn test_transient_errors_swallowed() {
        let check = FakeReachability::new(vec![
            Err(unreachable()),
            Ok(false),
            Err(unreachable()),
            Ok(true),
        ]);
        let interrupt = Interrupt::new();

        let outcome = ReachabilityWaiter::new(&check, &interrupt, Duration::from_millis(1))
            .wait()
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Ready);
        assert_eq!(check.calls(), 4);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let check = FakeReachability::new(vec![
            Err(unreachable()),
            Err(Error::new(ErrorKind::IoError, "Permission denied")),
            Ok(true),
        ]);
        let interrupt = Interrupt::new();

        let err = ReachabilityWaiter::new(&check, &interrupt, Duration::from_millis(1))
            .wait()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(check.calls(), 2);
    }

    #[tokio::test]
    async fn test_interrupted_before_check() {
        let check = FakeReachability::new(vec![Ok(true)]);
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let outcome = ReachabilityWaiter::new(&check, &interrupt, Duration::from_millis(1))
            .wait()
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(check.calls(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_while_polling() {
        let interrupt = Interrupt::new();
        let check = FakeReachability::new(vec![Ok(false), Ok(false), Ok(true)])
            .interrupt_after(2, interrupt.clone());

        let outcome = ReachabilityWaiter::new(&check, &interrupt, Duration::from_millis(1))
            .wait()
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(check.calls(), 2);
    }
}
