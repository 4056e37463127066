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

//! Waiting for a server to become active.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use super::super::types::ServerRef;
use super::super::{Error, ErrorKind, Result};
use super::protocol;

const ACTIVE: &str = "ACTIVE";
const ERROR: &str = "ERROR";

/// Waiter for a server to reach `ACTIVE`, bounded by a single timeout.
///
/// The current state is obtained by calling `fetch`.
pub(crate) struct ServerStatusWaiter<'a, F> {
    server: &'a ServerRef,
    fetch: F,
    wait_timeout: Duration,
    delay: Duration,
    progress: &'a (dyn Fn(u8) + Send + Sync),
}

impl<'a, F, Fut> ServerStatusWaiter<'a, F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<protocol::Server>>,
{
    pub(crate) fn new(
        server: &'a ServerRef,
        fetch: F,
        wait_timeout: Duration,
        delay: Duration,
        progress: &'a (dyn Fn(u8) + Send + Sync),
    ) -> ServerStatusWaiter<'a, F> {
        ServerStatusWaiter {
            server,
            fetch,
            wait_timeout,
            delay,
            progress,
        }
    }

    fn timeout_error(&self) -> Error {
        Error::new(
            ErrorKind::OperationTimedOut,
            format!(
                "Timeout waiting for server {} to reach state {}",
                self.server, ACTIVE
            ),
        )
    }

    async fn poll(&mut self) -> Result<Option<()>> {
        let server = (self.fetch)().await?;
        (self.progress)(server.progress);
        check_status(&server)
    }

    /// Poll the server until it is active, failed or the timeout expires.
    ///
    /// The server is polled at least once, even if the timeout is shorter
    /// than the delay.
    pub(crate) async fn wait(mut self) -> Result<()> {
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if let Some(result) = self.poll().await? {
                return Ok(result);
            }

            if Instant::now() + self.delay > deadline {
                return Err(self.timeout_error());
            }

            sleep(self.delay).await;
        }
    }
}

/// Decide whether waiting is over based on the server status.
fn check_status(server: &protocol::Server) -> Result<Option<()>> {
    match server.status.as_str() {
        ACTIVE => {
            debug!("Server {} reached state {}", server.id, ACTIVE);
            Ok(Some(()))
        }
        ERROR => {
            debug!(
                "Failed to move server {} to {} - status is {}",
                server.id, ACTIVE, ERROR
            );
            Err(Error::new(
                ErrorKind::InvalidTransition,
                format!(
                    "Server {} should have transitioned to {}, but got into {}",
                    server.id, ACTIVE, server.status
                ),
            ))
        }
        other => {
            trace!(
                "Still waiting for server {} to get to state {}, current is {} ({}%)",
                server.id,
                ACTIVE,
                other,
                server.progress
            );
            Ok(None)
        }
    }
}
