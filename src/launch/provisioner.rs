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

//! Server creation and build polling.

use std::fmt;
use std::time::Duration;

use super::super::cloud::ComputeClient;
use super::super::common::{retry, Interrupt};
use super::super::types::ServerRef;
use super::super::{Error, ErrorKind, Result};
use super::env::{MachineState, Ui};
use super::spec::LaunchSpec;
use super::WaitOutcome;

/// Creates a server and waits for it to be built.
pub struct ServerProvisioner<'a> {
    compute: &'a dyn ComputeClient,
    ui: &'a dyn Ui,
    interrupt: &'a Interrupt,
    max_attempts: u32,
    attempt_timeout: Duration,
}

impl<'a> ServerProvisioner<'a> {
    /// Create a provisioner.
    ///
    /// The build wait makes at most `max_attempts` attempts of
    /// `attempt_timeout` each.
    pub fn new(
        compute: &'a dyn ComputeClient,
        ui: &'a dyn Ui,
        interrupt: &'a Interrupt,
        max_attempts: u32,
        attempt_timeout: Duration,
    ) -> ServerProvisioner<'a> {
        ServerProvisioner {
            compute,
            ui,
            interrupt,
            max_attempts,
            attempt_timeout,
        }
    }

    /// Request the server and record its ID in the machine state.
    ///
    /// Failures are returned as is, nothing is retried here.
    pub async fn submit<M: MachineState + ?Sized>(
        &self,
        spec: &LaunchSpec,
        machine: &mut M,
    ) -> Result<ServerRef> {
        let id = self.compute.create_server(spec).await?;
        machine.set_id(&id)?;
        info!("Requested server {} with ID {}", spec.name(), id);
        Ok(id)
    }

    /// Wait for the server to become active.
    ///
    /// Each attempt is skipped if the interrupt flag is raised, resulting in
    /// `WaitOutcome::Cancelled`. Timed out attempts are repeated until
    /// `max_attempts` is reached.
    pub async fn wait_for_build(&self, server: &ServerRef) -> Result<WaitOutcome> {
        let compute = self.compute;
        let ui = self.ui;
        let interrupt = self.interrupt;
        let timeout = self.attempt_timeout;
        let report = move |progress: u8| ui.report_progress(progress, 100);

        let result = retry(
            self.max_attempts,
            |err| err.kind() == ErrorKind::OperationTimedOut,
            |attempt| async move {
                if interrupt.is_set() {
                    debug!("Waiting for server {} interrupted", server);
                    return Ok(WaitOutcome::Cancelled);
                }
                trace!("Waiting for server {}, attempt {}", server, attempt);
                compute.wait_until_active(server, timeout, &report).await?;
                Ok(WaitOutcome::Ready)
            },
        )
        .await;
        ui.clear_line();

        match result {
            Err(err) if err.kind() == ErrorKind::InvalidTransition => {
                debug!("Server {} failed to build: {}", server, err);
                let current = self.compute.get_server(server).await?;
                Err(Error::bad_state(current.status.to_lowercase()))
            }
            other => other,
        }
    }
}

impl fmt::Debug for ServerProvisioner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProvisioner")
            .field("interrupt", self.interrupt)
            .field("max_attempts", &self.max_attempts)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}
