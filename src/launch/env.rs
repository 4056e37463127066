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

//! Collaborators of the launch step.

use std::net::Ipv4Addr;

use async_trait::async_trait;

use super::super::types::ServerRef;
use super::super::Result;

/// A network interface declared for the machine.
///
/// Interface *i* provides the fixed IP for configured network *i*.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredInterface {
    /// Requested fixed IP (if any).
    pub ip: Option<Ipv4Addr>,
}

/// Durable state of the machine being launched.
pub trait MachineState {
    /// Name of the machine, used when no server name is configured.
    fn name(&self) -> &str;

    /// Record the ID of the created server.
    ///
    /// Called right after the server creation request succeeds.
    fn set_id(&mut self, id: &ServerRef) -> Result<()>;

    /// Network interfaces declared for the machine, in declaration order.
    fn declared_interfaces(&self) -> Vec<DeclaredInterface>;
}

/// User interface for progress reporting.
pub trait Ui: Send + Sync {
    /// Report an informational message.
    fn info(&self, message: &str);

    /// Report progress; may be called on every poll.
    fn report_progress(&self, progress: u8, total: u8);

    /// Clear the progress line.
    fn clear_line(&self) {}
}

/// A check whether the launched server can be reached.
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Whether a management channel can be opened.
    ///
    /// Errors of kind `Unreachable` are treated as "not yet".
    async fn is_reachable(&self) -> Result<bool>;
}

/// A `Ui` that writes everything to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogUi;

impl Ui for LogUi {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn report_progress(&self, progress: u8, total: u8) {
        trace!("Progress: {}/{}", progress, total);
    }
}
