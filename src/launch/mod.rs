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

//! Launching a server for a machine.
//!
//! [CreateServer] drives the whole step: it resolves the flavor, the image
//! and the networks, requests the server, waits for it to become active,
//! optionally attaches a floating IP and finally waits until the server is
//! reachable. The building blocks are public and can be used separately.

mod config;
mod create_server;
mod env;
#[cfg(test)]
mod fakes;
mod floating_ip;
mod provisioner;
mod reachability;
mod spec;

pub use self::config::{FloatingIpDirective, LaunchConfig};
pub use self::create_server::{CreateServer, LaunchStage, Launched};
pub use self::env::{DeclaredInterface, LogUi, MachineState, Reachability, Ui};
pub use self::floating_ip::{FloatingIpAssigner, FloatingIpAssignment};
pub use self::provisioner::ServerProvisioner;
pub use self::reachability::ReachabilityWaiter;
pub use self::spec::{resolve_networks, LaunchSpec, NetworkAttachment};

/// How a waiting loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The awaited condition was reached.
    Ready,
    /// The interrupt flag was raised before it was reached.
    Cancelled,
}
