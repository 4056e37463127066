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

//! The server creation step.

use std::fmt;

use super::super::cloud::{ComputeClient, NetworkClient};
use super::super::common::{find_match, Interrupt};
use super::super::types::{FlavorRef, ImageRef, ServerRef};
use super::super::{Error, ErrorKind, Result};
use super::config::LaunchConfig;
use super::env::{MachineState, Reachability, Ui};
use super::floating_ip::FloatingIpAssigner;
use super::provisioner::ServerProvisioner;
use super::reachability::ReachabilityWaiter;
use super::spec::{resolve_networks, LaunchSpec};
use super::WaitOutcome;

/// Stage of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStage {
    /// Requesting the server.
    Submitting,
    /// Waiting for the server to become active.
    Building,
    /// Obtaining and associating a floating IP.
    AssigningFloatingIp,
    /// Waiting for the server to become reachable.
    AwaitingReachability,
    /// The server is ready.
    Ready,
    /// Waiting was interrupted.
    Cancelled,
}

/// Result of a launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launched {
    /// The server is active and reachable.
    Ready {
        /// ID of the server.
        server: ServerRef,
        /// Floating IP associated with the server (if requested).
        floating_ip: Option<String>,
    },
    /// Waiting was interrupted; the server ID is already recorded.
    Cancelled {
        /// ID of the server.
        server: ServerRef,
        /// Stage at which waiting was interrupted.
        stage: LaunchStage,
    },
}

/// Creates a server for a machine and waits until it can be used.
///
/// # Example
///
/// ```rust,no_run
/// use openstack_launch::cloud::Cloud;
/// use openstack_launch::launch::{CreateServer, LaunchConfig, LogUi};
/// use openstack_launch::Interrupt;
///
/// # async fn launch<M, R>(machine: &mut M, ssh: &R) -> openstack_launch::Result<()>
/// # where M: openstack_launch::launch::MachineState + Send,
/// #       R: openstack_launch::launch::Reachability {
/// let os = Cloud::from_env().await?;
/// let config = LaunchConfig::from_file("launch.yaml")?;
/// let ui = LogUi;
/// let step = CreateServer::new(&os, &os, &ui, Interrupt::new());
/// let result = step.call(&config, machine, ssh).await?;
/// println!("{:?}", result);
/// # Ok(()) }
/// ```
pub struct CreateServer<'a> {
    compute: &'a dyn ComputeClient,
    network: &'a dyn NetworkClient,
    ui: &'a dyn Ui,
    interrupt: Interrupt,
}

impl<'a> CreateServer<'a> {
    /// Create the step with its collaborators.
    pub fn new(
        compute: &'a dyn ComputeClient,
        network: &'a dyn NetworkClient,
        ui: &'a dyn Ui,
        interrupt: Interrupt,
    ) -> CreateServer<'a> {
        CreateServer {
            compute,
            network,
            ui,
            interrupt,
        }
    }

    /// The interrupt flag checked by this step.
    #[inline]
    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    /// Launch a server for the machine.
    ///
    /// Flavor and image are resolved before anything is created. The server
    /// ID is recorded in `machine` as soon as the creation request succeeds.
    pub async fn call<M: MachineState + ?Sized>(
        &self,
        config: &LaunchConfig,
        machine: &mut M,
        reachability: &dyn Reachability,
    ) -> Result<Launched> {
        config.validate()?;
        self.ui.info("Launching a server with the following settings...");

        let flavors = self.compute.list_flavors().await?;
        let flavor = find_match(&flavors, &config.flavor).ok_or_else(|| {
            Error::new(
                ErrorKind::NoMatchingFlavor,
                format!("No flavor matches {}", config.flavor),
            )
        })?;

        let images = self.compute.list_images().await?;
        let image = find_match(&images, &config.image).ok_or_else(|| {
            Error::new(
                ErrorKind::NoMatchingImage,
                format!("No image matches {}", config.image),
            )
        })?;

        let selectors = config.network_selectors();
        let networks = if selectors.is_empty() {
            Vec::new()
        } else {
            let listing = self.network.list_networks().await?;
            resolve_networks(&selectors, &listing, &machine.declared_interfaces())
        };

        let name = config
            .server_name
            .clone()
            .unwrap_or_else(|| machine.name().to_string());
        let spec = LaunchSpec::new(
            config,
            FlavorRef::from(flavor.id.clone()),
            ImageRef::from(image.id.clone()),
            name,
            networks,
        );

        self.ui.info(&format!(" -- Flavor: {}", flavor.name));
        self.ui.info(&format!(" -- Image: {}", image.name));
        self.ui.info(&format!(" -- Name: {}", spec.name()));
        if let Some(keypair) = spec.keypair_name() {
            self.ui.info(&format!(" -- KeyPair: {}", keypair));
        }
        for nic in spec.networks() {
            self.ui.info(&format!(" -- Network: {}", nic.network));
        }

        let provisioner = ServerProvisioner::new(
            self.compute,
            self.ui,
            &self.interrupt,
            config.max_attempts,
            config.attempt_timeout,
        );

        self.enter(LaunchStage::Submitting);
        let server = provisioner.submit(&spec, machine).await?;

        self.enter(LaunchStage::Building);
        self.ui.info("Waiting for the server to be built...");
        if provisioner.wait_for_build(&server).await? == WaitOutcome::Cancelled {
            return Ok(self.cancelled(server, LaunchStage::Building));
        }

        let floating_ip = match spec.floating_ip() {
            Some(directive) => {
                self.enter(LaunchStage::AssigningFloatingIp);
                let assignment = FloatingIpAssigner::new(self.compute, self.ui)
                    .with_release_on_failure(config.release_floating_ip_on_failure)
                    .assign(&server, directive, spec.floating_ip_pool())
                    .await?;
                Some(assignment.address)
            }
            None => None,
        };

        self.enter(LaunchStage::AwaitingReachability);
        self.ui.info("Waiting for the server to become reachable...");
        let waiter =
            ReachabilityWaiter::new(reachability, &self.interrupt, config.ssh_poll_interval);
        if waiter.wait().await? == WaitOutcome::Cancelled {
            return Ok(self.cancelled(server, LaunchStage::AwaitingReachability));
        }

        self.enter(LaunchStage::Ready);
        self.ui.info("The server is ready!");
        Ok(Launched::Ready {
            server,
            floating_ip,
        })
    }

    fn enter(&self, stage: LaunchStage) {
        debug!("Launch entering stage {:?}", stage);
    }

    fn cancelled(&self, server: ServerRef, stage: LaunchStage) -> Launched {
        info!("Launch of server {} interrupted at stage {:?}", server, stage);
        Launched::Cancelled { server, stage }
    }
}

impl fmt::Debug for CreateServer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateServer")
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}
