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

//! Cloud clients used by the launch step.
//!
//! The launch step only talks to the cloud through the [ComputeClient] and
//! [NetworkClient] traits. [Cloud] implements both on top of an
//! [osauth::Session].
//!
//! # Example
//!
//! ```rust,no_run
//! use openstack_launch::cloud::{Cloud, ComputeClient};
//!
//! # async fn list() -> openstack_launch::Result<()> {
//! let os = Cloud::from_env().await?;
//! for flavor in os.list_flavors().await? {
//!     println!("{} {}", flavor.id, flavor.name);
//! }
//! # Ok(()) }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use osauth::Session;

use super::launch::LaunchSpec;
use super::types::ServerRef;
use super::Result;

mod api;
mod protocol;
mod waiter;

pub use self::protocol::{Flavor, FloatingIp, Image, Network, Server};

/// Compute API operations needed to launch a server.
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// List all flavors.
    async fn list_flavors(&self) -> Result<Vec<Flavor>>;

    /// List all images.
    async fn list_images(&self) -> Result<Vec<Image>>;

    /// List floating IPs allocated to the project.
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;

    /// Request creation of a server, returning its ID.
    async fn create_server(&self, spec: &LaunchSpec) -> Result<ServerRef>;

    /// Fetch the current state of a server.
    async fn get_server(&self, id: &ServerRef) -> Result<Server>;

    /// Wait for the server to become active.
    ///
    /// Calls `progress` with the build progress on every poll. Fails with
    /// `OperationTimedOut` once `timeout` expires and with
    /// `InvalidTransition` if the server reaches a failed state instead.
    async fn wait_until_active(
        &self,
        id: &ServerRef,
        timeout: Duration,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<()>;

    /// Allocate a floating IP from the pool.
    ///
    /// The returned address may be missing if the cloud failed to provide one.
    async fn allocate_floating_ip(&self, pool: &str) -> Result<FloatingIp>;

    /// Associate the floating IP with a server.
    async fn associate_floating_ip(&self, server: &ServerRef, floating_ip: &FloatingIp)
        -> Result<()>;

    /// Release a previously allocated floating IP.
    async fn release_floating_ip(&self, floating_ip: &FloatingIp) -> Result<()>;
}

/// Network API operations needed to launch a server.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// List all networks.
    async fn list_networks(&self) -> Result<Vec<Network>>;
}

/// OpenStack cloud API.
#[derive(Debug, Clone)]
pub struct Cloud {
    session: Session,
    poll_delay: Duration,
}

impl Cloud {
    /// Create a new cloud object from a session.
    pub fn new(session: Session) -> Cloud {
        Cloud {
            session,
            poll_delay: Duration::new(1, 0),
        }
    }

    /// Create a new cloud object from a `clouds.yaml` entry.
    pub async fn from_config<S: AsRef<str>>(cloud_name: S) -> Result<Cloud> {
        Ok(Cloud::new(Session::from_config(cloud_name).await?))
    }

    /// Create a new cloud object from `OS_*` environment variables.
    pub async fn from_env() -> Result<Cloud> {
        Ok(Cloud::new(Session::from_env().await?))
    }

    /// Change the delay between server status refreshes.
    pub fn with_poll_delay(mut self, poll_delay: Duration) -> Cloud {
        self.poll_delay = poll_delay;
        self
    }

    /// Reference to the session used.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl From<Session> for Cloud {
    fn from(value: Session) -> Cloud {
        Cloud::new(value)
    }
}

#[async_trait]
impl ComputeClient for Cloud {
    async fn list_flavors(&self) -> Result<Vec<Flavor>> {
        api::list_flavors(&self.session).await
    }

    async fn list_images(&self) -> Result<Vec<Image>> {
        api::list_images(&self.session).await
    }

    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>> {
        api::list_floating_ips(&self.session).await
    }

    async fn create_server(&self, spec: &LaunchSpec) -> Result<ServerRef> {
        let created = api::create_server(&self.session, server_create_request(spec)).await?;
        Ok(ServerRef::from(created.id))
    }

    async fn get_server(&self, id: &ServerRef) -> Result<Server> {
        api::get_server(&self.session, id).await
    }

    async fn wait_until_active(
        &self,
        id: &ServerRef,
        timeout: Duration,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<()> {
        waiter::ServerStatusWaiter::new(
            id,
            || api::get_server(&self.session, id),
            timeout,
            self.poll_delay,
            progress,
        )
        .wait()
        .await
    }

    async fn allocate_floating_ip(&self, pool: &str) -> Result<FloatingIp> {
        api::allocate_floating_ip(&self.session, pool).await
    }

    async fn associate_floating_ip(
        &self,
        server: &ServerRef,
        floating_ip: &FloatingIp,
    ) -> Result<()> {
        api::add_floating_ip(&self.session, server, floating_ip.ip.clone().unwrap_or_default())
            .await
    }

    async fn release_floating_ip(&self, floating_ip: &FloatingIp) -> Result<()> {
        api::release_floating_ip(&self.session, &floating_ip.id).await
    }
}

#[async_trait]
impl NetworkClient for Cloud {
    async fn list_networks(&self) -> Result<Vec<Network>> {
        api::list_networks(&self.session).await
    }
}

/// Convert a launch specification into a server creation request.
fn server_create_request(spec: &LaunchSpec) -> protocol::ServerCreateRoot {
    protocol::ServerCreateRoot {
        server: protocol::ServerCreate {
            flavorRef: spec.flavor().to_string(),
            imageRef: spec.image().to_string(),
            key_name: spec.keypair_name().map(String::from),
            metadata: spec.metadata().clone(),
            name: spec.name().to_string(),
            networks: spec
                .networks()
                .iter()
                .map(|nic| protocol::ServerNetwork {
                    uuid: nic.network.to_string(),
                    fixed_ip: nic.fixed_ip,
                })
                .collect(),
            security_groups: spec
                .security_groups()
                .iter()
                .map(|name| protocol::SecurityGroup { name: name.clone() })
                .collect(),
            user_data: spec.user_data().map(|data| BASE64.encode(data)),
            availability_zone: spec.availability_zone().map(String::from),
        },
        scheduler_hints: spec.scheduler_hints().clone(),
    }
}

#[cfg(test)]
mod test {
    use super::super::launch::{LaunchConfig, LaunchSpec, NetworkAttachment};
    use super::server_create_request;

    #[test]
    fn test_server_create_request() {
        let mut config = LaunchConfig::new("m1.small", "ubuntu")
            .with_keypair_name("default")
            .with_user_data("#cloud-config\n")
            .with_security_group("ssh");
        let _ = config
            .metadata
            .insert("owner".to_string(), "ci".to_string());
        let spec = LaunchSpec::new(
            &config,
            "f1".into(),
            "i1".into(),
            "vm-1".to_string(),
            vec![NetworkAttachment {
                network: "n1".into(),
                fixed_ip: None,
            }],
        );

        let request = server_create_request(&spec);
        assert_eq!(request.server.flavorRef, "f1");
        assert_eq!(request.server.imageRef, "i1");
        assert_eq!(request.server.name, "vm-1");
        assert_eq!(request.server.key_name.as_deref(), Some("default"));
        assert_eq!(request.server.metadata.get("owner").unwrap(), "ci");
        assert_eq!(request.server.networks.len(), 1);
        assert_eq!(request.server.networks[0].uuid, "n1");
        assert_eq!(request.server.security_groups[0].name, "ssh");
        assert_eq!(
            request.server.user_data.as_deref(),
            Some("I2Nsb3VkLWNvbmZpZwo=")
        );
        assert!(request.scheduler_hints.is_empty());
    }
}
