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

//! Server creation request.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::super::cloud::Network;
use super::super::common::{find_match, Selector};
use super::super::types::{FlavorRef, ImageRef, NetworkRef};
use super::config::{FloatingIpDirective, LaunchConfig};
use super::env::DeclaredInterface;

/// A network to attach the server to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    /// Network ID.
    pub network: NetworkRef,
    /// Fixed IP to request on this network.
    pub fixed_ip: Option<Ipv4Addr>,
}

/// Everything needed to request a server.
///
/// Built once per launch and not modified afterwards.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    flavor: FlavorRef,
    image: ImageRef,
    name: String,
    keypair_name: Option<String>,
    metadata: HashMap<String, String>,
    user_data: Option<String>,
    security_groups: Vec<String>,
    scheduler_hints: HashMap<String, serde_json::Value>,
    availability_zone: Option<String>,
    networks: Vec<NetworkAttachment>,
    floating_ip: Option<FloatingIpDirective>,
    floating_ip_pool: Option<String>,
}

impl LaunchSpec {
    /// Create a launch specification from the configuration and resolved IDs.
    pub fn new(
        config: &LaunchConfig,
        flavor: FlavorRef,
        image: ImageRef,
        name: String,
        networks: Vec<NetworkAttachment>,
    ) -> LaunchSpec {
        LaunchSpec {
            flavor,
            image,
            name,
            keypair_name: config.keypair_name.clone(),
            metadata: config.metadata.clone(),
            user_data: config.user_data.clone(),
            security_groups: config.security_groups.clone(),
            scheduler_hints: config.scheduler_hints.clone(),
            availability_zone: config.availability_zone.clone(),
            networks,
            floating_ip: config.floating_ip.clone(),
            floating_ip_pool: config.floating_ip_pool.clone(),
        }
    }

    /// Flavor ID.
    #[inline]
    pub fn flavor(&self) -> &FlavorRef {
        &self.flavor
    }

    /// Image ID.
    #[inline]
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Server name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key pair name.
    #[inline]
    pub fn keypair_name(&self) -> Option<&str> {
        self.keypair_name.as_deref()
    }

    /// Server metadata.
    #[inline]
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// User data.
    #[inline]
    pub fn user_data(&self) -> Option<&str> {
        self.user_data.as_deref()
    }

    /// Security group names.
    #[inline]
    pub fn security_groups(&self) -> &[String] {
        &self.security_groups
    }

    /// Scheduler hints.
    #[inline]
    pub fn scheduler_hints(&self) -> &HashMap<String, serde_json::Value> {
        &self.scheduler_hints
    }

    /// Availability zone.
    #[inline]
    pub fn availability_zone(&self) -> Option<&str> {
        self.availability_zone.as_deref()
    }

    /// Networks to attach, in interface order.
    #[inline]
    pub fn networks(&self) -> &[NetworkAttachment] {
        &self.networks
    }

    /// Floating IP directive.
    #[inline]
    pub fn floating_ip(&self) -> Option<&FloatingIpDirective> {
        self.floating_ip.as_ref()
    }

    /// Floating IP pool.
    #[inline]
    pub fn floating_ip_pool(&self) -> Option<&str> {
        self.floating_ip_pool.as_deref()
    }
}

/// Resolve network selectors against the network listing.
///
/// Selector *i* takes its fixed IP from declared interface *i*. Selectors
/// that match no network are skipped.
pub fn resolve_networks(
    selectors: &[&Selector],
    listing: &[Network],
    interfaces: &[DeclaredInterface],
) -> Vec<NetworkAttachment> {
    selectors
        .iter()
        .enumerate()
        .filter_map(|(index, selector)| match find_match(listing, selector) {
            Some(network) => Some(NetworkAttachment {
                network: NetworkRef::from(network.id.clone()),
                fixed_ip: interfaces.get(index).and_then(|iface| iface.ip),
            }),
            None => {
                warn!("No network matches {}, it will not be attached", selector);
                None
            }
        })
        .collect()
}
