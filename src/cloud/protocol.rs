// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! JSON structures and protocol bits for the Compute and Network APIs.

#![allow(non_snake_case)]
#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::Ipv4Addr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

use super::super::common::Resource;

/// Deserialize `null` as the default value.
fn null_as_default<'de, D, T>(des: D) -> ::std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(des)?.unwrap_or_default())
}

/// A compute flavor.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ram: u64,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub disk: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FlavorsRoot {
    pub flavors: Vec<Flavor>,
}

/// An image as exposed by the Compute API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Image {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ImagesRoot {
    pub images: Vec<Image>,
}

/// A network from the Network API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Network {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "router:external", default)]
    pub external: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NetworksRoot {
    pub networks: Vec<Network>,
}

/// Current view of a server.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Server {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: u8,
    #[serde(rename = "created", default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerRoot {
    pub server: Server,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerNetwork {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<Ipv4Addr>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SecurityGroup {
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerCreate {
    pub flavorRef: String,
    pub imageRef: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<ServerNetwork>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<SecurityGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ServerCreateRoot {
    pub server: ServerCreate,
    #[serde(
        rename = "os:scheduler_hints",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub scheduler_hints: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatedServer {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatedServerRoot {
    pub server: CreatedServer,
}

/// A floating IP address as exposed by the Compute API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub fixed_ip: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FloatingIpsRoot {
    pub floating_ips: Vec<FloatingIp>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FloatingIpRoot {
    pub floating_ip: FloatingIp,
}

#[derive(Clone, Debug, Serialize)]
pub struct FloatingIpCreate {
    pub pool: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AddFloatingIp {
    pub address: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AddFloatingIpRoot {
    pub addFloatingIp: AddFloatingIp,
}

impl FloatingIp {
    /// Whether no fixed IP is bound to this address.
    #[inline]
    pub fn is_unused(&self) -> bool {
        self.fixed_ip.is_none()
    }
}

impl Resource for Flavor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Image {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Network {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Floating IPs are looked up by their address.
impl Resource for FloatingIp {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        self.ip.as_deref().unwrap_or_default()
    }
}
