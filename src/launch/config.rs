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

//! Launch configuration.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::super::common::Selector;
use super::super::{Error, ErrorKind, Result};

/// How to obtain a floating IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloatingIpDirective {
    /// Allocate from the pool or pick an unused one.
    Auto,
    /// Use this exact address.
    Address(String),
}

/// Configuration of a server launch.
///
/// Can be built in code or loaded from YAML:
///
/// ```yaml
/// flavor: m1.small
/// image: /^ubuntu-24/
/// networks: [private, storage]
/// floating_ip: auto
/// floating_ip_pool: public
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchConfig {
    /// Flavor selector.
    pub flavor: Selector,
    /// Image selector.
    pub image: Selector,
    /// Single network selector, used when `networks` is empty.
    #[serde(default)]
    pub network: Option<Selector>,
    /// Network selectors, in interface order.
    #[serde(default)]
    pub networks: Vec<Selector>,
    /// Server name, defaults to the machine name.
    #[serde(default)]
    pub server_name: Option<String>,
    /// Key pair to inject.
    #[serde(default)]
    pub keypair_name: Option<String>,
    /// Server metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// User data (not encoded).
    #[serde(default)]
    pub user_data: Option<String>,
    /// Security group names.
    #[serde(default)]
    pub security_groups: Vec<String>,
    /// Scheduler hints.
    #[serde(default)]
    pub scheduler_hints: HashMap<String, serde_json::Value>,
    /// Availability zone.
    #[serde(default)]
    pub availability_zone: Option<String>,
    /// Floating IP to attach.
    #[serde(default)]
    pub floating_ip: Option<FloatingIpDirective>,
    /// Pool to allocate an automatic floating IP from.
    #[serde(default)]
    pub floating_ip_pool: Option<String>,
    /// Release a freshly allocated floating IP if association fails.
    #[serde(default)]
    pub release_floating_ip_on_failure: bool,
    /// How many times to wait for the server to become active.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// How long a single wait lasts (seconds in YAML).
    #[serde(default = "default_attempt_timeout", deserialize_with = "deser_seconds")]
    pub attempt_timeout: Duration,
    /// Delay between reachability checks (seconds in YAML).
    #[serde(default = "default_ssh_poll_interval", deserialize_with = "deser_seconds")]
    pub ssh_poll_interval: Duration,
}

#[inline]
fn default_max_attempts() -> u32 {
    200
}

#[inline]
fn default_attempt_timeout() -> Duration {
    Duration::from_secs(5)
}

#[inline]
fn default_ssh_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn deser_seconds<'de, D>(des: D) -> ::std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Duration::from_secs(u64::deserialize(des)?))
}

impl LaunchConfig {
    /// Create a configuration with the flavor and image selectors.
    pub fn new<F, I>(flavor: F, image: I) -> LaunchConfig
    where
        F: Into<Selector>,
        I: Into<Selector>,
    {
        LaunchConfig {
            flavor: flavor.into(),
            image: image.into(),
            network: None,
            networks: Vec::new(),
            server_name: None,
            keypair_name: None,
            metadata: HashMap::new(),
            user_data: None,
            security_groups: Vec::new(),
            scheduler_hints: HashMap::new(),
            availability_zone: None,
            floating_ip: None,
            floating_ip_pool: None,
            release_floating_ip_on_failure: false,
            max_attempts: default_max_attempts(),
            attempt_timeout: default_attempt_timeout(),
            ssh_poll_interval: default_ssh_poll_interval(),
        }
    }

    /// Parse a YAML document.
    pub fn from_yaml<S: AsRef<str>>(source: S) -> Result<LaunchConfig> {
        let config: LaunchConfig = serde_yaml::from_str(source.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<LaunchConfig> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot read {}: {}", path.display(), err),
            )
        })?;
        debug!("Loaded launch configuration from {}", path.display());
        LaunchConfig::from_yaml(source)
    }

    /// Check the configuration for obvious mistakes.
    pub fn validate(&self) -> Result<()> {
        if self.flavor.is_empty() {
            return Err(Error::new(ErrorKind::InvalidConfig, "Flavor must be set"));
        }
        if self.image.is_empty() {
            return Err(Error::new(ErrorKind::InvalidConfig, "Image must be set"));
        }
        if self.max_attempts == 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                "max_attempts must be positive",
            ));
        }
        Ok(())
    }

    /// Network selectors to use, in interface order.
    ///
    /// `networks` takes precedence over the single `network`.
    pub fn network_selectors(&self) -> Vec<&Selector> {
        if !self.networks.is_empty() {
            self.networks.iter().collect()
        } else {
            self.network.iter().collect()
        }
    }

    /// Add a network selector.
    pub fn with_network<S: Into<Selector>>(mut self, network: S) -> LaunchConfig {
        self.networks.push(network.into());
        self
    }

    /// Set the server name.
    pub fn with_server_name<S: Into<String>>(mut self, name: S) -> LaunchConfig {
        self.server_name = Some(name.into());
        self
    }

    /// Set the key pair name.
    pub fn with_keypair_name<S: Into<String>>(mut self, name: S) -> LaunchConfig {
        self.keypair_name = Some(name.into());
        self
    }

    /// Set user data.
    pub fn with_user_data<S: Into<String>>(mut self, user_data: S) -> LaunchConfig {
        self.user_data = Some(user_data.into());
        self
    }

    /// Add a security group.
    pub fn with_security_group<S: Into<String>>(mut self, name: S) -> LaunchConfig {
        self.security_groups.push(name.into());
        self
    }

    /// Request a floating IP.
    pub fn with_floating_ip(mut self, directive: FloatingIpDirective) -> LaunchConfig {
        self.floating_ip = Some(directive);
        self
    }

    /// Set the floating IP pool.
    pub fn with_floating_ip_pool<S: Into<String>>(mut self, pool: S) -> LaunchConfig {
        self.floating_ip_pool = Some(pool.into());
        self
    }

    /// Set the number of wait attempts and the timeout of each of them.
    pub fn with_wait(mut self, max_attempts: u32, attempt_timeout: Duration) -> LaunchConfig {
        self.max_attempts = max_attempts;
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Set the delay between reachability checks.
    pub fn with_ssh_poll_interval(mut self, interval: Duration) -> LaunchConfig {
        self.ssh_poll_interval = interval;
        self
    }
}

impl fmt::Display for FloatingIpDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatingIpDirective::Auto => f.write_str("auto"),
            FloatingIpDirective::Address(address) => f.write_str(address),
        }
    }
}

impl<'de> Deserialize<'de> for FloatingIpDirective {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<FloatingIpDirective, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(if value == "auto" {
            FloatingIpDirective::Auto
        } else {
            FloatingIpDirective::Address(value)
        })
    }
}
