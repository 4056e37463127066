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

//! Floating IP acquisition and association.

use std::fmt;

use super::super::cloud::{ComputeClient, FloatingIp};
use super::super::common::{find_match, Selector};
use super::super::types::ServerRef;
use super::super::{Error, ErrorKind, Result};
use super::config::FloatingIpDirective;
use super::env::Ui;

/// A floating IP bound to a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingIpAssignment {
    /// The floating IP address.
    pub address: String,
    /// The server it is bound to.
    pub server: ServerRef,
}

/// Obtains a floating IP and binds it to a server.
pub struct FloatingIpAssigner<'a> {
    compute: &'a dyn ComputeClient,
    ui: &'a dyn Ui,
    release_on_failure: bool,
}

impl<'a> FloatingIpAssigner<'a> {
    /// Create an assigner.
    pub fn new(compute: &'a dyn ComputeClient, ui: &'a dyn Ui) -> FloatingIpAssigner<'a> {
        FloatingIpAssigner {
            compute,
            ui,
            release_on_failure: false,
        }
    }

    /// Release an address allocated by this assigner if association fails.
    ///
    /// By default such an address is left allocated.
    pub fn with_release_on_failure(mut self, value: bool) -> FloatingIpAssigner<'a> {
        self.release_on_failure = value;
        self
    }

    /// Determine the address to use and associate it with the server.
    ///
    /// With `Auto` and a pool, a new address is allocated from the pool.
    /// With `Auto` and no pool, the first existing address without a fixed IP
    /// is used. An explicit address is used as is.
    pub async fn assign(
        &self,
        server: &ServerRef,
        directive: &FloatingIpDirective,
        pool: Option<&str>,
    ) -> Result<FloatingIpAssignment> {
        let (address, allocated) = match (directive, pool) {
            (FloatingIpDirective::Auto, Some(pool)) => {
                let floating_ip = self.compute.allocate_floating_ip(pool).await?;
                match floating_ip.ip.clone() {
                    Some(address) => (address, Some(floating_ip)),
                    None => {
                        return Err(Error::new(
                            ErrorKind::FloatingIpNotAllocated,
                            format!("Pool {} returned no address", pool),
                        ))
                    }
                }
            }
            (FloatingIpDirective::Auto, None) => (self.find_unused().await?, None),
            (FloatingIpDirective::Address(address), _) => (address.clone(), None),
        };

        self.ui.info(&format!("Using floating IP {}", address));

        let floating_ips = self.compute.list_floating_ips().await?;
        let floating_ip = find_match(&floating_ips, &Selector::exact(address.as_str()))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::FloatingIpNotFound,
                    format!("Floating IP {} does not exist", address),
                )
            })?;

        if let Err(err) = self.compute.associate_floating_ip(server, floating_ip).await {
            if let Some(allocated) = allocated.as_ref().filter(|_| self.release_on_failure) {
                warn!(
                    "Failed to associate {} with server {}, releasing it",
                    address, server
                );
                if let Err(release_err) = self.compute.release_floating_ip(allocated).await {
                    warn!("Failed to release floating IP {}: {}", address, release_err);
                }
            }
            return Err(err);
        }

        info!("Floating IP {} associated with server {}", address, server);
        Ok(FloatingIpAssignment {
            address,
            server: server.clone(),
        })
    }

    async fn find_unused(&self) -> Result<String> {
        self.compute
            .list_floating_ips()
            .await?
            .into_iter()
            .filter(FloatingIp::is_unused)
            .find_map(|floating_ip| floating_ip.ip)
            .ok_or_else(|| Error::new(ErrorKind::FloatingIpNotFound, "No free floating IP found"))
    }
}

impl fmt::Debug for FloatingIpAssigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingIpAssigner")
            .field("release_on_failure", &self.release_on_failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::super::super::{Error, ErrorKind};
    use super::super::config::FloatingIpDirective;
    use super::super::fakes::{floating_ip, FakeCompute, RecordingUi};
    use super::FloatingIpAssigner;

    #[tokio::test]
    async fn test_auto_with_pool() {
        let mut compute = FakeCompute::new();
        compute.allocated = Some(floating_ip("fip-9", Some("172.24.4.9"), None));
        let ui = RecordingUi::default();

        let result = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, Some("public"))
            .await
            .unwrap();
        assert_eq!(result.address, "172.24.4.9");
        assert_eq!(result.server.as_ref(), "srv-42");
        assert_eq!(
            compute.events(),
            vec!["allocate:public", "list_floating_ips", "associate:172.24.4.9"]
        );
        assert!(ui.messages().iter().any(|m| m.contains("172.24.4.9")));
    }

    #[tokio::test]
    async fn test_auto_with_pool_without_address() {
        let mut compute = FakeCompute::new();
        compute.allocated = Some(floating_ip("fip-9", None, None));
        let ui = RecordingUi::default();

        let err = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, Some("public"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FloatingIpNotAllocated);
        assert_eq!(compute.events(), vec!["allocate:public"]);
    }

    #[tokio::test]
    async fn test_auto_picks_first_unused() {
        let compute = FakeCompute::new().with_floating_ips(vec![
            floating_ip("1", Some("172.24.4.1"), Some("10.0.0.1")),
            floating_ip("2", Some("172.24.4.2"), None),
            floating_ip("3", Some("172.24.4.3"), None),
        ]);
        let ui = RecordingUi::default();

        let result = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, None)
            .await
            .unwrap();
        assert_eq!(result.address, "172.24.4.2");
        assert_eq!(
            compute.events(),
            vec!["list_floating_ips", "list_floating_ips", "associate:172.24.4.2"]
        );
    }

    #[tokio::test]
    async fn test_auto_without_unused() {
        let compute = FakeCompute::new().with_floating_ips(vec![floating_ip(
            "1",
            Some("172.24.4.1"),
            Some("10.0.0.1"),
        )]);
        let ui = RecordingUi::default();

        let err = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FloatingIpNotFound);
    }

    #[tokio::test]
    async fn test_explicit_address() {
        let compute = FakeCompute::new().with_floating_ips(vec![
            floating_ip("1", Some("172.24.4.1"), None),
            floating_ip("7", Some("172.24.4.7"), None),
        ]);
        let ui = RecordingUi::default();

        let directive = FloatingIpDirective::Address("172.24.4.7".to_string());
        let result = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &directive, Some("ignored"))
            .await
            .unwrap();
        assert_eq!(result.address, "172.24.4.7");
        assert_eq!(
            compute.events(),
            vec!["list_floating_ips", "associate:172.24.4.7"]
        );
    }

    #[tokio::test]
    async fn test_explicit_address_missing() {
        let compute = FakeCompute::new();
        let ui = RecordingUi::default();

        let directive = FloatingIpDirective::Address("172.24.4.7".to_string());
        let err = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &directive, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FloatingIpNotFound);
    }

    #[tokio::test]
    async fn test_association_failure_leaks_by_default() {
        let mut compute = FakeCompute::new();
        compute.allocated = Some(floating_ip("fip-9", Some("172.24.4.9"), None));
        compute.associate_error = Some(Error::new(ErrorKind::IoError, "conflict"));
        let ui = RecordingUi::default();

        let err = FloatingIpAssigner::new(&compute, &ui)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, Some("public"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert!(!compute.events().iter().any(|e| e.starts_with("release")));
    }

    #[tokio::test]
    async fn test_association_failure_releases_when_asked() {
        let mut compute = FakeCompute::new();
        compute.allocated = Some(floating_ip("fip-9", Some("172.24.4.9"), None));
        compute.associate_error = Some(Error::new(ErrorKind::IoError, "conflict"));
        let ui = RecordingUi::default();

        let err = FloatingIpAssigner::new(&compute, &ui)
            .with_release_on_failure(true)
            .assign(&"srv-42".into(), &FloatingIpDirective::Auto, Some("public"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(compute.events().last().unwrap(), "release:fip-9");
    }

    #[tokio::test]
    async fn test_existing_address_never_released() {
        let mut compute = FakeCompute::new()
            .with_floating_ips(vec![floating_ip("7", Some("172.24.4.7"), None)]);
        compute.associate_error = Some(Error::new(ErrorKind::IoError, "conflict"));
        let ui = RecordingUi::default();

        let directive = FloatingIpDirective::Address("172.24.4.7".to_string());
        let _ = FloatingIpAssigner::new(&compute, &ui)
            .with_release_on_failure(true)
            .assign(&"srv-42".into(), &directive, None)
            .await
            .unwrap_err();
        assert!(!compute.events().iter().any(|e| e.starts_with("release")));
    }
}
