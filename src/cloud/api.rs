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

//! Foundation bits exposing the Compute and Network APIs.

use osauth::services::{COMPUTE, NETWORK};
use osauth::Session;

use super::super::Result;
use super::protocol::*;

/// List flavors with details.
pub async fn list_flavors(session: &Session) -> Result<Vec<Flavor>> {
    trace!("Listing flavors");
    let root: FlavorsRoot = session.get(COMPUTE, &["flavors", "detail"]).fetch().await?;
    trace!("Received flavors: {:?}", root.flavors);
    Ok(root.flavors)
}

/// List images known to the Compute API.
pub async fn list_images(session: &Session) -> Result<Vec<Image>> {
    trace!("Listing images");
    let root: ImagesRoot = session.get(COMPUTE, &["images", "detail"]).fetch().await?;
    trace!("Received images: {:?}", root.images);
    Ok(root.images)
}

/// List networks.
pub async fn list_networks(session: &Session) -> Result<Vec<Network>> {
    trace!("Listing networks");
    let root: NetworksRoot = session.get(NETWORK, &["networks"]).fetch().await?;
    trace!("Received networks: {:?}", root.networks);
    Ok(root.networks)
}

/// Create a server.
pub async fn create_server(session: &Session, request: ServerCreateRoot) -> Result<CreatedServer> {
    trace!("Creating a server with {:?}", request);
    let root: CreatedServerRoot = session
        .post(COMPUTE, &["servers"])
        .json(&request)
        .fetch()
        .await?;
    trace!("Requested creation of server {:?}", root.server);
    Ok(root.server)
}

/// Get a server.
pub async fn get_server<S: AsRef<str>>(session: &Session, id: S) -> Result<Server> {
    trace!("Fetching server {}", id.as_ref());
    let root: ServerRoot = session.get(COMPUTE, &["servers", id.as_ref()]).fetch().await?;
    trace!("Received {:?}", root.server);
    Ok(root.server)
}

/// List floating IPs allocated to the project.
pub async fn list_floating_ips(session: &Session) -> Result<Vec<FloatingIp>> {
    trace!("Listing floating IPs");
    let root: FloatingIpsRoot = session.get(COMPUTE, &["os-floating-ips"]).fetch().await?;
    trace!("Received floating IPs: {:?}", root.floating_ips);
    Ok(root.floating_ips)
}

/// Allocate a floating IP from the pool.
pub async fn allocate_floating_ip<S: Into<String>>(
    session: &Session,
    pool: S,
) -> Result<FloatingIp> {
    let body = FloatingIpCreate { pool: pool.into() };
    trace!("Allocating a floating IP with {:?}", body);
    let root: FloatingIpRoot = session
        .post(COMPUTE, &["os-floating-ips"])
        .json(&body)
        .fetch()
        .await?;
    debug!("Allocated floating IP {:?}", root.floating_ip);
    Ok(root.floating_ip)
}

/// Release a floating IP back to its pool.
pub async fn release_floating_ip<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
    trace!("Releasing floating IP {}", id.as_ref());
    let _ = session
        .delete(COMPUTE, &["os-floating-ips", id.as_ref()])
        .send()
        .await?;
    debug!("Released floating IP {}", id.as_ref());
    Ok(())
}

/// Associate a floating IP with a server.
pub async fn add_floating_ip<S1, S2>(session: &Session, server_id: S1, address: S2) -> Result<()>
where
    S1: AsRef<str>,
    S2: Into<String>,
{
    let body = AddFloatingIpRoot {
        addFloatingIp: AddFloatingIp {
            address: address.into(),
        },
    };
    trace!("Running {:?} on server {}", body, server_id.as_ref());
    let _ = session
        .post(COMPUTE, &["servers", server_id.as_ref(), "action"])
        .json(&body)
        .send()
        .await?;
    debug!(
        "Associated floating IP {} with server {}",
        body.addFloatingIp.address,
        server_id.as_ref()
    );
    Ok(())
}
