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

use std::env;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

use openstack_launch::cloud::Cloud;
use openstack_launch::launch::{
    CreateServer, DeclaredInterface, LaunchConfig, LogUi, MachineState, Reachability,
};
use openstack_launch::{Interrupt, Result, ServerRef};

struct Machine {
    name: String,
    id: Option<ServerRef>,
}

impl MachineState for Machine {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_id(&mut self, id: &ServerRef) -> Result<()> {
        self.id = Some(id.clone());
        Ok(())
    }

    fn declared_interfaces(&self) -> Vec<DeclaredInterface> {
        Vec::new()
    }
}

/// Checks that the SSH port accepts connections.
struct SshPort(SocketAddr);

#[async_trait]
impl Reachability for SshPort {
    async fn is_reachable(&self) -> Result<bool> {
        match timeout(Duration::from_secs(2), TcpStream::connect(self.0)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(err)) if err.kind() == io::ErrorKind::ConnectionRefused => Ok(false),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Ok(false),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let config_path = env::args().nth(1).expect("Provide a launch configuration");
    let name = env::args().nth(2).expect("Provide a server name");
    let address: SocketAddr = env::args()
        .nth(3)
        .expect("Provide an address to check SSH on, e.g. 172.24.4.10:22")
        .parse()
        .expect("Invalid address");

    let os = Cloud::from_env()
        .await
        .expect("Failed to create an identity provider from the environment");
    let config = LaunchConfig::from_file(config_path).expect("Invalid launch configuration");

    let mut machine = Machine { name, id: None };
    let step = CreateServer::new(&os, &os, &LogUi, Interrupt::new());
    let launched = step
        .call(&config, &mut machine, &SshPort(address))
        .await
        .expect("Failed to launch a server");
    println!("{:?}", launched);
    if let Some(id) = machine.id {
        println!("Recorded server ID = {}", id);
    }
}
