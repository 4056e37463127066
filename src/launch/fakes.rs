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

//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::super::cloud::{
    ComputeClient, Flavor, FloatingIp, Image, Network, NetworkClient, Server,
};
use super::super::common::Interrupt;
use super::super::types::ServerRef;
use super::super::{Error, Result};
use super::env::{DeclaredInterface, MachineState, Reachability, Ui};
use super::spec::LaunchSpec;

/// Shared journal of calls made to the fakes.
pub type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

pub fn floating_ip(id: &str, ip: Option<&str>, fixed_ip: Option<&str>) -> FloatingIp {
    FloatingIp {
        id: id.to_string(),
        ip: ip.map(String::from),
        fixed_ip: fixed_ip.map(String::from),
        ..Default::default()
    }
}

fn flavor(id: &str, name: &str) -> Flavor {
    Flavor {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

fn image(id: &str, name: &str) -> Image {
    Image {
        id: id.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

pub struct FakeCompute {
    pub log: Log,
    pub flavors: Vec<Flavor>,
    pub images: Vec<Image>,
    pub floating_ips: Mutex<Vec<FloatingIp>>,
    pub allocated: Option<FloatingIp>,
    pub create_error: Option<Error>,
    pub associate_error: Option<Error>,
    pub server_status: String,
    pub interrupt: Interrupt,
    wait_results: Mutex<VecDeque<Result<()>>>,
    interrupt_after_wait: bool,
    specs: Mutex<Vec<LaunchSpec>>,
}

impl FakeCompute {
    pub fn new() -> FakeCompute {
        FakeCompute {
            log: Log::default(),
            flavors: vec![flavor("f-1", "m1.tiny"), flavor("f-2", "m1.small")],
            images: vec![image("1", "ubuntu"), image("2", "centos")],
            floating_ips: Mutex::new(Vec::new()),
            allocated: None,
            create_error: None,
            associate_error: None,
            server_status: "ACTIVE".to_string(),
            interrupt: Interrupt::new(),
            wait_results: Mutex::new(VecDeque::new()),
            interrupt_after_wait: false,
            specs: Mutex::new(Vec::new()),
        }
    }

    /// Results of consecutive waits, success once exhausted.
    pub fn with_wait_results(self, results: Vec<Result<()>>) -> FakeCompute {
        *self.wait_results.lock().unwrap() = results.into();
        self
    }

    pub fn with_floating_ips(self, floating_ips: Vec<FloatingIp>) -> FakeCompute {
        *self.floating_ips.lock().unwrap() = floating_ips;
        self
    }

    /// Raise `interrupt` after every wait.
    pub fn interrupt_after_wait(mut self) -> FakeCompute {
        self.interrupt_after_wait = true;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|event| !event.starts_with("get_server"))
            .cloned()
            .collect()
    }

    pub fn wait_calls(&self) -> usize {
        self.events().iter().filter(|e| *e == "wait").count()
    }

    pub fn last_spec(&self) -> Option<LaunchSpec> {
        self.specs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ComputeClient for FakeCompute {
    async fn list_flavors(&self) -> Result<Vec<Flavor>> {
        record(&self.log, "list_flavors");
        Ok(self.flavors.clone())
    }

    async fn list_images(&self) -> Result<Vec<Image>> {
        record(&self.log, "list_images");
        Ok(self.images.clone())
    }

    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>> {
        record(&self.log, "list_floating_ips");
        Ok(self.floating_ips.lock().unwrap().clone())
    }

    async fn create_server(&self, spec: &LaunchSpec) -> Result<ServerRef> {
        record(&self.log, "create");
        if let Some(err) = self.create_error.clone() {
            return Err(err);
        }
        self.specs.lock().unwrap().push(spec.clone());
        Ok("srv-42".into())
    }

    async fn get_server(&self, id: &ServerRef) -> Result<Server> {
        record(&self.log, format!("get_server:{}", id));
        Ok(Server {
            id: id.to_string(),
            status: self.server_status.clone(),
            ..Default::default()
        })
    }

    async fn wait_until_active(
        &self,
        _id: &ServerRef,
        _timeout: Duration,
        progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<()> {
        record(&self.log, "wait");
        progress(50);
        let result = self.wait_results.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if self.interrupt_after_wait {
            self.interrupt.trigger();
        }
        result
    }

    async fn allocate_floating_ip(&self, pool: &str) -> Result<FloatingIp> {
        record(&self.log, format!("allocate:{}", pool));
        let allocated = self.allocated.clone().unwrap_or_default();
        self.floating_ips.lock().unwrap().push(allocated.clone());
        Ok(allocated)
    }

    async fn associate_floating_ip(
        &self,
        _server: &ServerRef,
        floating_ip: &FloatingIp,
    ) -> Result<()> {
        record(
            &self.log,
            format!("associate:{}", floating_ip.ip.as_deref().unwrap_or_default()),
        );
        match self.associate_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn release_floating_ip(&self, floating_ip: &FloatingIp) -> Result<()> {
        record(&self.log, format!("release:{}", floating_ip.id));
        Ok(())
    }
}

pub struct FakeNetwork {
    log: Log,
    networks: Vec<Network>,
}

impl FakeNetwork {
    pub fn new(log: Log) -> FakeNetwork {
        let network = |id: &str, name: &str| Network {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        };
        FakeNetwork {
            log,
            networks: vec![network("net-1", "private"), network("net-2", "public")],
        }
    }
}

#[async_trait]
impl NetworkClient for FakeNetwork {
    async fn list_networks(&self) -> Result<Vec<Network>> {
        record(&self.log, "list_networks");
        Ok(self.networks.clone())
    }
}

pub struct FakeMachine {
    log: Log,
    name: String,
    interfaces: Vec<DeclaredInterface>,
    pub id: Option<String>,
}

impl FakeMachine {
    pub fn new(log: Log) -> FakeMachine {
        FakeMachine {
            log,
            name: "machine-1".to_string(),
            interfaces: Vec::new(),
            id: None,
        }
    }

    pub fn with_interfaces(mut self, ips: Vec<Option<&str>>) -> FakeMachine {
        self.interfaces = ips
            .into_iter()
            .map(|ip| DeclaredInterface {
                ip: ip.map(|ip| ip.parse().unwrap()),
            })
            .collect();
        self
    }
}

impl MachineState for FakeMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_id(&mut self, id: &ServerRef) -> Result<()> {
        record(&self.log, format!("set_id:{}", id));
        self.id = Some(id.to_string());
        Ok(())
    }

    fn declared_interfaces(&self) -> Vec<DeclaredInterface> {
        self.interfaces.clone()
    }
}

#[derive(Default)]
pub struct RecordingUi {
    messages: Mutex<Vec<String>>,
    progress: Mutex<Vec<u8>>,
}

impl RecordingUi {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.progress.lock().unwrap().clone()
    }
}

impl Ui for RecordingUi {
    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn report_progress(&self, progress: u8, _total: u8) {
        self.progress.lock().unwrap().push(progress);
    }
}

pub struct FakeReachability {
    results: Mutex<VecDeque<Result<bool>>>,
    calls: AtomicUsize,
    interrupt: Option<(usize, Interrupt)>,
}

impl FakeReachability {
    /// Results of consecutive checks, reachable once exhausted.
    pub fn new(results: Vec<Result<bool>>) -> FakeReachability {
        FakeReachability {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
            interrupt: None,
        }
    }

    /// Raise `interrupt` once `calls` checks have been made.
    pub fn interrupt_after(mut self, calls: usize, interrupt: Interrupt) -> FakeReachability {
        self.interrupt = Some((calls, interrupt));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reachability for FakeReachability {
    async fn is_reachable(&self) -> Result<bool> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, interrupt)) = &self.interrupt {
            if calls >= *limit {
                interrupt.trigger();
            }
        }
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(true))
    }
}
