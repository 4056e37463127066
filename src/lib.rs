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

//! Launching OpenStack servers for provisioned machines.
//!
//! This crate implements the server creation step of a machine provisioner:
//! given a [launch configuration](launch/struct.LaunchConfig.html) it
//! resolves a flavor, an image and networks, creates a server, waits for it
//! to become active, optionally attaches a floating IP and waits until the
//! server is reachable.
//!
//! # Example
//!
//! ```rust,no_run
//! use openstack_launch::cloud::Cloud;
//! use openstack_launch::launch::{CreateServer, LaunchConfig, LogUi};
//! use openstack_launch::Interrupt;
//!
//! # async fn launch<M, R>(machine: &mut M, ssh: &R) -> openstack_launch::Result<()>
//! # where M: openstack_launch::launch::MachineState + Send,
//! #       R: openstack_launch::launch::Reachability {
//! let os = Cloud::from_config("devstack").await?;
//! let config = LaunchConfig::from_yaml("flavor: m1.small\nimage: /^ubuntu/\n")?;
//! let step = CreateServer::new(&os, &os, &LogUi, Interrupt::new());
//! let launched = step.call(&config, machine, ssh).await?;
//! println!("{:?}", launched);
//! # Ok(()) }
//! ```
//!
//! # Features
//!
//! * Name or ID matching of cloud resources with `/regex/` patterns
//! * Bounded waiting for the server build with interruption support
//! * Floating IP allocation from a pool or reuse of an unused one
//! * Pluggable cloud clients via the [ComputeClient](cloud/trait.ComputeClient.html)
//!   and [NetworkClient](cloud/trait.NetworkClient.html) traits

// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_import_braces,
    unused_parens,
    unused_results,
    while_true
)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod cloud;
mod common;
mod error;
pub mod launch;
mod types;

pub use crate::common::{find_match, retry, Interrupt, Resource, Selector};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::types::{FlavorRef, ImageRef, NetworkRef, ServerRef};
