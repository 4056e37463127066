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

//! Error and Result implementations.

use std::fmt;
use std::io;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No flavor matched the configured selector.
    NoMatchingFlavor,

    /// No image matched the configured selector.
    NoMatchingImage,

    /// Allocating a floating IP from a pool returned no address.
    FloatingIpNotAllocated,

    /// No usable floating IP was found.
    FloatingIpNotFound,

    /// The server ended up in an unexpected state.
    ///
    /// The offending state is available via [Error::state].
    CreateBadState,

    /// The server should have transitioned to the target state but did not.
    ///
    /// Raised by a cloud client while waiting for a server.
    InvalidTransition,

    /// Operation has reached the specified time out.
    OperationTimedOut,

    /// Network or host is not reachable (yet).
    Unreachable,

    /// Launch configuration is invalid.
    InvalidConfig,

    /// Local I/O failure.
    IoError,

    /// Failure reported by the cloud API or its transport.
    Cloud(osauth::ErrorKind),
}

/// Error from a launch operation.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    state: Option<String>,
}

/// Result of a launch operation.
pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    /// Create a new error of the provided kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            message: Some(message.into()),
            state: None,
        }
    }

    /// Create an error signalling that the server got into a bad state.
    pub fn bad_state<S: Into<String>>(state: S) -> Error {
        let state = state.into();
        Error {
            kind: ErrorKind::CreateBadState,
            message: Some(format!("Server is in state {}", state)),
            state: Some(state),
        }
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message (if any).
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Server state carried by a `CreateBadState` error.
    #[inline]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NoMatchingFlavor => "No matching flavor was found",
            ErrorKind::NoMatchingImage => "No matching image was found",
            ErrorKind::FloatingIpNotAllocated => "Failed to allocate a floating IP",
            ErrorKind::FloatingIpNotFound => "No free floating IP was found",
            ErrorKind::CreateBadState => "Server got into a bad state while creating",
            ErrorKind::InvalidTransition => "Server did not reach the expected state",
            ErrorKind::OperationTimedOut => "Time out reached while waiting for the operation",
            ErrorKind::Unreachable => "Network or host is unreachable",
            ErrorKind::InvalidConfig => "Launch configuration is invalid",
            ErrorKind::IoError => "Local I/O error",
            ErrorKind::Cloud(..) => "Cloud API request failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)
        } else {
            Ok(())
        }
    }
}

impl ::std::error::Error for Error {}

impl From<osauth::Error> for Error {
    fn from(value: osauth::Error) -> Error {
        Error::new(ErrorKind::Cloud(value.kind()), value.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Error {
        let kind = match value.kind() {
            io::ErrorKind::NetworkUnreachable | io::ErrorKind::HostUnreachable => {
                ErrorKind::Unreachable
            }
            _ => ErrorKind::IoError,
        };
        Error::new(kind, value.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Error {
        Error::new(ErrorKind::InvalidConfig, value.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(value: regex::Error) -> Error {
        Error::new(ErrorKind::InvalidConfig, value.to_string())
    }
}
