//! Container snapshot types
//!
//! These mirror what the container platform reports for one poll. They are
//! never cached: every cycle builds fresh values from the source.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Lifecycle status of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerStatus {
    /// Container is running and may carry addresses
    Running,
    /// Container is stopped; its records should be removed
    Stopped,
    /// Any other platform status (Frozen, Starting, Error, ...)
    Other(String),
}

impl From<&str> for ContainerStatus {
    fn from(status: &str) -> Self {
        match status {
            "Running" => ContainerStatus::Running,
            "Stopped" => ContainerStatus::Stopped,
            other => ContainerStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::Running => f.write_str("Running"),
            ContainerStatus::Stopped => f.write_str("Stopped"),
            ContainerStatus::Other(status) => f.write_str(status),
        }
    }
}

/// One address assigned to a container interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address scope, e.g. "global" or "link"
    pub scope: String,
    /// Address family, e.g. "inet" or "inet6"
    pub family: String,
    /// Literal address value
    pub address: String,
}

impl Address {
    pub fn new(
        scope: impl Into<String>,
        family: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            scope: scope.into(),
            family: family.into(),
            address: address.into(),
        }
    }

    /// Whether scope and family select this address for the A record
    pub fn is_global_inet(&self) -> bool {
        self.scope == "global" && self.family == "inet"
    }

    /// The IPv4 address to publish, if this address is syncable
    pub fn global_ipv4(&self) -> Option<Ipv4Addr> {
        if !self.is_global_inet() {
            return None;
        }
        self.address.parse().ok()
    }
}

/// A container as observed in one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container name, used as the DNS label
    pub name: String,
    /// Lifecycle status
    pub status: ContainerStatus,
    /// Interface name to assigned addresses (empty unless running)
    #[serde(default)]
    pub network: HashMap<String, Vec<Address>>,
}

impl Container {
    /// A running container with no interfaces yet
    pub fn running(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ContainerStatus::Running,
            network: HashMap::new(),
        }
    }

    /// A stopped container
    pub fn stopped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ContainerStatus::Stopped,
            network: HashMap::new(),
        }
    }

    /// Attach an address to an interface
    pub fn with_address(mut self, interface: impl Into<String>, address: Address) -> Self {
        self.network.entry(interface.into()).or_default().push(address);
        self
    }

    /// Addresses of an interface, if the container has it
    pub fn addresses(&self, interface: &str) -> Option<&[Address]> {
        self.network.get(interface).map(Vec::as_slice)
    }
}
