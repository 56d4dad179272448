//! Topology value objects
//!
//! Validated identifier newtypes for the topology domain. All value objects
//! are immutable and validated on construction.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TopologyError};

/// Free-form metadata attached to devices, interfaces and links
pub type Metadata = HashMap<String, serde_json::Value>;

/// Whether an identifier has the datapath-id shape: 8 colon-separated
/// hexadecimal groups (e.g. `00:00:00:00:00:00:00:01`).
pub fn is_datapath_id(id: &str) -> bool {
    let groups: Vec<&str> = id.split(':').collect();
    groups.len() == 8
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Stable identifier for a device: a datapath id for switches, a MAC for
/// hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(TopologyError::Validation(
                "device id cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this device id has the switch (datapath) shape
    pub fn is_datapath(&self) -> bool {
        is_datapath_id(&self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Port number, unique within its owning device
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PortNumber(u32);

impl PortNumber {
    /// Construct from a possibly-signed source value; negatives are rejected
    pub fn new(number: i64) -> Result<Self> {
        u32::try_from(number)
            .map(Self)
            .map_err(|_| TopologyError::Validation(format!("invalid port number {number}")))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for PortNumber {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

impl fmt::Display for PortNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MAC address, six colon-separated hex octets, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(mac: impl Into<String>) -> Result<Self> {
        let mac = mac.into().to_ascii_lowercase();
        let octets: Vec<&str> = mac.split(':').collect();
        let valid = octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()));
        if !valid {
            return Err(TopologyError::Validation(format!(
                "invalid MAC address {mac}"
            )));
        }
        Ok(Self(mac))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Interface identifier: `device_id:port_number`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceId(String);

impl InterfaceId {
    pub fn new(device_id: &DeviceId, port: PortNumber) -> Self {
        Self(format!("{device_id}:{port}"))
    }

    /// Parse an interface id, splitting off the trailing port group
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let (device, port) = id.rsplit_once(':').ok_or_else(|| {
            TopologyError::Validation(format!("interface id {id} has no port suffix"))
        })?;
        if device.is_empty() {
            return Err(TopologyError::Validation(format!(
                "interface id {id} has an empty device part"
            )));
        }
        port.parse::<u32>().map_err(|_| {
            TopologyError::Validation(format!("interface id {id} has a non-numeric port"))
        })?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owning device's identifier (everything before the port suffix)
    pub fn device_id(&self) -> DeviceId {
        let (device, _) = self
            .0
            .rsplit_once(':')
            .unwrap_or((self.0.as_str(), ""));
        DeviceId(device.to_string())
    }

    /// The port number within the owning device
    pub fn port_number(&self) -> PortNumber {
        let (_, port) = self.0.rsplit_once(':').unwrap_or(("", "0"));
        PortNumber(port.parse().unwrap_or(0))
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InterfaceId {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Link identifier, content-addressed from the unordered endpoint pair.
///
/// `LinkId::new(a, b) == LinkId::new(b, a)` by construction: the endpoints
/// are sorted before joining.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(a: &InterfaceId, b: &InterfaceId) -> Self {
        let (lo, hi) = if a.as_str() <= b.as_str() {
            (a, b)
        } else {
            (b, a)
        };
        Self(format!("{lo}--{hi}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of device in the topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Switch,
    Host,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Switch => write!(f, "switch"),
            DeviceKind::Host => write!(f, "host"),
        }
    }
}
