//! Topology entities
//!
//! `Device`, `Port` and `Link` are the building blocks owned by the topology
//! aggregate. Collections inside `Device` are private; all mutation flows
//! through the aggregate and registry operations, so bypassing them is
//! unrepresentable rather than trapped at runtime.

use std::collections::HashMap;

use crate::errors::{Result, TopologyError};
use crate::value_objects::{
    DeviceId, DeviceKind, InterfaceId, LinkId, MacAddress, Metadata, PortNumber,
};

/// One attachment point on a device.
///
/// `nni` and `uni` are mutually exclusive: marking one clears the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    number: PortNumber,
    mac: Option<MacAddress>,
    properties: Metadata,
    active: bool,
    enabled: bool,
    nni: bool,
    uni: bool,
}

impl Port {
    pub fn new(number: PortNumber) -> Self {
        Self {
            number,
            mac: None,
            properties: Metadata::new(),
            active: false,
            enabled: true,
            nni: false,
            uni: false,
        }
    }

    /// Build a port from optional parts. At least one of the port number or
    /// the MAC must be present; a MAC-only port (a host attachment point) is
    /// keyed at port number 0.
    pub fn from_parts(number: Option<PortNumber>, mac: Option<MacAddress>) -> Result<Self> {
        let number = match (number, &mac) {
            (Some(n), _) => n,
            (None, Some(_)) => PortNumber::from(0),
            (None, None) => {
                return Err(TopologyError::Validation(
                    "port requires a port number or a MAC address".into(),
                ))
            }
        };
        let mut port = Self::new(number);
        port.mac = mac;
        Ok(port)
    }

    pub fn with_mac(mut self, mac: MacAddress) -> Self {
        self.mac = Some(mac);
        self
    }

    pub fn number(&self) -> PortNumber {
        self.number
    }

    pub fn mac(&self) -> Option<&MacAddress> {
        self.mac.as_ref()
    }

    pub fn properties(&self) -> &Metadata {
        &self.properties
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_nni(&self) -> bool {
        self.nni
    }

    pub fn is_uni(&self) -> bool {
        self.uni
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_nni(&mut self, nni: bool) {
        self.nni = nni;
        if nni {
            self.uni = false;
        }
    }

    pub(crate) fn set_uni(&mut self, uni: bool) {
        self.uni = uni;
        if uni {
            self.nni = false;
        }
    }

    pub(crate) fn set_mac(&mut self, mac: Option<MacAddress>) {
        self.mac = mac;
    }

    pub(crate) fn properties_mut(&mut self) -> &mut Metadata {
        &mut self.properties
    }
}

/// A switch or host in the topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    ports: HashMap<PortNumber, Port>,
    active: bool,
    enabled: bool,
    metadata: Metadata,
}

impl Device {
    pub fn new(id: DeviceId, kind: DeviceKind) -> Self {
        Self {
            id,
            kind,
            ports: HashMap::new(),
            active: false,
            enabled: true,
            metadata: Metadata::new(),
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn port(&self, number: PortNumber) -> Option<&Port> {
        self.ports.get(&number)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Derived interface identifier for one of this device's ports
    pub fn interface_id(&self, number: PortNumber) -> InterfaceId {
        InterfaceId::new(&self.id, number)
    }

    /// Interface identifiers for every port on this device
    pub fn interface_ids(&self) -> Vec<InterfaceId> {
        self.ports
            .keys()
            .map(|number| InterfaceId::new(&self.id, *number))
            .collect()
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub(crate) fn port_mut(&mut self, number: PortNumber) -> Option<&mut Port> {
        self.ports.get_mut(&number)
    }

    /// Fetch the port, creating an inactive one if unseen
    pub(crate) fn ensure_port(&mut self, number: PortNumber) -> &mut Port {
        self.ports.entry(number).or_insert_with(|| Port::new(number))
    }

    pub(crate) fn insert_port(&mut self, port: Port) {
        self.ports.insert(port.number(), port);
    }
}

/// An unordered pair of interfaces connecting two devices.
///
/// Identity is symmetric: `Link(a, b)` and `Link(b, a)` are the same link,
/// compare equal and share a `LinkId`.
#[derive(Debug, Clone)]
pub struct Link {
    endpoint_a: InterfaceId,
    endpoint_b: InterfaceId,
    active: bool,
    enabled: bool,
    metadata: Metadata,
}

impl Link {
    pub fn new(endpoint_a: InterfaceId, endpoint_b: InterfaceId) -> Self {
        Self {
            endpoint_a,
            endpoint_b,
            active: false,
            enabled: true,
            metadata: Metadata::new(),
        }
    }

    pub fn id(&self) -> LinkId {
        LinkId::new(&self.endpoint_a, &self.endpoint_b)
    }

    pub fn endpoint_a(&self) -> &InterfaceId {
        &self.endpoint_a
    }

    pub fn endpoint_b(&self) -> &InterfaceId {
        &self.endpoint_b
    }

    pub fn has_endpoint(&self, interface: &InterfaceId) -> bool {
        &self.endpoint_a == interface || &self.endpoint_b == interface
    }

    /// The peer of `interface`, if `interface` is one of the endpoints
    pub fn peer_of(&self, interface: &InterfaceId) -> Option<&InterfaceId> {
        if &self.endpoint_a == interface {
            Some(&self.endpoint_b)
        } else if &self.endpoint_b == interface {
            Some(&self.endpoint_a)
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

impl PartialEq for Link {
    /// Symmetric over the endpoint pair, independent of order
    fn eq(&self, other: &Self) -> bool {
        (self.endpoint_a == other.endpoint_a && self.endpoint_b == other.endpoint_b)
            || (self.endpoint_a == other.endpoint_b && self.endpoint_b == other.endpoint_a)
    }
}

impl Eq for Link {}
