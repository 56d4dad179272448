//! Snapshot codec
//!
//! `TopologySnapshot` is the stable serialized form of the whole topology:
//! devices with their ports and metadata, links with resolved endpoint
//! identifiers, and the compiled circuits merged in. Restoring is
//! all-or-nothing: a snapshot either reconstructs completely into a fresh
//! aggregate or fails with one aggregated error, because partial topologies
//! (links dangling onto missing devices) are unsafe to serve.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::TopologyAggregate;
use crate::circuits::Circuit;
use crate::entities::{Device, Link, Port};
use crate::errors::{Result, TopologyError};
use crate::registry::LinkRegistry;
use crate::value_objects::{DeviceId, DeviceKind, InterfaceId, MacAddress, Metadata, PortNumber};

/// Serialized form of the whole topology state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub devices: BTreeMap<String, DeviceSnapshot>,
    pub links: BTreeMap<String, LinkSnapshot>,
    pub circuits: BTreeMap<String, Circuit>,
}

/// Serialized device with its ports and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: String,
    pub kind: DeviceKind,
    pub active: bool,
    pub enabled: bool,
    pub metadata: Metadata,
    pub ports: BTreeMap<u32, PortSnapshot>,
}

/// Serialized port. A port needs a number or a MAC; both absent fails
/// restore validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSnapshot {
    pub number: Option<u32>,
    pub mac: Option<String>,
    pub active: bool,
    pub enabled: bool,
    pub nni: bool,
    pub uni: bool,
    pub properties: Metadata,
}

/// Serialized link with resolved endpoint identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub active: bool,
    pub enabled: bool,
    pub metadata: Metadata,
}

impl TopologySnapshot {
    /// Export the aggregate's full state
    pub fn capture(topology: &TopologyAggregate) -> Self {
        let devices = topology
            .devices()
            .into_iter()
            .map(|device| (device.id().to_string(), DeviceSnapshot::from_device(device)))
            .collect();
        let links = topology
            .links()
            .into_iter()
            .map(|link| (link.id().to_string(), LinkSnapshot::from_link(link)))
            .collect();
        Self {
            devices,
            links,
            circuits: topology.circuits().clone(),
        }
    }

    /// Reconstruct a new, isolated aggregate from this snapshot.
    ///
    /// Every device reference, port reference and link endpoint must resolve;
    /// otherwise the whole restore fails with one `Restore` error listing
    /// every problem, and no aggregate is produced.
    pub fn restore(&self) -> Result<TopologyAggregate> {
        let mut errors: Vec<String> = Vec::new();

        let mut devices: HashMap<DeviceId, Device> = HashMap::new();
        for snapshot in self.devices.values() {
            match snapshot.to_device() {
                Ok(device) => {
                    devices.insert(device.id().clone(), device);
                }
                Err(err) => errors.push(err.to_string()),
            }
        }

        let mut registry = LinkRegistry::new();
        for (link_id, snapshot) in &self.links {
            if let Err(err) = restore_link(link_id, snapshot, &devices, &mut registry) {
                errors.push(err.to_string());
            }
        }

        if !errors.is_empty() {
            warn!(count = errors.len(), "snapshot restore failed");
            return Err(TopologyError::Restore(errors));
        }

        debug!(
            devices = devices.len(),
            links = registry.len(),
            "snapshot restored"
        );
        Ok(TopologyAggregate::from_parts(
            devices,
            registry,
            self.circuits.clone(),
        ))
    }
}

impl DeviceSnapshot {
    fn from_device(device: &Device) -> Self {
        let ports = device
            .ports()
            .map(|port| (port.number().as_u32(), PortSnapshot::from_port(port)))
            .collect();
        Self {
            id: device.id().to_string(),
            kind: device.kind(),
            active: device.is_active(),
            enabled: device.is_enabled(),
            metadata: device.metadata().clone(),
            ports,
        }
    }

    fn to_device(&self) -> Result<Device> {
        let id = DeviceId::new(self.id.clone())?;
        let mut device = Device::new(id, self.kind);
        device.set_active(self.active);
        device.set_enabled(self.enabled);
        device.metadata_mut().extend(self.metadata.clone());
        for snapshot in self.ports.values() {
            device.insert_port(snapshot.to_port(&self.id)?);
        }
        Ok(device)
    }
}

impl PortSnapshot {
    fn from_port(port: &Port) -> Self {
        Self {
            number: Some(port.number().as_u32()),
            mac: port.mac().map(|mac| mac.to_string()),
            active: port.is_active(),
            enabled: port.is_enabled(),
            nni: port.is_nni(),
            uni: port.is_uni(),
            properties: port.properties().clone(),
        }
    }

    fn to_port(&self, device_id: &str) -> Result<Port> {
        let mac = self
            .mac
            .as_deref()
            .map(MacAddress::new)
            .transpose()
            .map_err(|err| {
                TopologyError::Validation(format!("device {device_id}: {err}"))
            })?;
        let mut port = Port::from_parts(self.number.map(PortNumber::from), mac)
            .map_err(|err| TopologyError::Validation(format!("device {device_id}: {err}")))?;
        port.set_active(self.active);
        port.set_enabled(self.enabled);
        port.set_nni(self.nni);
        port.set_uni(self.uni);
        port.properties_mut().extend(self.properties.clone());
        Ok(port)
    }
}

impl LinkSnapshot {
    fn from_link(link: &Link) -> Self {
        Self {
            endpoint_a: link.endpoint_a().to_string(),
            endpoint_b: link.endpoint_b().to_string(),
            active: link.is_active(),
            enabled: link.is_enabled(),
            metadata: link.metadata().clone(),
        }
    }
}

fn restore_link(
    link_id: &str,
    snapshot: &LinkSnapshot,
    devices: &HashMap<DeviceId, Device>,
    registry: &mut LinkRegistry,
) -> Result<()> {
    let endpoint_a = InterfaceId::parse(snapshot.endpoint_a.clone())?;
    let endpoint_b = InterfaceId::parse(snapshot.endpoint_b.clone())?;

    for endpoint in [&endpoint_a, &endpoint_b] {
        let device = devices.get(&endpoint.device_id()).ok_or_else(|| {
            TopologyError::Validation(format!(
                "link {link_id}: unknown device {}",
                endpoint.device_id()
            ))
        })?;
        if device.port(endpoint.port_number()).is_none() {
            return Err(TopologyError::Validation(format!(
                "link {link_id}: unknown port {} on device {}",
                endpoint.port_number(),
                endpoint.device_id()
            )));
        }
    }

    let id = registry.get_or_create(&endpoint_a, &endpoint_b)?.id();
    registry.set_active_on(&endpoint_a, snapshot.active);
    if snapshot.enabled {
        registry.enable(&id)?;
    } else {
        registry.disable(&id)?;
    }
    registry.extend_metadata(&id, snapshot.metadata.clone())?;
    Ok(())
}
