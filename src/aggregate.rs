//! Topology aggregate
//!
//! The aggregate is the root that owns the device map and the link registry
//! and derives the circuits view. It exposes the full mutation/query
//! contract used by event handlers and read endpoints; its collections are
//! private, so the operations here are the only mutation surface.
//!
//! Mutators addressing an unknown device/interface/link id return a
//! `*NotFound` error without partially mutating state. Every mutation that
//! changes observable topology shape queues a `topology-updated`
//! notification for the host to publish.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::circuits::Circuit;
use crate::entities::{Device, Link, Port};
use crate::errors::{Result, TopologyError};
use crate::events::{NetworkEvent, TopologyNotification};
use crate::registry::LinkRegistry;
use crate::snapshot::TopologySnapshot;
use crate::value_objects::{DeviceId, DeviceKind, InterfaceId, LinkId, Metadata};

/// Authoritative, queryable topology state
#[derive(Debug, Default)]
pub struct TopologyAggregate {
    devices: HashMap<DeviceId, Device>,
    links: LinkRegistry,
    circuits: BTreeMap<String, Circuit>,
    notifications: Vec<TopologyNotification>,
}

impl TopologyAggregate {
    /// Create an empty aggregate with freshly-initialized collections
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            links: LinkRegistry::new(),
            circuits: BTreeMap::new(),
            notifications: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        devices: HashMap<DeviceId, Device>,
        links: LinkRegistry,
        circuits: BTreeMap<String, Circuit>,
    ) -> Self {
        Self {
            devices,
            links,
            circuits,
            notifications: Vec::new(),
        }
    }

    // ========================================================================
    // Event Application
    // ========================================================================

    /// Apply one inbound connectivity event.
    ///
    /// Callable without any event dispatcher; the host delivers events one
    /// at a time. Events referencing interfaces this aggregate has never
    /// seen are dropped quietly where the source protocol allows stale
    /// notifications.
    pub fn handle_event(&mut self, event: &NetworkEvent) -> Result<()> {
        match event {
            NetworkEvent::DeviceAppeared { device, kind } => {
                let device = self
                    .devices
                    .entry(device.clone())
                    .or_insert_with(|| Device::new(device.clone(), *kind));
                device.set_active(true);
                debug!(device = %device.id(), "device added to the topology");
                self.notify();
            }

            NetworkEvent::DeviceLost { interface } => {
                let device_id = interface.device_id();
                match self.devices.get_mut(&device_id) {
                    Some(device) => {
                        device.set_active(false);
                        debug!(device = %device_id, "device marked inactive");
                        self.notify();
                    }
                    None => debug!(device = %device_id, "connection lost for unknown device"),
                }
            }

            NetworkEvent::InterfaceUp { interface, mac }
            | NetworkEvent::InterfaceCreated { interface, mac } => {
                let port = self.ensure_interface(interface);
                if mac.is_some() {
                    port.set_mac(mac.clone());
                }
                port.set_active(true);
                self.notify();
            }

            NetworkEvent::InterfaceDown { interface }
            | NetworkEvent::InterfaceDeleted { interface } => {
                match self.port_of_mut(interface) {
                    Some(port) => {
                        port.set_active(false);
                        self.links.remove_all_touching(interface);
                        self.notify();
                    }
                    None => debug!(interface = %interface, "down event for unknown interface"),
                }
            }

            NetworkEvent::LinkUp { interface } => {
                if self.links.set_active_on(interface, true) {
                    self.notify();
                }
            }

            NetworkEvent::LinkDown { interface } => {
                if self.links.set_active_on(interface, false) {
                    self.notify();
                }
            }

            NetworkEvent::InterfaceIsNni {
                interface_a,
                interface_b,
            } => {
                self.assign_nni(interface_a, interface_b)?;
            }
        }
        Ok(())
    }

    /// NNI assignment: resolve or create both endpoints, force-relink
    /// (tearing down any stale link on either side), and mark both
    /// interfaces as inter-switch.
    ///
    /// An interface can only be NNI-linked to one peer at a time, so a prior
    /// link on either endpoint is superseded.
    pub fn assign_nni(&mut self, a: &InterfaceId, b: &InterfaceId) -> Result<()> {
        self.ensure_interface(a);
        self.ensure_interface(b);

        self.links.set_link(a, b, Metadata::new(), true)?;

        for endpoint in [a, b] {
            if let Some(port) = self.port_of_mut(endpoint) {
                port.set_nni(true);
            }
        }

        info!(a = %a, b = %b, "NNI link assigned");
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Device Lifecycle
    // ========================================================================

    /// Register a device explicitly. Fails if the id is already present.
    pub fn add_device(&mut self, id: DeviceId, kind: DeviceKind) -> Result<&Device> {
        if self.devices.contains_key(&id) {
            return Err(TopologyError::InvalidState(format!(
                "device {id} already exists"
            )));
        }
        let device = Device::new(id.clone(), kind);
        self.devices.insert(id.clone(), device);
        self.notify();
        Ok(&self.devices[&id])
    }

    /// Remove a device, cascading to every link touching any of its
    /// interfaces
    pub fn remove_device(&mut self, id: &DeviceId) -> Result<()> {
        let device = self
            .devices
            .get(id)
            .ok_or_else(|| TopologyError::DeviceNotFound(id.to_string()))?;
        for interface in device.interface_ids() {
            self.links.remove_all_touching(&interface);
        }
        self.devices.remove(id);
        info!(device = %id, "device removed from the topology");
        self.notify();
        Ok(())
    }

    pub fn enable_device(&mut self, id: &DeviceId) -> Result<()> {
        self.device_mut(id)?.set_enabled(true);
        self.notify();
        Ok(())
    }

    pub fn disable_device(&mut self, id: &DeviceId) -> Result<()> {
        self.device_mut(id)?.set_enabled(false);
        self.notify();
        Ok(())
    }

    pub fn device_metadata(&self, id: &DeviceId) -> Result<&Metadata> {
        self.devices
            .get(id)
            .map(Device::metadata)
            .ok_or_else(|| TopologyError::DeviceNotFound(id.to_string()))
    }

    /// Merge metadata entries onto a device, overwriting existing keys
    pub fn extend_device_metadata(&mut self, id: &DeviceId, metadata: Metadata) -> Result<()> {
        self.device_mut(id)?.metadata_mut().extend(metadata);
        self.notify();
        Ok(())
    }

    /// Delete one metadata key; a key that was never set is a `NotFound`
    pub fn remove_device_metadata_key(&mut self, id: &DeviceId, key: &str) -> Result<()> {
        let removed = self.device_mut(id)?.metadata_mut().remove(key).is_some();
        if !removed {
            return Err(TopologyError::MetadataKeyNotFound(key.to_string()));
        }
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Interface Administration
    // ========================================================================

    pub fn enable_interface(&mut self, interface: &InterfaceId) -> Result<()> {
        self.interface_mut(interface)?.set_enabled(true);
        self.notify();
        Ok(())
    }

    pub fn disable_interface(&mut self, interface: &InterfaceId) -> Result<()> {
        self.interface_mut(interface)?.set_enabled(false);
        self.notify();
        Ok(())
    }

    pub fn interface_metadata(&self, interface: &InterfaceId) -> Result<&Metadata> {
        self.port_of(interface)
            .map(Port::properties)
            .ok_or_else(|| TopologyError::InterfaceNotFound(interface.to_string()))
    }

    pub fn extend_interface_metadata(
        &mut self,
        interface: &InterfaceId,
        metadata: Metadata,
    ) -> Result<()> {
        self.interface_mut(interface)?
            .properties_mut()
            .extend(metadata);
        self.notify();
        Ok(())
    }

    pub fn remove_interface_metadata_key(
        &mut self,
        interface: &InterfaceId,
        key: &str,
    ) -> Result<()> {
        let removed = self
            .interface_mut(interface)?
            .properties_mut()
            .remove(key)
            .is_some();
        if !removed {
            return Err(TopologyError::MetadataKeyNotFound(key.to_string()));
        }
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Link Administration (delegated to the registry)
    // ========================================================================

    pub fn enable_link(&mut self, id: &LinkId) -> Result<()> {
        self.links.enable(id)?;
        self.notify();
        Ok(())
    }

    pub fn disable_link(&mut self, id: &LinkId) -> Result<()> {
        self.links.disable(id)?;
        self.notify();
        Ok(())
    }

    pub fn link_metadata(&self, id: &LinkId) -> Result<&Metadata> {
        self.links.metadata(id)
    }

    pub fn extend_link_metadata(&mut self, id: &LinkId, metadata: Metadata) -> Result<()> {
        self.links.extend_metadata(id, metadata)?;
        self.notify();
        Ok(())
    }

    pub fn remove_link_metadata_key(&mut self, id: &LinkId, key: &str) -> Result<()> {
        if !self.links.remove_metadata_key(id, key)? {
            return Err(TopologyError::MetadataKeyNotFound(key.to_string()));
        }
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Circuits
    // ========================================================================

    /// Replace the derived circuits view (compiler output); merged into
    /// every exported snapshot
    pub fn set_circuits(&mut self, circuits: BTreeMap<String, Circuit>) {
        self.circuits = circuits;
        self.notify();
    }

    pub fn circuits(&self) -> &BTreeMap<String, Circuit> {
        &self.circuits
    }

    // ========================================================================
    // Read Projections
    // ========================================================================

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> Vec<&Device> {
        self.devices.values().collect()
    }

    /// All interfaces, flattened across devices
    pub fn interfaces(&self) -> Vec<(InterfaceId, &Port)> {
        self.devices
            .values()
            .flat_map(|device| {
                device
                    .ports()
                    .map(move |port| (device.interface_id(port.number()), port))
            })
            .collect()
    }

    pub fn link(&self, id: &LinkId) -> Option<&Link> {
        self.links.get(id)
    }

    /// The link currently attached to an interface, if any
    pub fn link_at(&self, interface: &InterfaceId) -> Option<&Link> {
        self.links.find(interface)
    }

    pub fn links(&self) -> Vec<&Link> {
        self.links.iter().collect()
    }

    /// Export the full state as a serializable snapshot
    pub fn export(&self) -> TopologySnapshot {
        TopologySnapshot::capture(self)
    }

    /// Drain the queued `topology-updated` notifications
    pub fn take_notifications(&mut self) -> Vec<TopologyNotification> {
        std::mem::take(&mut self.notifications)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Resolve or create the device and port behind an interface id. A
    /// datapath-shaped device id becomes a switch, anything else a host.
    fn ensure_interface(&mut self, interface: &InterfaceId) -> &mut Port {
        let device_id = interface.device_id();
        let kind = if device_id.is_datapath() {
            DeviceKind::Switch
        } else {
            DeviceKind::Host
        };
        let device = self
            .devices
            .entry(device_id.clone())
            .or_insert_with(|| Device::new(device_id, kind));
        device.ensure_port(interface.port_number())
    }

    fn device_mut(&mut self, id: &DeviceId) -> Result<&mut Device> {
        self.devices
            .get_mut(id)
            .ok_or_else(|| TopologyError::DeviceNotFound(id.to_string()))
    }

    fn interface_mut(&mut self, interface: &InterfaceId) -> Result<&mut Port> {
        self.port_of_mut(interface)
            .ok_or_else(|| TopologyError::InterfaceNotFound(interface.to_string()))
    }

    fn port_of(&self, interface: &InterfaceId) -> Option<&Port> {
        self.devices
            .get(&interface.device_id())
            .and_then(|device| device.port(interface.port_number()))
    }

    fn port_of_mut(&mut self, interface: &InterfaceId) -> Option<&mut Port> {
        self.devices
            .get_mut(&interface.device_id())
            .and_then(|device| device.port_mut(interface.port_number()))
    }

    fn notify(&mut self) {
        let snapshot = self.export();
        self.notifications.push(TopologyNotification::new(snapshot));
    }
}
