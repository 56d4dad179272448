//! Topology service
//!
//! Shared handle around the aggregate for the hosting process: inbound
//! events arrive one at a time through the host's dispatcher, while read
//! queries may run concurrently, so every public operation holds a
//! single-writer/many-reader lock for its whole duration. No operation can
//! observe a partially-mutated aggregate.
//!
//! Mutators return the drained `topology-updated` notifications so the host
//! publishes them after the lock is released.

use std::sync::RwLock;

use tracing::{info, warn};

use crate::aggregate::TopologyAggregate;
use crate::circuits;
use crate::config::CircuitsConfig;
use crate::entities::{Device, Link, Port};
use crate::errors::Result;
use crate::events::{NetworkEvent, TopologyNotification};
use crate::snapshot::TopologySnapshot;
use crate::value_objects::{DeviceId, InterfaceId, LinkId, Metadata};

/// Lock-guarded topology handle, constructed once at startup and shared by
/// the event dispatcher and the request router
#[derive(Debug, Default)]
pub struct TopologyService {
    state: RwLock<TopologyAggregate>,
}

impl TopologyService {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TopologyAggregate::new()),
        }
    }

    /// Build a service with circuits compiled from configuration. Rejected
    /// circuit definitions are logged and skipped; the rest load.
    pub fn with_config(config: &CircuitsConfig) -> Self {
        let compiled = circuits::compile(&config.circuits, &config.property_defaults);
        for err in &compiled.rejected {
            warn!(error = %err, "circuit definition rejected at load");
        }
        info!(circuits = compiled.circuits.len(), "circuit properties compiled");

        let mut aggregate = TopologyAggregate::new();
        aggregate.set_circuits(compiled.circuits);
        aggregate.take_notifications();
        Self {
            state: RwLock::new(aggregate),
        }
    }

    /// Apply one inbound connectivity event and drain the notifications it
    /// produced
    pub fn handle_event(&self, event: &NetworkEvent) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.handle_event(event)?;
        Ok(state.take_notifications())
    }

    /// Re-apply circuit definitions (e.g. after the definitions changed)
    pub fn recompile_circuits(&self, config: &CircuitsConfig) -> Vec<TopologyNotification> {
        let compiled = circuits::compile(&config.circuits, &config.property_defaults);
        for err in &compiled.rejected {
            warn!(error = %err, "circuit definition rejected at recompile");
        }
        let mut state = self.write();
        state.set_circuits(compiled.circuits);
        state.take_notifications()
    }

    /// Full exported snapshot
    pub fn snapshot(&self) -> TopologySnapshot {
        self.read().export()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.read().devices().into_iter().cloned().collect()
    }

    pub fn interfaces(&self) -> Vec<(InterfaceId, Port)> {
        self.read()
            .interfaces()
            .into_iter()
            .map(|(id, port)| (id, port.clone()))
            .collect()
    }

    pub fn links(&self) -> Vec<Link> {
        self.read().links().into_iter().cloned().collect()
    }

    pub fn enable_device(&self, id: &DeviceId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.enable_device(id)?;
        Ok(state.take_notifications())
    }

    pub fn disable_device(&self, id: &DeviceId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.disable_device(id)?;
        Ok(state.take_notifications())
    }

    pub fn device_metadata(&self, id: &DeviceId) -> Result<Metadata> {
        self.read().device_metadata(id).map(Metadata::clone)
    }

    pub fn extend_device_metadata(
        &self,
        id: &DeviceId,
        metadata: Metadata,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.extend_device_metadata(id, metadata)?;
        Ok(state.take_notifications())
    }

    pub fn remove_device_metadata_key(
        &self,
        id: &DeviceId,
        key: &str,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.remove_device_metadata_key(id, key)?;
        Ok(state.take_notifications())
    }

    pub fn enable_interface(&self, id: &InterfaceId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.enable_interface(id)?;
        Ok(state.take_notifications())
    }

    pub fn disable_interface(&self, id: &InterfaceId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.disable_interface(id)?;
        Ok(state.take_notifications())
    }

    pub fn interface_metadata(&self, id: &InterfaceId) -> Result<Metadata> {
        self.read().interface_metadata(id).map(Metadata::clone)
    }

    pub fn extend_interface_metadata(
        &self,
        id: &InterfaceId,
        metadata: Metadata,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.extend_interface_metadata(id, metadata)?;
        Ok(state.take_notifications())
    }

    pub fn remove_interface_metadata_key(
        &self,
        id: &InterfaceId,
        key: &str,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.remove_interface_metadata_key(id, key)?;
        Ok(state.take_notifications())
    }

    pub fn enable_link(&self, id: &LinkId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.enable_link(id)?;
        Ok(state.take_notifications())
    }

    pub fn disable_link(&self, id: &LinkId) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.disable_link(id)?;
        Ok(state.take_notifications())
    }

    pub fn link_metadata(&self, id: &LinkId) -> Result<Metadata> {
        self.read().link_metadata(id).map(Metadata::clone)
    }

    pub fn extend_link_metadata(
        &self,
        id: &LinkId,
        metadata: Metadata,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.extend_link_metadata(id, metadata)?;
        Ok(state.take_notifications())
    }

    pub fn remove_link_metadata_key(
        &self,
        id: &LinkId,
        key: &str,
    ) -> Result<Vec<TopologyNotification>> {
        let mut state = self.write();
        state.remove_link_metadata_key(id, key)?;
        Ok(state.take_notifications())
    }

    /// Replace the live aggregate from a snapshot, all-or-nothing.
    ///
    /// The snapshot is reconstructed and validated outside the write lock;
    /// only a fully-resolved aggregate is swapped in. On any resolution
    /// failure the live topology is untouched and the aggregated error is
    /// returned.
    pub fn restore(&self, snapshot: &TopologySnapshot) -> Result<Vec<TopologyNotification>> {
        let restored = snapshot.restore()?;
        info!("replacing live topology from snapshot");
        let mut state = self.write();
        *state = restored;
        let notification = TopologyNotification::new(state.export());
        Ok(vec![notification])
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TopologyAggregate> {
        // A poisoned lock means a writer panicked mid-mutation; the state
        // can no longer be trusted, so there is nothing useful to recover.
        self.state.read().expect("topology lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TopologyAggregate> {
        self.state.write().expect("topology lock poisoned")
    }
}
