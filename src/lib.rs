//! SDN topology state engine
//!
//! This crate maintains the authoritative, queryable state of a
//! software-defined network's topology: switches and hosts, their ports,
//! the links connecting them, and derived per-circuit properties.
//!
//! ## Architecture
//!
//! 1. **Entities**: `Device`, `Port` and `Link` value/aggregate types with
//!    validated construction; link identity is symmetric over its unordered
//!    endpoint pair
//! 2. **Link Registry**: content-addressed create-or-reuse store enforcing
//!    one link per interface, with cascade removal and force relink
//! 3. **Circuit Property Compiler**: derives aggregate properties (cost,
//!    latency, ...) for composite circuits from single-hop definitions
//! 4. **Topology Aggregate**: the consistency root driven by inbound
//!    connectivity events, queried by read endpoints
//! 5. **Snapshot Codec**: all-or-nothing export/restore of the whole state
//!
//! The event bus and the HTTP router are external collaborators: the host
//! delivers [`NetworkEvent`]s one at a time and publishes the
//! [`TopologyNotification`]s the aggregate queues after each observable
//! change.
//!
//! ## Usage
//!
//! ```rust
//! use sdn_topology::{InterfaceId, NetworkEvent, TopologyService};
//!
//! let service = TopologyService::new();
//!
//! // An inter-switch discovery event creates both endpoints and the link
//! let notifications = service
//!     .handle_event(&NetworkEvent::InterfaceIsNni {
//!         interface_a: InterfaceId::parse("00:00:00:00:00:00:00:01:1").unwrap(),
//!         interface_b: InterfaceId::parse("00:00:00:00:00:00:00:02:1").unwrap(),
//!     })
//!     .unwrap();
//!
//! assert_eq!(notifications.len(), 1);
//! assert_eq!(service.links().len(), 1);
//! ```

pub mod aggregate;
pub mod circuits;
pub mod config;
pub mod entities;
pub mod errors;
pub mod events;
pub mod registry;
pub mod service;
pub mod snapshot;
pub mod value_objects;

// Re-export commonly used types
pub use aggregate::TopologyAggregate;
pub use circuits::{compile, Circuit, CircuitDef, CompiledCircuits};
pub use config::CircuitsConfig;
pub use entities::{Device, Link, Port};
pub use errors::{Result, TopologyError};
pub use events::{NetworkEvent, TopologyNotification};
pub use registry::LinkRegistry;
pub use service::TopologyService;
pub use snapshot::{DeviceSnapshot, LinkSnapshot, PortSnapshot, TopologySnapshot};
pub use value_objects::{
    is_datapath_id, DeviceId, DeviceKind, InterfaceId, LinkId, MacAddress, Metadata, PortNumber,
};
