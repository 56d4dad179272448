//! Consumed and produced events
//!
//! `NetworkEvent` is the boundary shape for notifications the hosting
//! controller delivers; the aggregate applies them one at a time.
//! `TopologyNotification` is the produced `topology-updated` event, carrying
//! the full exported snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::TopologySnapshot;
use crate::value_objects::{DeviceId, DeviceKind, InterfaceId, MacAddress};

/// Inbound connectivity events from the network controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetworkEvent {
    /// A switch or host appeared (or reconnected)
    DeviceAppeared { device: DeviceId, kind: DeviceKind },

    /// The connection owning this interface was lost
    DeviceLost { interface: InterfaceId },

    /// An interface came up
    InterfaceUp {
        interface: InterfaceId,
        mac: Option<MacAddress>,
    },

    /// An interface was created; handled as interface-up
    InterfaceCreated {
        interface: InterfaceId,
        mac: Option<MacAddress>,
    },

    /// An interface went down
    InterfaceDown { interface: InterfaceId },

    /// An interface was deleted; handled as interface-down
    InterfaceDeleted { interface: InterfaceId },

    /// The link on this interface came up
    LinkUp { interface: InterfaceId },

    /// The link on this interface went down
    LinkDown { interface: InterfaceId },

    /// Two interfaces were discovered to be inter-switch (NNI) peers
    InterfaceIsNni {
        interface_a: InterfaceId,
        interface_b: InterfaceId,
    },
}

/// Produced `topology-updated` event: emitted after every mutation that
/// changes observable topology shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNotification {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub snapshot: TopologySnapshot,
}

impl TopologyNotification {
    pub fn new(snapshot: TopologySnapshot) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            snapshot,
        }
    }
}
