//! Integration tests for the topology engine
//!
//! These tests drive the public surface the way the hosting process does:
//! an event stream mutates the aggregate through the service handle, read
//! projections and snapshots observe it, and a snapshot restores into a
//! fresh service.

use std::collections::HashMap;
use std::io::Write;

use pretty_assertions::assert_eq;
use serde_json::json;

use sdn_topology::{
    CircuitsConfig, DeviceId, DeviceKind, InterfaceId, Metadata, NetworkEvent, TopologyService,
};

const DPID_A: &str = "00:00:00:00:00:00:00:01";
const DPID_B: &str = "00:00:00:00:00:00:00:02";
const DPID_C: &str = "00:00:00:00:00:00:00:03";

fn iface(dpid: &str, port: u32) -> InterfaceId {
    InterfaceId::parse(format!("{dpid}:{port}")).unwrap()
}

fn dpid(s: &str) -> DeviceId {
    DeviceId::new(s).unwrap()
}

/// A linear three-switch topology discovered through events
fn discover_line(service: &TopologyService) {
    let events = [
        NetworkEvent::DeviceAppeared {
            device: dpid(DPID_A),
            kind: DeviceKind::Switch,
        },
        NetworkEvent::DeviceAppeared {
            device: dpid(DPID_B),
            kind: DeviceKind::Switch,
        },
        NetworkEvent::InterfaceIsNni {
            interface_a: iface(DPID_A, 1),
            interface_b: iface(DPID_B, 1),
        },
        NetworkEvent::InterfaceIsNni {
            interface_a: iface(DPID_B, 2),
            interface_b: iface(DPID_C, 1),
        },
        NetworkEvent::LinkUp {
            interface: iface(DPID_A, 1),
        },
    ];
    for event in &events {
        service.handle_event(event).unwrap();
    }
}

#[test]
fn test_event_stream_builds_topology() {
    let service = TopologyService::new();
    discover_line(&service);

    // DPID_C was created on demand while resolving the NNI endpoint
    assert_eq!(service.devices().len(), 3);
    assert_eq!(service.links().len(), 2);
    assert_eq!(service.interfaces().len(), 4);

    let snapshot = service.snapshot();
    assert!(snapshot.devices[DPID_A].ports[&1].nni);
    assert!(snapshot.devices[DPID_C].ports[&1].nni);

    let ab = snapshot
        .links
        .values()
        .find(|link| link.endpoint_a.starts_with(DPID_A) || link.endpoint_b.starts_with(DPID_A))
        .unwrap();
    assert!(ab.active);
}

#[test]
fn test_interface_down_event_detaches_and_deactivates() {
    let service = TopologyService::new();
    discover_line(&service);

    service
        .handle_event(&NetworkEvent::InterfaceDown {
            interface: iface(DPID_B, 2),
        })
        .unwrap();

    assert_eq!(service.links().len(), 1);
    let snapshot = service.snapshot();
    assert!(!snapshot.devices[DPID_B].ports[&2].active);
}

#[test]
fn test_snapshot_round_trip_through_service() {
    let service = TopologyService::new();
    discover_line(&service);
    let exported = service.snapshot();

    let fresh = TopologyService::new();
    fresh.restore(&exported).unwrap();

    assert_eq!(fresh.snapshot(), exported);
    assert_eq!(fresh.devices().len(), 3);
    assert_eq!(fresh.links().len(), 2);
}

#[test]
fn test_restore_is_all_or_nothing() {
    let service = TopologyService::new();
    discover_line(&service);
    let before = service.snapshot();

    let mut broken = before.clone();
    broken.devices.remove(DPID_C);

    let err = service.restore(&broken).unwrap_err();
    assert!(err.to_string().contains(DPID_C));
    assert_eq!(service.snapshot(), before);
}

#[test]
fn test_metadata_surface_end_to_end() {
    let service = TopologyService::new();
    discover_line(&service);

    service
        .extend_device_metadata(
            &dpid(DPID_A),
            Metadata::from([("rack".to_string(), json!("r1"))]),
        )
        .unwrap();
    assert_eq!(
        service.device_metadata(&dpid(DPID_A)).unwrap()["rack"],
        json!("r1")
    );

    let link_id = service.links()[0].id();
    service
        .extend_link_metadata(&link_id, Metadata::from([("cost".to_string(), json!(3))]))
        .unwrap();
    assert_eq!(service.link_metadata(&link_id).unwrap()["cost"], json!(3));

    // Deleting a key that was never set is a 404-equivalent, not success
    let err = service
        .remove_link_metadata_key(&link_id, "never-set")
        .unwrap_err();
    assert!(err.is_not_found());

    // Metadata lands in the produced snapshots too
    let snapshot = service.snapshot();
    assert_eq!(snapshot.devices[DPID_A].metadata["rack"], json!("r1"));
}

#[test]
fn test_circuits_load_from_file_and_aggregate() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "circuits": [
                {{"name": "ab", "hops": ["{DPID_A}:1", "{DPID_B}:1"],
                  "custom_properties": {{"weight": 10}}}},
                {{"name": "bc", "hops": ["{DPID_B}:2", "{DPID_C}:1"],
                  "custom_properties": {{"weight": 20}}}},
                {{"name": "abc",
                  "hops": ["{DPID_A}:1", "{DPID_A}", "{DPID_B}", "{DPID_B}:2", "{DPID_C}:1"]}}
            ],
            "property_defaults": {{"weight": 0}}
        }}"#
    )
    .unwrap();

    let config = CircuitsConfig::from_file(file.path()).unwrap();
    let service = TopologyService::with_config(&config);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.circuits.len(), 3);
    assert_eq!(snapshot.circuits["ab"].custom_properties["weight"], 10.0);
    assert_eq!(snapshot.circuits["bc"].custom_properties["weight"], 20.0);
    // Composite circuit: the reduced pair (A:1, B:2) has no simple circuit
    // so it falls back to the default 0, then (B:2, C:1) resolves from "bc".
    assert_eq!(snapshot.circuits["abc"].custom_properties["weight"], 20.0);
}

#[test]
fn test_recompile_circuits_updates_snapshots() {
    let service = TopologyService::new();
    assert!(service.snapshot().circuits.is_empty());

    let config = CircuitsConfig {
        circuits: vec![sdn_topology::CircuitDef {
            name: "ab".into(),
            hops: vec![format!("{DPID_A}:1"), format!("{DPID_B}:1")],
            custom_properties: HashMap::new(),
        }],
        property_defaults: HashMap::from([("weight".to_string(), json!(7))]),
    };
    let notifications = service.recompile_circuits(&config);

    assert_eq!(notifications.len(), 1);
    assert_eq!(
        service.snapshot().circuits["ab"].custom_properties["weight"],
        7.0
    );
}

#[test]
fn test_notifications_carry_full_snapshots() {
    let service = TopologyService::new();
    let notifications = service
        .handle_event(&NetworkEvent::InterfaceIsNni {
            interface_a: iface(DPID_A, 1),
            interface_b: iface(DPID_B, 1),
        })
        .unwrap();

    assert_eq!(notifications.len(), 1);
    let snapshot = &notifications[0].snapshot;
    assert_eq!(snapshot.devices.len(), 2);
    assert_eq!(snapshot.links.len(), 1);
    assert_eq!(*snapshot, service.snapshot());
}
