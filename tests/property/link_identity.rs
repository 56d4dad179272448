//! Properties of link identity and the registry
//!
//! Link identity is symmetric and content-addressed; the registry never
//! grows on repeated creation and cascade removal leaves no dangling
//! reference.

use proptest::prelude::*;

use sdn_topology::{InterfaceId, Link, LinkId, LinkRegistry};

/// Interface ids over a small device space so collisions are exercised
fn interface_id() -> impl Strategy<Value = InterfaceId> {
    (1u8..=20, 1u32..=8).prop_map(|(device, port)| {
        InterfaceId::parse(format!("00:00:00:00:00:00:00:{device:02x}:{port}")).unwrap()
    })
}

/// A pair of interfaces on different devices
fn endpoint_pair() -> impl Strategy<Value = (InterfaceId, InterfaceId)> {
    (interface_id(), interface_id())
        .prop_filter("endpoints must differ by device", |(a, b)| {
            a.device_id() != b.device_id()
        })
}

/// Three interfaces on pairwise-distinct devices
fn endpoint_triple() -> impl Strategy<Value = (InterfaceId, InterfaceId, InterfaceId)> {
    (interface_id(), interface_id(), interface_id()).prop_filter(
        "endpoints must be on distinct devices",
        |(a, b, c)| {
            a.device_id() != b.device_id()
                && b.device_id() != c.device_id()
                && a.device_id() != c.device_id()
        },
    )
}

proptest! {
    #[test]
    fn prop_link_id_is_symmetric((a, b) in endpoint_pair()) {
        prop_assert_eq!(LinkId::new(&a, &b), LinkId::new(&b, &a));
    }

    #[test]
    fn prop_link_equality_is_symmetric((a, b) in endpoint_pair()) {
        let ab = Link::new(a.clone(), b.clone());
        let ba = Link::new(b, a);
        prop_assert_eq!(&ab, &ba);
        prop_assert_eq!(ab.id(), ba.id());
    }

    #[test]
    fn prop_get_or_create_is_symmetric_and_idempotent((a, b) in endpoint_pair()) {
        let mut registry = LinkRegistry::new();

        let first = registry.get_or_create(&a, &b).unwrap().id();
        let swapped = registry.get_or_create(&b, &a).unwrap().id();
        let repeated = registry.get_or_create(&a, &b).unwrap().id();

        prop_assert_eq!(&first, &swapped);
        prop_assert_eq!(&first, &repeated);
        prop_assert_eq!(registry.len(), 1);
    }

    #[test]
    fn prop_find_resolves_the_same_link_from_either_endpoint((a, b) in endpoint_pair()) {
        let mut registry = LinkRegistry::new();
        registry.get_or_create(&a, &b).unwrap();

        let by_a = registry.find(&a).map(Link::id);
        let by_b = registry.find(&b).map(Link::id);
        prop_assert_eq!(by_a, by_b.clone());
        prop_assert!(by_b.is_some());
    }

    #[test]
    fn prop_cascade_removal_leaves_no_dangling_reference((a, b) in endpoint_pair()) {
        let mut registry = LinkRegistry::new();
        registry.get_or_create(&a, &b).unwrap();

        let removed = registry.remove_all_touching(&a);

        prop_assert_eq!(removed.len(), 1);
        prop_assert!(registry.find(&a).is_none());
        prop_assert!(registry.find(&b).is_none());
        prop_assert!(registry.is_empty());
    }

    #[test]
    fn prop_force_relink_fully_detaches_the_stale_link(
        (a, b, c) in endpoint_triple()
    ) {
        let mut registry = LinkRegistry::new();
        registry.get_or_create(&a, &b).unwrap();

        let id = registry
            .set_link(&a, &c, Default::default(), true)
            .unwrap();

        prop_assert!(registry.find(&b).is_none());
        prop_assert_eq!(registry.find(&a).map(|l| l.id()), Some(id.clone()));
        prop_assert_eq!(registry.find(&c).map(|l| l.id()), Some(id));
        prop_assert_eq!(registry.len(), 1);
    }
}
