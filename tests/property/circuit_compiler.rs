//! Properties of the circuit property compiler
//!
//! Composite circuit properties are additive over their single-hop
//! segments, and hop pairs inside one device never contribute.

use std::collections::HashMap;

use proptest::prelude::*;
use serde_json::json;

use sdn_topology::{compile, CircuitDef};

fn hop(device: u8, port: u32) -> String {
    format!("00:00:00:00:00:00:00:{device:02x}:{port}")
}

fn simple_def(name: String, a: String, b: String, weight: u32) -> CircuitDef {
    CircuitDef {
        name,
        hops: vec![a, b],
        custom_properties: HashMap::from([("weight".to_string(), json!(weight))]),
    }
}

proptest! {
    /// A chain of simple circuits and the composite over the same hops:
    /// the composite's weight is exactly the sum of the segment weights.
    #[test]
    fn prop_composite_weight_is_sum_of_segments(
        weights in prop::collection::vec(0u32..1000, 2..6)
    ) {
        // Devices 1..=n+1 in a line, one interface per hop end
        let hops: Vec<String> = (0..=weights.len())
            .map(|i| hop(i as u8 + 1, 1))
            .collect();

        let mut defs: Vec<CircuitDef> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                simple_def(format!("seg-{i}"), hops[i].clone(), hops[i + 1].clone(), *w)
            })
            .collect();
        defs.push(CircuitDef {
            name: "composite".into(),
            hops: hops.clone(),
            custom_properties: HashMap::new(),
        });

        let defaults = HashMap::from([("weight".to_string(), json!(0))]);
        let compiled = compile(&defs, &defaults);

        prop_assert!(compiled.rejected.is_empty());
        let expected: f64 = weights.iter().map(|w| f64::from(*w)).sum();
        prop_assert_eq!(
            compiled.circuits["composite"].custom_properties["weight"],
            expected
        );
    }

    /// Inserting a same-device hop pair anywhere in a chain never changes
    /// the aggregate, whatever the default value is.
    #[test]
    fn prop_same_device_pair_contributes_zero(
        weight in 1u32..1000,
        default in 1u32..100
    ) {
        let a = hop(1, 1);
        let b_in = hop(2, 1);
        let b_out = hop(2, 2);
        let c = hop(3, 1);

        let defs = vec![
            simple_def("ab".into(), a.clone(), b_in.clone(), weight),
            CircuitDef {
                name: "path".into(),
                hops: vec![a, b_in, b_out, c],
                custom_properties: HashMap::new(),
            },
        ];
        let defaults = HashMap::from([("weight".to_string(), json!(default))]);
        let compiled = compile(&defs, &defaults);

        // a->b_in from the simple circuit, b_in->b_out zero, b_out->c default
        let expected = f64::from(weight) + f64::from(default);
        prop_assert_eq!(
            compiled.circuits["path"].custom_properties["weight"],
            expected
        );
    }
}
