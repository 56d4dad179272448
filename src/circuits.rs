//! Circuits and the circuit property compiler
//!
//! A circuit is a named ordered sequence of hops. The compiler derives each
//! circuit's complete `custom_properties` mapping from single-hop definitions:
//! operators define cost/latency once per physical hop and multi-hop circuits
//! inherit the sum, unless they override a property explicitly.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::TopologyError;
use crate::value_objects::is_datapath_id;

/// A circuit definition as loaded from configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDef {
    pub name: String,
    pub hops: Vec<String>,
    #[serde(default)]
    pub custom_properties: HashMap<String, serde_json::Value>,
}

/// A compiled circuit: ordered hops plus a complete property mapping
/// (every recognized property present)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub name: String,
    pub hops: Vec<String>,
    pub custom_properties: BTreeMap<String, f64>,
}

impl Circuit {
    /// The hop sequence with pure-switch hops elided, leaving only
    /// interface-level waypoints
    pub fn hops_without_switches(&self) -> Vec<&str> {
        reduced_hops(&self.hops)
    }

    /// A circuit with at most two reduced hops is a single logical segment
    pub fn is_simple(&self) -> bool {
        self.hops_without_switches().len() <= 2
    }
}

/// Filter out hops whose identifier has the datapath-id shape
pub fn reduced_hops(hops: &[String]) -> Vec<&str> {
    hops.iter()
        .map(String::as_str)
        .filter(|hop| !is_datapath_id(hop))
        .collect()
}

/// The device part of a hop identifier: the hop itself for a datapath id,
/// otherwise everything before the trailing port group
fn hop_device(hop: &str) -> &str {
    if is_datapath_id(hop) {
        hop
    } else {
        hop.rsplit_once(':').map(|(device, _)| device).unwrap_or(hop)
    }
}

fn segment_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Output of a compiler run: loaded circuits plus the definitions rejected
/// with descriptive validation errors. Rejection is per circuit; the rest
/// still load.
#[derive(Debug, Default)]
pub struct CompiledCircuits {
    pub circuits: BTreeMap<String, Circuit>,
    pub rejected: Vec<TopologyError>,
}

/// Compile circuit definitions against a property-defaults mapping.
///
/// Simple circuits resolve to the defaults overlaid by their explicit
/// properties. Composite circuits derive each non-explicit property as the
/// sum over consecutive reduced-hop pairs: zero for a pair on the same
/// device, the matching simple circuit's resolved value if one exists,
/// otherwise the global default.
pub fn compile(
    defs: &[CircuitDef],
    defaults: &HashMap<String, serde_json::Value>,
) -> CompiledCircuits {
    let mut out = CompiledCircuits::default();

    // Recognized properties are the keys of the defaults mapping. A
    // non-numeric default poisons every circuit, so it is reported once and
    // the property is excluded.
    let mut resolved_defaults: BTreeMap<String, f64> = BTreeMap::new();
    for (name, value) in defaults {
        match value.as_f64() {
            Some(number) => {
                resolved_defaults.insert(name.clone(), number);
            }
            None => out.rejected.push(TopologyError::Validation(format!(
                "default for property {name} is not numeric: {value}"
            ))),
        }
    }

    // Validation pass: reject malformed definitions individually.
    let mut valid: Vec<(&CircuitDef, BTreeMap<String, f64>)> = Vec::new();
    for def in defs {
        match validate_def(def, &valid) {
            Ok(explicit) => valid.push((def, explicit)),
            Err(err) => {
                warn!(circuit = %def.name, error = %err, "rejecting circuit definition");
                out.rejected.push(err);
            }
        }
    }

    // Pass 1: simple circuits resolve directly and feed the segment index.
    let mut segments: HashMap<(String, String), BTreeMap<String, f64>> = HashMap::new();
    let mut composites: Vec<(&CircuitDef, BTreeMap<String, f64>, Vec<&str>)> = Vec::new();
    for (def, explicit) in valid {
        let reduced = reduced_hops(&def.hops);
        if reduced.len() > 2 {
            composites.push((def, explicit, reduced));
            continue;
        }

        let mut properties = resolved_defaults.clone();
        properties.extend(explicit);
        if let [a, b] = reduced[..] {
            segments.insert(segment_key(a, b), properties.clone());
        }
        out.circuits.insert(
            def.name.clone(),
            Circuit {
                name: def.name.clone(),
                hops: def.hops.clone(),
                custom_properties: properties,
            },
        );
    }

    // Pass 2: composite circuits aggregate over their reduced-hop pairs.
    for (def, explicit, reduced) in composites {
        let mut properties = explicit;
        for (name, default) in &resolved_defaults {
            if properties.contains_key(name) {
                continue;
            }
            let total = reduced
                .windows(2)
                .map(|pair| segment_value(pair[0], pair[1], name, *default, &segments))
                .sum();
            properties.insert(name.clone(), total);
        }
        out.circuits.insert(
            def.name.clone(),
            Circuit {
                name: def.name.clone(),
                hops: def.hops.clone(),
                custom_properties: properties,
            },
        );
    }

    out
}

/// Resolve one property over a single consecutive hop pair
fn segment_value(
    a: &str,
    b: &str,
    property: &str,
    default: f64,
    segments: &HashMap<(String, String), BTreeMap<String, f64>>,
) -> f64 {
    // A pair inside one device contributes nothing to the path cost.
    if hop_device(a) == hop_device(b) {
        return 0.0;
    }
    segments
        .get(&segment_key(a, b))
        .and_then(|properties| properties.get(property).copied())
        .unwrap_or(default)
}

fn validate_def(
    def: &CircuitDef,
    pending: &[(&CircuitDef, BTreeMap<String, f64>)],
) -> Result<BTreeMap<String, f64>, TopologyError> {
    if def.name.is_empty() {
        return Err(TopologyError::Validation(
            "circuit definition has an empty name".into(),
        ));
    }
    if def.hops.is_empty() {
        return Err(TopologyError::Validation(format!(
            "circuit {} has no hops",
            def.name
        )));
    }
    if pending.iter().any(|(d, _)| d.name == def.name) {
        return Err(TopologyError::Validation(format!(
            "duplicate circuit name {}",
            def.name
        )));
    }

    let mut explicit = BTreeMap::new();
    for (name, value) in &def.custom_properties {
        let number = value.as_f64().ok_or_else(|| {
            TopologyError::Validation(format!(
                "circuit {} property {name} is not numeric: {value}",
                def.name
            ))
        })?;
        explicit.insert(name.clone(), number);
    }
    Ok(explicit)
}
