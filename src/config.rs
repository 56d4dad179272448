//! Circuits configuration
//!
//! Loaded once at startup, outside the hot mutation path: a list of circuit
//! definitions plus a property-defaults mapping applied to every single-link
//! circuit unless overridden.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::circuits::CircuitDef;
use crate::errors::{Result, TopologyError};

/// Circuits definition file: `{circuits: [...], property_defaults: {...}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CircuitsConfig {
    /// Circuit definitions: name, ordered hop list, optional custom
    /// properties
    #[serde(default)]
    pub circuits: Vec<CircuitDef>,

    /// Default values for recognized property names
    #[serde(default)]
    pub property_defaults: HashMap<String, serde_json::Value>,
}

impl CircuitsConfig {
    /// Load the config from a JSON file. A missing file yields the empty
    /// default; a present but unreadable or malformed file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no circuits file, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|err| {
            TopologyError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            circuits = config.circuits.len(),
            "loaded circuits configuration"
        );
        Ok(config)
    }
}
