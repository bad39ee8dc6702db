//! Parsing of `inspect` output.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{Error, Result};

/// The parts of a container description the provisioner reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerInspect {
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkSettings {
    #[serde(rename = "IpAddress", alias = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "IpPrefixLen", alias = "IPPrefixLen", default)]
    pub ip_prefix_len: u8,
    #[serde(rename = "Gateway", default)]
    pub gateway: String,
    /// Exposed container port -> host port. `null` reads as empty.
    #[serde(rename = "PortMapping", default, deserialize_with = "null_as_empty")]
    pub port_mapping: HashMap<String, String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ContainerInspect {
    /// Parse one container description. Accepts a bare object or a
    /// single-element array.
    pub fn parse(container: &str, raw: &[u8]) -> Result<Self> {
        let parse_err = |reason: String| Error::Parse {
            what: format!("inspect output for container {container}"),
            reason,
        };
        let value: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| parse_err(e.to_string()))?;
        let value = match value {
            serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            serde_json::Value::Array(_) => return Err(parse_err("empty array".to_string())),
            other => other,
        };
        serde_json::from_value(value).map_err(|e| parse_err(e.to_string()))
    }

    pub fn ip(&self) -> &str {
        &self.network_settings.ip_address
    }

    /// Host port bound to `container_port`, if exposed.
    pub fn host_port(&self, container_port: &str) -> Option<&str> {
        self.network_settings
            .port_mapping
            .get(container_port)
            .map(String::as_str)
    }
}
