//! Legacy category collectors: `default`, `config`, `neighbors`

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use vygather_connect::DeviceConnection;

use crate::collectors::{commands, show};
use crate::error::CollectError;
use crate::registry::Collector;
use crate::tree::FactFragment;

/// Identity facts every gather carries: hostname, software version,
/// hardware model and serial, plus the gather timestamp.
pub struct DefaultFacts;

#[async_trait]
impl Collector for DefaultFacts {
    fn key(&self) -> &'static str {
        "default"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let mut fragment = FactFragment::new();

        let hostname = show(conn, commands::SHOW_HOST_NAME).await?;
        fragment.insert("net_hostname", hostname.trim());

        let version_out = show(conn, commands::SHOW_VERSION).await?;
        let fields = parse_version_fields(&version_out);
        fragment.insert("net_version", fields.version.unwrap_or_default());
        fragment.insert("net_model", fields.model.unwrap_or_default());
        fragment.insert("net_serialnum", fields.serial.unwrap_or_default());
        fragment.insert("net_gather_time", Utc::now().to_rfc3339());

        Ok(fragment)
    }
}

#[derive(Debug, Default)]
struct VersionFields {
    version: Option<String>,
    model: Option<String>,
    serial: Option<String>,
}

/// Parse the `show version` key/value listing. Unknown fields are skipped,
/// missing fields stay `None` (older images omit the hardware lines).
fn parse_version_fields(output: &str) -> VersionFields {
    let mut fields = VersionFields::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Version" => fields.version = Some(value.to_string()),
            "Hardware model" => fields.model = Some(value.to_string()),
            "Hardware S/N" => fields.serial = Some(value.to_string()),
            _ => {}
        }
    }

    fields
}

/// Raw device configuration, as `set` commands
pub struct ConfigFacts;

#[async_trait]
impl Collector for ConfigFacts {
    fn key(&self) -> &'static str {
        "config"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let config = show(conn, commands::SHOW_CONFIG_COMMANDS).await?;

        let mut fragment = FactFragment::new();
        fragment.insert("net_config", config);
        Ok(fragment)
    }
}

/// One LLDP peer seen on a local interface
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Neighbor {
    /// Local interface the peer was heard on
    pub interface: String,
    /// Peer's advertised system name
    pub system_name: Option<String>,
    /// Peer's port identifier or description
    pub port: Option<String>,
    /// Peer's management address
    pub mgmt_ip: Option<String>,
    /// Advertised capabilities
    pub capabilities: Vec<String>,
}

/// LLDP neighbor table, keyed under `net_neighbors`
pub struct NeighborsFacts;

#[async_trait]
impl Collector for NeighborsFacts {
    fn key(&self) -> &'static str {
        "neighbors"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let output = show(conn, commands::SHOW_LLDP_NEIGHBORS).await?;
        let neighbors = parse_neighbors(&output);

        debug!(count = neighbors.len(), "parsed lldp neighbors");

        let mut fragment = FactFragment::new();
        fragment.insert(
            "net_neighbors",
            serde_json::to_value(neighbors).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

/// Parse `show lldp neighbors detail` output: one block per peer, each block
/// opened by an `Interface:` line.
fn parse_neighbors(output: &str) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        if key == "Interface" {
            // "Interface:    eth0, via: LLDP, RID: 1"
            let local = value.split(',').next().unwrap_or(value).trim();
            neighbors.push(Neighbor {
                interface: local.to_string(),
                system_name: None,
                port: None,
                mgmt_ip: None,
                capabilities: Vec::new(),
            });
            continue;
        }

        let Some(current) = neighbors.last_mut() else {
            continue;
        };
        match key {
            "SysName" => current.system_name = Some(value.to_string()),
            "PortID" | "PortDescr" => {
                if current.port.is_none() {
                    current.port = Some(value.to_string());
                }
            }
            "MgmtIP" => current.mgmt_ip = Some(value.to_string()),
            "Capability" => {
                // "Capability:   Router, on"
                if let Some(cap) = value.split(',').next() {
                    current.capabilities.push(cap.trim().to_string());
                }
            }
            _ => {}
        }
    }

    neighbors
}
