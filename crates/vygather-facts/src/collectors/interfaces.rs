//! `interfaces` resource collector: link-level interface settings

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use vygather_connect::DeviceConnection;

use crate::collectors::config_tokens;
use crate::error::CollectError;
use crate::registry::Collector;
use crate::tree::FactFragment;

/// Link-level facts for one interface
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InterfaceFacts {
    /// Interface name (`eth0`, `lo`, ...)
    pub name: String,
    /// Configured description
    pub description: Option<String>,
    /// Administratively enabled (no `disable` line)
    pub enabled: bool,
    /// Configured MTU
    pub mtu: Option<u32>,
    /// Configured speed (`auto`, `1000`, ...)
    pub speed: Option<String>,
    /// Configured duplex (`auto`, `full`, `half`)
    pub duplex: Option<String>,
}

impl InterfaceFacts {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            enabled: true,
            mtu: None,
            speed: None,
            duplex: None,
        }
    }
}

/// Collector for the `interfaces` resource
pub struct Interfaces;

#[async_trait]
impl Collector for Interfaces {
    fn key(&self) -> &'static str {
        "interfaces"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let lines = config_tokens(conn, "set interfaces ").await?;
        let interfaces = parse_interfaces(&lines);

        let mut fragment = FactFragment::new();
        fragment.insert(
            self.key(),
            serde_json::to_value(interfaces).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

/// Build per-interface facts from `set interfaces <type> <name> ...` tokens.
/// Interfaces appear in name order; unknown attributes are ignored.
fn parse_interfaces(lines: &[Vec<String>]) -> Vec<InterfaceFacts> {
    let mut by_name: BTreeMap<String, InterfaceFacts> = BTreeMap::new();

    for tokens in lines {
        // set interfaces <type> <name> [attr [value]]
        let Some(name) = tokens.get(3) else { continue };
        let entry = by_name
            .entry(name.clone())
            .or_insert_with(|| InterfaceFacts::new(name));

        match (tokens.get(4).map(String::as_str), tokens.get(5)) {
            (Some("description"), Some(value)) => entry.description = Some(value.clone()),
            (Some("mtu"), Some(value)) => entry.mtu = value.parse().ok(),
            (Some("speed"), Some(value)) => entry.speed = Some(value.clone()),
            (Some("duplex"), Some(value)) => entry.duplex = Some(value.clone()),
            (Some("disable"), None) => entry.enabled = false,
            _ => {}
        }
    }

    by_name.into_values().collect()
}
