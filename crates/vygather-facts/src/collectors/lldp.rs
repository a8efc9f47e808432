//! `lldp_global` and `lldp_interfaces` resource collectors

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use vygather_connect::DeviceConnection;

use crate::collectors::config_tokens;
use crate::error::CollectError;
use crate::registry::Collector;
use crate::tree::FactFragment;

/// Device-wide LLDP service settings
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct LldpGlobalFacts {
    /// Whether the LLDP service is configured at all
    pub enabled: bool,
    /// Advertised management addresses
    pub addresses: Vec<String>,
    /// Enabled legacy discovery protocols (`cdp`, `edp`, `fdp`, `sonmp`)
    pub legacy_protocols: Vec<String>,
}

/// Collector for the `lldp_global` resource
pub struct LldpGlobal;

#[async_trait]
impl Collector for LldpGlobal {
    fn key(&self) -> &'static str {
        "lldp_global"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let lines = config_tokens(conn, "set service lldp").await?;
        let global = parse_lldp_global(&lines);

        let mut fragment = FactFragment::new();
        fragment.insert(
            self.key(),
            serde_json::to_value(global).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

fn parse_lldp_global(lines: &[Vec<String>]) -> LldpGlobalFacts {
    let mut facts = LldpGlobalFacts::default();

    for tokens in lines {
        // set service lldp [attr [value]]
        facts.enabled = true;
        match (tokens.get(3).map(String::as_str), tokens.get(4)) {
            (Some("management-address"), Some(value)) => facts.addresses.push(value.clone()),
            (Some("legacy-protocols"), Some(value)) => {
                facts.legacy_protocols.push(value.clone());
            }
            // per-interface lines belong to the lldp_interfaces resource
            _ => {}
        }
    }

    facts
}

/// Per-interface LLDP settings
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LldpInterfaceFacts {
    /// Interface LLDP is configured on, or `all`
    pub name: String,
    /// Whether transmission is disabled on this interface
    pub disabled: bool,
}

/// Collector for the `lldp_interfaces` resource
pub struct LldpInterfaces;

#[async_trait]
impl Collector for LldpInterfaces {
    fn key(&self) -> &'static str {
        "lldp_interfaces"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let lines = config_tokens(conn, "set service lldp interface").await?;
        let interfaces = parse_lldp_interfaces(&lines);

        let mut fragment = FactFragment::new();
        fragment.insert(
            self.key(),
            serde_json::to_value(interfaces).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

fn parse_lldp_interfaces(lines: &[Vec<String>]) -> Vec<LldpInterfaceFacts> {
    let mut by_name: BTreeMap<String, LldpInterfaceFacts> = BTreeMap::new();

    for tokens in lines {
        // set service lldp interface <name> [disable]
        let Some(name) = tokens.get(4) else { continue };
        let entry = by_name
            .entry(name.clone())
            .or_insert_with(|| LldpInterfaceFacts {
                name: name.clone(),
                disabled: false,
            });
        if tokens.get(5).is_some_and(|t| t == "disable") {
            entry.disabled = true;
        }
    }

    by_name.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::split_config_line;

    fn tokenize(config: &str) -> Vec<Vec<String>> {
        config.lines().map(split_config_line).collect()
    }

    const CONFIG: &str = "\
set service lldp management-address '10.0.0.1'
set service lldp legacy-protocols 'cdp'
set service lldp legacy-protocols 'fdp'
set service lldp interface eth0
set service lldp interface eth1 disable
";

    #[test]
    fn test_parse_lldp_global() {
        let global = parse_lldp_global(&tokenize(CONFIG));
        assert!(global.enabled);
        assert_eq!(global.addresses, vec!["10.0.0.1"]);
        assert_eq!(global.legacy_protocols, vec!["cdp", "fdp"]);
    }

    #[test]
    fn test_parse_lldp_global_unconfigured() {
        let global = parse_lldp_global(&[]);
        assert!(!global.enabled);
        assert!(global.addresses.is_empty());
    }

    #[test]
    fn test_parse_lldp_interfaces() {
        let lines = tokenize(CONFIG);
        let scoped: Vec<_> = lines
            .into_iter()
            .filter(|t| t.get(3).is_some_and(|s| s == "interface"))
            .collect();
        let interfaces = parse_lldp_interfaces(&scoped);
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].name, "eth0");
        assert!(!interfaces[0].disabled);
        assert_eq!(interfaces[1].name, "eth1");
        assert!(interfaces[1].disabled);
    }
}
