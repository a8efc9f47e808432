//! `l3_interfaces` resource collector: per-interface address assignments

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use vygather_connect::DeviceConnection;

use crate::collectors::config_tokens;
use crate::error::CollectError;
use crate::registry::Collector;
use crate::tree::FactFragment;

/// Address facts for one interface (or VLAN sub-interface)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct L3InterfaceFacts {
    /// Interface name; VLAN sub-interfaces use `<parent>.<vlan-id>`
    pub name: String,
    /// IPv4 addresses (CIDR) or `dhcp`
    pub ipv4: Vec<String>,
    /// IPv6 addresses (CIDR) or `dhcpv6`
    pub ipv6: Vec<String>,
}

/// Collector for the `l3_interfaces` resource
pub struct L3Interfaces;

#[async_trait]
impl Collector for L3Interfaces {
    fn key(&self) -> &'static str {
        "l3_interfaces"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let lines = config_tokens(conn, "set interfaces ").await?;
        let interfaces = parse_l3_interfaces(&lines);

        let mut fragment = FactFragment::new();
        fragment.insert(
            self.key(),
            serde_json::to_value(interfaces).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

/// Extract `address` assignments from `set interfaces ...` tokens, including
/// VLAN sub-interfaces (`vif <id>`). Interfaces without addresses are left out.
fn parse_l3_interfaces(lines: &[Vec<String>]) -> Vec<L3InterfaceFacts> {
    let mut by_name: BTreeMap<String, L3InterfaceFacts> = BTreeMap::new();

    for tokens in lines {
        // set interfaces <type> <name> [vif <id>] address <value>
        let Some(base) = tokens.get(3) else { continue };

        let (name, rest) = if tokens.get(4).is_some_and(|t| t == "vif") {
            let Some(vlan) = tokens.get(5) else { continue };
            (format!("{base}.{vlan}"), &tokens[6..])
        } else {
            (base.clone(), &tokens[4..])
        };

        let [attr, value, ..] = rest else { continue };
        if attr.as_str() != "address" {
            continue;
        }

        let entry = by_name
            .entry(name.clone())
            .or_insert_with(|| L3InterfaceFacts {
                name,
                ipv4: Vec::new(),
                ipv6: Vec::new(),
            });

        if value.contains(':') || value == "dhcpv6" {
            entry.ipv6.push(value.clone());
        } else {
            entry.ipv4.push(value.clone());
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
set interfaces ethernet eth0 address 'dhcp'
set interfaces ethernet eth1 address '192.0.2.1/24'
set interfaces ethernet eth1 address '2001:db8::1/64'
set interfaces ethernet eth1 vif 10 address '10.10.10.1/24'
set interfaces ethernet eth2 description 'no addresses here'
";

    #[test]
    fn test_parse_l3_interfaces() {
        let interfaces = parse_l3_interfaces(&tokenize(CONFIG));
        assert_eq!(interfaces.len(), 3);

        assert_eq!(interfaces[0].name, "eth0");
        assert_eq!(interfaces[0].ipv4, vec!["dhcp"]);

        assert_eq!(interfaces[1].name, "eth1");
        assert_eq!(interfaces[1].ipv4, vec!["192.0.2.1/24"]);
        assert_eq!(interfaces[1].ipv6, vec!["2001:db8::1/64"]);

        assert_eq!(interfaces[2].name, "eth1.10");
        assert_eq!(interfaces[2].ipv4, vec!["10.10.10.1/24"]);
    }

    #[test]
    fn test_interfaces_without_addresses_are_skipped() {
        let interfaces =
            parse_l3_interfaces(&tokenize("set interfaces ethernet eth2 mtu '1500'"));
        assert!(interfaces.is_empty());
    }
}
