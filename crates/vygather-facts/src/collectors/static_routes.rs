//! `static_routes` resource collector

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use vygather_connect::DeviceConnection;

use crate::collectors::config_tokens;
use crate::error::CollectError;
use crate::registry::Collector;
use crate::tree::FactFragment;

/// One configured next-hop
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NextHop {
    /// Forwarding router address
    pub address: String,
    /// Administrative distance, if set
    pub distance: Option<u8>,
}

/// One static route
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StaticRouteFacts {
    /// Destination prefix
    pub dest: String,
    /// Address family: `ipv4` or `ipv6`
    pub afi: &'static str,
    /// Configured next-hops
    pub next_hops: Vec<NextHop>,
    /// Whether the route discards traffic instead of forwarding
    pub blackhole: bool,
}

/// Collector for the `static_routes` resource
pub struct StaticRoutes;

#[async_trait]
impl Collector for StaticRoutes {
    fn key(&self) -> &'static str {
        "static_routes"
    }

    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError> {
        let lines = config_tokens(conn, "set protocols static route").await?;
        let routes = parse_static_routes(&lines);

        let mut fragment = FactFragment::new();
        fragment.insert(
            self.key(),
            serde_json::to_value(routes).map_err(|e| CollectError::Parse(e.to_string()))?,
        );
        Ok(fragment)
    }
}

/// Parse `set protocols static route[6] <dest> ...` tokens. Routes come out
/// keyed by family-then-destination so repeated gathers agree on order.
fn parse_static_routes(lines: &[Vec<String>]) -> Vec<StaticRouteFacts> {
    let mut by_dest: BTreeMap<(&'static str, String), StaticRouteFacts> = BTreeMap::new();

    for tokens in lines {
        // set protocols static route <dest> next-hop <addr> [distance <d>]
        // set protocols static route <dest> blackhole
        let afi = match tokens.get(3).map(String::as_str) {
            Some("route") => "ipv4",
            Some("route6") => "ipv6",
            _ => continue,
        };
        let Some(dest) = tokens.get(4) else { continue };

        let route = by_dest
            .entry((afi, dest.clone()))
            .or_insert_with(|| StaticRouteFacts {
                dest: dest.clone(),
                afi,
                next_hops: Vec::new(),
                blackhole: false,
            });

        match (tokens.get(5).map(String::as_str), tokens.get(6)) {
            (Some("next-hop"), Some(addr)) => {
                let distance = match (tokens.get(7).map(String::as_str), tokens.get(8)) {
                    (Some("distance"), Some(d)) => d.parse().ok(),
                    _ => None,
                };
                match route.next_hops.iter_mut().find(|h| &h.address == addr) {
                    Some(hop) => {
                        if distance.is_some() {
                            hop.distance = distance;
                        }
                    }
                    None => route.next_hops.push(NextHop {
                        address: addr.clone(),
                        distance,
                    }),
                }
            }
            (Some("blackhole"), _) => route.blackhole = true,
            _ => {}
        }
    }

    by_dest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::split_config_line;

    fn tokenize(config: &str) -> Vec<Vec<String>> {
        config.lines().map(split_config_line).collect()
    }

    const CONFIG: &str = "\
set protocols static route 0.0.0.0/0 next-hop 192.0.2.254
set protocols static route 0.0.0.0/0 next-hop 192.0.2.254 distance '10'
set protocols static route 10.20.0.0/16 next-hop 192.0.2.1
set protocols static route 10.20.0.0/16 next-hop 192.0.2.2 distance '200'
set protocols static route 198.51.100.0/24 blackhole
set protocols static route6 2001:db8::/32 next-hop 2001:db8:1::1
";

    #[test]
    fn test_parse_static_routes() {
        let routes = parse_static_routes(&tokenize(CONFIG));
        assert_eq!(routes.len(), 4);

        let default = &routes[0];
        assert_eq!(default.dest, "0.0.0.0/0");
        assert_eq!(default.afi, "ipv4");
        assert_eq!(default.next_hops.len(), 1);
        assert_eq!(default.next_hops[0].address, "192.0.2.254");
        assert_eq!(default.next_hops[0].distance, Some(10));

        let multi = &routes[1];
        assert_eq!(multi.dest, "10.20.0.0/16");
        assert_eq!(multi.next_hops.len(), 2);
        assert_eq!(multi.next_hops[1].distance, Some(200));

        let blackhole = &routes[2];
        assert_eq!(blackhole.dest, "198.51.100.0/24");
        assert!(blackhole.blackhole);
        assert!(blackhole.next_hops.is_empty());

        let v6 = &routes[3];
        assert_eq!(v6.afi, "ipv6");
        assert_eq!(v6.next_hops[0].address, "2001:db8:1::1");
    }

    #[test]
    fn test_no_routes() {
        assert!(parse_static_routes(&[]).is_empty());
    }
}
