//! Fact fragments and the accumulated result tree

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FactsError;
use crate::registry::Namespace;

/// Top-level key all resource collectors share, by design.
/// Legacy collectors own the rest of the top level (`net_*` keys).
pub const RESOURCES_KEY: &str = "network_resources";

/// Facts produced by one collector, plus any warnings it raised while
/// producing them (partial data, skipped sections).
#[derive(Debug, Clone, Default)]
pub struct FactFragment {
    /// Fact keys and values. For legacy collectors these land at the top of
    /// the tree; for resource collectors under `network_resources`.
    pub facts: Map<String, Value>,
    /// Non-fatal conditions hit while collecting
    pub warnings: Vec<String>,
}

impl FactFragment {
    /// Create an empty fragment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one fact
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Record a non-fatal condition
    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// The accumulated union of all collected fact fragments.
///
/// Merge order follows the resolved collector order. A key collision across
/// collectors is a contract violation and surfaces as `FactCollision`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct FactTree(Map<String, Value>);

impl FactTree {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one collector's fragment into the tree.
    ///
    /// Legacy fragments merge at the top level; resource fragments merge
    /// under the shared `network_resources` key.
    ///
    /// # Errors
    /// Returns `FactsError::FactCollision` if the fragment rewrites a key an
    /// earlier collector already produced at the same level.
    pub fn merge(&mut self, namespace: Namespace, facts: Map<String, Value>) -> Result<(), FactsError> {
        match namespace {
            Namespace::Legacy => merge_into(&mut self.0, facts),
            Namespace::Resource => {
                let slot = self
                    .0
                    .entry(RESOURCES_KEY.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                let Value::Object(resources) = slot else {
                    // only merge() writes this key, always as an object
                    return Err(FactsError::FactCollision {
                        key: RESOURCES_KEY.to_string(),
                    });
                };
                merge_into(resources, facts)
            }
        }
    }

    /// Look up a top-level fact
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a resource entry under `network_resources`
    #[must_use]
    pub fn get_resource(&self, name: &str) -> Option<&Value> {
        self.0.get(RESOURCES_KEY)?.as_object()?.get(name)
    }

    /// Number of top-level fact keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no facts were collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn merge_into(target: &mut Map<String, Value>, facts: Map<String, Value>) -> Result<(), FactsError> {
    for (key, value) in facts {
        if target.contains_key(&key) {
            return Err(FactsError::FactCollision { key });
        }
        target.insert(key, value);
    }
    Ok(())
}

/// Final output of a gather run: the fact tree plus every warning raised by
/// the resolver and the collectors, in encounter order.
#[derive(Debug, Serialize)]
pub struct GatherResult {
    /// Collected facts
    pub facts: FactTree,
    /// Resolver warnings followed by aggregator warnings
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_legacy_merge_disjoint() {
        let mut tree = FactTree::new();
        tree.merge(Namespace::Legacy, map(&[("net_hostname", json!("r1"))]))
            .unwrap();
        tree.merge(Namespace::Legacy, map(&[("net_config", json!("set ..."))]))
            .unwrap();
        assert_eq!(tree.get("net_hostname"), Some(&json!("r1")));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_legacy_collision_is_fatal() {
        let mut tree = FactTree::new();
        tree.merge(Namespace::Legacy, map(&[("net_hostname", json!("r1"))]))
            .unwrap();
        let err = tree
            .merge(Namespace::Legacy, map(&[("net_hostname", json!("r2"))]))
            .unwrap_err();
        assert!(matches!(err, FactsError::FactCollision { key } if key == "net_hostname"));
        // earlier value untouched
        assert_eq!(tree.get("net_hostname"), Some(&json!("r1")));
    }

    #[test]
    fn test_resource_fragments_share_top_level_key() {
        let mut tree = FactTree::new();
        tree.merge(Namespace::Resource, map(&[("interfaces", json!([]))]))
            .unwrap();
        tree.merge(Namespace::Resource, map(&[("l3_interfaces", json!([]))]))
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get_resource("interfaces").is_some());
        assert!(tree.get_resource("l3_interfaces").is_some());
    }

    #[test]
    fn test_resource_collision_is_fatal() {
        let mut tree = FactTree::new();
        tree.merge(Namespace::Resource, map(&[("interfaces", json!([]))]))
            .unwrap();
        let err = tree
            .merge(Namespace::Resource, map(&[("interfaces", json!([1]))]))
            .unwrap_err();
        assert!(matches!(err, FactsError::FactCollision { key } if key == "interfaces"));
    }
}
