//! Collector registry
//!
//! Maps subset names to the collectors that produce them. Registration order
//! within a namespace is the canonical order: it decides what `all` expands
//! to and the order collectors run in, so "all" gathers are stable across
//! runs. The registry is populated once at startup and read-only afterwards.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use vygather_connect::DeviceConnection;

use crate::collectors;
use crate::error::CollectError;
use crate::tree::FactFragment;

/// Which half of the registry a collector lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Coarse, historically fixed categories (`default`, `config`, `neighbors`)
    Legacy,
    /// Fine-grained named resources (`interfaces`, `l3_interfaces`, ...)
    Resource,
}

/// A fact producer for one subset name.
///
/// The engine treats the implementation as opaque: it drives the device
/// connection however it needs to and returns one fragment.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The subset name this collector is registered under
    fn key(&self) -> &'static str;

    /// Produce this subset's facts from the device
    async fn collect(&self, conn: &dyn DeviceConnection) -> Result<FactFragment, CollectError>;
}

struct Entry {
    namespace: Namespace,
    collector: Arc<dyn Collector>,
}

/// Name-to-collector mapping, partitioned into legacy and resource namespaces.
#[derive(Default)]
pub struct CollectorRegistry {
    entries: Vec<Entry>,
}

impl CollectorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collector. Call order fixes the canonical order.
    ///
    /// # Panics
    /// Panics if the name is already registered; names are unique across
    /// both namespaces and registration happens once at startup.
    pub fn register(&mut self, namespace: Namespace, collector: Arc<dyn Collector>) {
        let name = collector.key();
        assert!(
            self.lookup(name).is_none(),
            "collector registered twice: {name}"
        );
        self.entries.push(Entry {
            namespace,
            collector,
        });
    }

    /// Look up a collector by name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(Namespace, Arc<dyn Collector>)> {
        self.entries
            .iter()
            .find(|e| e.collector.key() == name)
            .map(|e| (e.namespace, Arc::clone(&e.collector)))
    }

    /// Whether `name` is registered in `namespace`
    #[must_use]
    pub fn contains(&self, namespace: Namespace, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.namespace == namespace && e.collector.key() == name)
    }

    /// Every name in `namespace`, in canonical order
    pub fn all_names(&self, namespace: Namespace) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.namespace == namespace)
            .map(|e| e.collector.key())
    }

    /// Registry with the full builtin collector set
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(Namespace::Legacy, Arc::new(collectors::legacy::DefaultFacts));
        registry.register(Namespace::Legacy, Arc::new(collectors::legacy::ConfigFacts));
        registry.register(
            Namespace::Legacy,
            Arc::new(collectors::legacy::NeighborsFacts),
        );

        registry.register(Namespace::Resource, Arc::new(collectors::interfaces::Interfaces));
        registry.register(
            Namespace::Resource,
            Arc::new(collectors::l3_interfaces::L3Interfaces),
        );
        registry.register(Namespace::Resource, Arc::new(collectors::lldp::LldpGlobal));
        registry.register(
            Namespace::Resource,
            Arc::new(collectors::lldp::LldpInterfaces),
        );
        registry.register(
            Namespace::Resource,
            Arc::new(collectors::static_routes::StaticRoutes),
        );

        registry
    }
}

/// Process-wide builtin registry, built on first use and read-only after.
pub fn builtin_registry() -> &'static CollectorRegistry {
    static REGISTRY: OnceLock<CollectorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(CollectorRegistry::builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_canonical_orders() {
        let registry = builtin_registry();
        let legacy: Vec<_> = registry.all_names(Namespace::Legacy).collect();
        assert_eq!(legacy, vec!["default", "config", "neighbors"]);

        let resources: Vec<_> = registry.all_names(Namespace::Resource).collect();
        assert_eq!(
            resources,
            vec![
                "interfaces",
                "l3_interfaces",
                "lldp_global",
                "lldp_interfaces",
                "static_routes"
            ]
        );
    }

    #[test]
    fn test_lookup() {
        let registry = builtin_registry();
        let (ns, collector) = registry.lookup("interfaces").unwrap();
        assert_eq!(ns, Namespace::Resource);
        assert_eq!(collector.key(), "interfaces");
        assert!(registry.lookup("bogus").is_none());
    }

    #[test]
    fn test_namespaces_never_share_names() {
        let registry = builtin_registry();
        for name in registry.all_names(Namespace::Legacy) {
            assert!(!registry.contains(Namespace::Resource, name));
        }
    }
}
