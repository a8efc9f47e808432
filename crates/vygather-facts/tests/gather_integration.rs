use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use vygather_connect::error::ConnectError;
use vygather_connect::result::CommandOutput;
use vygather_connect::traits::DeviceConnection;
use vygather_facts::registry::{Collector, CollectorRegistry, Namespace, builtin_registry};
use vygather_facts::subset::{ResolverConfig, SubsetToken};
use vygather_facts::tree::FactFragment;
use vygather_facts::{CollectError, FactGatherer, FactsError};

// Mock implementations

/// Connection scripted per command string; unscripted commands fail the test.
struct MockConnection {
    responses: HashMap<&'static str, CommandOutput>,
}

impl MockConnection {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    fn on(mut self, cmd: &'static str, stdout: &str) -> Self {
        self.responses.insert(
            cmd,
            CommandOutput {
                status: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
                duration: Duration::from_millis(1),
            },
        );
        self
    }

    fn failing(mut self, cmd: &'static str, stderr: &str) -> Self {
        self.responses.insert(
            cmd,
            CommandOutput {
                status: 1,
                stdout: String::new(),
                stderr: stderr.to_string(),
                duration: Duration::from_millis(1),
            },
        );
        self
    }
}

#[async_trait]
impl DeviceConnection for MockConnection {
    async fn request(&self, cmd: &str) -> Result<CommandOutput, ConnectError> {
        self.responses
            .get(cmd)
            .cloned()
            .ok_or_else(|| panic!("unscripted command: {cmd}"))
    }

    async fn request_with_timeout(
        &self,
        cmd: &str,
        _timeout: Duration,
    ) -> Result<CommandOutput, ConnectError> {
        self.request(cmd).await
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

const SHOW_VERSION: &str = "\
Version:          VyOS 1.4-rolling-202310
Hardware model:   Standard PC
Hardware S/N:     QEMU-1234
";

const SHOW_CONFIG: &str = "\
set interfaces ethernet eth0 address '192.0.2.1/24'
set interfaces ethernet eth0 description 'WAN'
set interfaces ethernet eth1 disable
set service lldp interface eth0
set protocols static route 0.0.0.0/0 next-hop 192.0.2.254
";

const SHOW_LLDP: &str = "\
Interface:    eth0, via: LLDP, RID: 1
    SysName:      core-sw1
";

fn full_mock() -> MockConnection {
    MockConnection::new()
        .on("show host name", "vyos-r1\n")
        .on("show version", SHOW_VERSION)
        .on("show configuration commands", SHOW_CONFIG)
        .on("show lldp neighbors detail", SHOW_LLDP)
}

fn tokens(raw: &[&str]) -> Vec<SubsetToken> {
    raw.iter().map(|t| SubsetToken::parse(t)).collect()
}

#[tokio::test]
async fn test_default_gather_collects_all_legacy_no_resources() {
    let conn = full_mock();
    let gatherer = FactGatherer::new(builtin_registry(), ResolverConfig::default());

    let result = gatherer.gather(&conn, &[], &[]).await.unwrap();

    assert_eq!(result.facts.get("net_hostname"), Some(&json!("vyos-r1")));
    assert_eq!(
        result.facts.get("net_version"),
        Some(&json!("VyOS 1.4-rolling-202310"))
    );
    assert!(result.facts.get("net_config").is_some());
    assert!(result.facts.get("net_neighbors").is_some());
    // resource facts are opt-in
    assert!(result.facts.get("network_resources").is_none());

    let deprecations = result
        .warnings
        .iter()
        .filter(|w| w.contains("will change"))
        .count();
    assert_eq!(deprecations, 1);
}

#[tokio::test]
async fn test_resource_gather_nests_under_shared_key() {
    let conn = full_mock();
    let gatherer = FactGatherer::new(builtin_registry(), ResolverConfig::default());

    let result = gatherer
        .gather(
            &conn,
            &tokens(&["min"]),
            &tokens(&["interfaces", "l3_interfaces", "static_routes"]),
        )
        .await
        .unwrap();

    let interfaces = result.facts.get_resource("interfaces").unwrap();
    assert_eq!(interfaces[0]["name"], json!("eth0"));
    assert_eq!(interfaces[0]["description"], json!("WAN"));
    assert_eq!(interfaces[1]["enabled"], json!(false));

    let l3 = result.facts.get_resource("l3_interfaces").unwrap();
    assert_eq!(l3[0]["ipv4"], json!(["192.0.2.1/24"]));

    let routes = result.facts.get_resource("static_routes").unwrap();
    assert_eq!(routes[0]["dest"], json!("0.0.0.0/0"));

    // min excludes config and neighbors
    assert!(result.facts.get("net_config").is_none());
    assert!(result.facts.get("net_neighbors").is_none());
    assert!(result.warnings.is_empty());
}

#[tokio::test]
async fn test_soft_failure_absorbed_as_warning() {
    // LLDP not enabled on the device: neighbors degrades, the rest survives
    let conn = MockConnection::new()
        .on("show host name", "vyos-r1\n")
        .on("show version", SHOW_VERSION)
        .on("show configuration commands", SHOW_CONFIG)
        .failing("show lldp neighbors detail", "lldpd is not running");
    let gatherer = FactGatherer::new(builtin_registry(), ResolverConfig::default());

    let result = gatherer
        .gather(&conn, &tokens(&["all"]), &[])
        .await
        .unwrap();

    assert!(result.facts.get("net_hostname").is_some());
    assert!(result.facts.get("net_config").is_some());
    assert!(result.facts.get("net_neighbors").is_none());

    let neighbor_warnings: Vec<_> = result
        .warnings
        .iter()
        .filter(|w| w.contains("neighbors"))
        .collect();
    assert_eq!(neighbor_warnings.len(), 1);
    assert!(neighbor_warnings[0].contains("lldpd is not running"));
}

#[tokio::test]
async fn test_unrecognized_token_warns_but_gathers() {
    let conn = full_mock();
    let gatherer = FactGatherer::new(builtin_registry(), ResolverConfig::default());

    let result = gatherer
        .gather(&conn, &tokens(&["min", "bogus"]), &[])
        .await
        .unwrap();

    assert!(result.facts.get("net_hostname").is_some());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w == "unrecognized subset: bogus")
    );
}

// Transport-abort behavior needs a collector registry where the failure point
// is observable, so these tests build their own registries.

struct StaticCollector {
    key: &'static str,
    value: &'static str,
}

#[async_trait]
impl Collector for StaticCollector {
    fn key(&self) -> &'static str {
        self.key
    }

    async fn collect(
        &self,
        _conn: &dyn DeviceConnection,
    ) -> Result<FactFragment, CollectError> {
        let mut fragment = FactFragment::new();
        fragment.insert(self.key, self.value);
        Ok(fragment)
    }
}

struct TransportFailCollector {
    key: &'static str,
}

#[async_trait]
impl Collector for TransportFailCollector {
    fn key(&self) -> &'static str {
        self.key
    }

    async fn collect(
        &self,
        _conn: &dyn DeviceConnection,
    ) -> Result<FactFragment, CollectError> {
        Err(CollectError::Transport(ConnectError::ConnectionFailed(
            "peer reset".to_string(),
        )))
    }
}

/// Counts invocations, so tests can prove later collectors never ran
struct CountingCollector {
    key: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Collector for CountingCollector {
    fn key(&self) -> &'static str {
        self.key
    }

    async fn collect(
        &self,
        _conn: &dyn DeviceConnection,
    ) -> Result<FactFragment, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FactFragment::new())
    }
}

#[tokio::test]
async fn test_transport_failure_aborts_before_later_collectors() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = CollectorRegistry::new();
    registry.register(
        Namespace::Legacy,
        Arc::new(StaticCollector {
            key: "alpha",
            value: "a",
        }),
    );
    registry.register(
        Namespace::Legacy,
        Arc::new(TransportFailCollector { key: "beta" }),
    );
    registry.register(
        Namespace::Legacy,
        Arc::new(CountingCollector {
            key: "gamma",
            calls: Arc::clone(&calls),
        }),
    );

    let conn = MockConnection::new();
    let gatherer = FactGatherer::new(&registry, ResolverConfig::default());

    let err = gatherer
        .gather(&conn, &tokens(&["all"]), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, FactsError::Transport(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0, "gamma must never run");
}

#[tokio::test]
async fn test_fact_collision_is_fatal() {
    let mut registry = CollectorRegistry::new();
    registry.register(
        Namespace::Legacy,
        Arc::new(StaticCollector {
            key: "first",
            value: "1",
        }),
    );
    registry.register(
        Namespace::Legacy,
        Arc::new(CollidingCollector),
    );

    let conn = MockConnection::new();
    let gatherer = FactGatherer::new(&registry, ResolverConfig::default());

    let err = gatherer
        .gather(&conn, &tokens(&["all"]), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, FactsError::FactCollision { key } if key == "first"));
}

/// Writes a key another collector already owns
struct CollidingCollector;

#[async_trait]
impl Collector for CollidingCollector {
    fn key(&self) -> &'static str {
        "second"
    }

    async fn collect(
        &self,
        _conn: &dyn DeviceConnection,
    ) -> Result<FactFragment, CollectError> {
        let mut fragment = FactFragment::new();
        fragment.insert("first", "stolen");
        Ok(fragment)
    }
}

#[tokio::test]
async fn test_collector_fragment_warnings_surface() {
    struct PartialCollector;

    #[async_trait]
    impl Collector for PartialCollector {
        fn key(&self) -> &'static str {
            "partial"
        }

        async fn collect(
            &self,
            _conn: &dyn DeviceConnection,
        ) -> Result<FactFragment, CollectError> {
            let mut fragment = FactFragment::new();
            fragment.insert("partial", json!({"seen": 1}));
            fragment.warn("partial: device returned a truncated table");
            Ok(fragment)
        }
    }

    let mut registry = CollectorRegistry::new();
    registry.register(Namespace::Legacy, Arc::new(PartialCollector));

    let conn = MockConnection::new();
    let gatherer = FactGatherer::new(&registry, ResolverConfig::default());

    let result = gatherer.gather(&conn, &tokens(&["all"]), &[]).await.unwrap();
    assert!(result.facts.get("partial").is_some());
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("truncated table"))
    );
}
