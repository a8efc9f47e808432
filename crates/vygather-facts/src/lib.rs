//! vygather-facts: subset resolution and fact aggregation
//!
//! Turns a caller's subset selection (legacy categories plus named network
//! resources, with `!` negation and `all`/`min` wildcards) into an ordered
//! collector plan, runs it against one device connection, and merges the
//! results into a single fact tree with accumulated warnings.

pub mod aggregator;
pub mod collectors;
pub mod error;
pub mod registry;
pub mod subset;
pub mod tree;

pub use aggregator::FactGatherer;
pub use error::{CollectError, FactsError};
pub use registry::{Collector, CollectorRegistry, Namespace, builtin_registry};
pub use subset::{LegacyDefault, ResolvedCollector, ResolvedSubsets, ResolverConfig, SubsetToken};
pub use tree::{FactFragment, FactTree, GatherResult, RESOURCES_KEY};
