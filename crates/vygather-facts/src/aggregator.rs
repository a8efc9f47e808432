//! Fact aggregation
//!
//! Runs the resolved collector plan against one device connection, strictly
//! in order, merging each fragment into the result tree. A collector that
//! cannot produce data for device-intrinsic reasons becomes a warning and the
//! run continues; a transport failure aborts the run immediately, because
//! every result after a broken channel would be silently wrong rather than
//! merely incomplete.

use tracing::{debug, info, instrument, warn};
use vygather_connect::DeviceConnection;

use crate::error::{CollectError, FactsError};
use crate::registry::CollectorRegistry;
use crate::subset::{ResolvedCollector, ResolverConfig, SubsetToken, resolve};
use crate::tree::{FactTree, GatherResult};

/// Fact gathering engine
///
/// Borrows a read-only collector registry; one `gather` call is one
/// exclusive run with its own result tree and warning accumulator.
pub struct FactGatherer<'r> {
    registry: &'r CollectorRegistry,
    config: ResolverConfig,
}

impl<'r> FactGatherer<'r> {
    /// Create a gatherer over a registry
    #[must_use]
    pub fn new(registry: &'r CollectorRegistry, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve the caller's subset selection and collect the selected facts.
    ///
    /// # Errors
    /// Returns `FactsError` on transport failure, a fact key collision, or an
    /// internal resolver/registry inconsistency. Request-level problems (bad
    /// tokens, unsupported subsets) surface as warnings instead.
    #[instrument(skip_all, fields(transport = conn.transport_name()))]
    pub async fn gather(
        &self,
        conn: &dyn DeviceConnection,
        legacy_tokens: &[SubsetToken],
        resource_tokens: &[SubsetToken],
    ) -> Result<GatherResult, FactsError> {
        let resolved = resolve(self.registry, self.config, legacy_tokens, resource_tokens);
        let mut warnings = resolved.warnings;

        let facts = self
            .run(conn, &resolved.collectors, &mut warnings)
            .await?;

        info!(
            fact_keys = facts.len(),
            warnings = warnings.len(),
            "fact gathering completed"
        );

        Ok(GatherResult { facts, warnings })
    }

    /// Execute an already-resolved plan.
    ///
    /// # Errors
    /// As for [`gather`](Self::gather).
    pub async fn run(
        &self,
        conn: &dyn DeviceConnection,
        plan: &[ResolvedCollector],
        warnings: &mut Vec<String>,
    ) -> Result<FactTree, FactsError> {
        let mut tree = FactTree::new();

        for entry in plan {
            let Some((namespace, collector)) = self.registry.lookup(&entry.name) else {
                // resolver and registry disagree; refuse to guess
                return Err(FactsError::UnknownCollector(entry.name.clone()));
            };
            debug_assert_eq!(namespace, entry.namespace);

            debug!(collector = entry.name, "running collector");

            match collector.collect(conn).await {
                Ok(fragment) => {
                    warnings.extend(fragment.warnings);
                    tree.merge(entry.namespace, fragment.facts)?;
                }
                Err(CollectError::Transport(e)) => {
                    // broken channel: abort, remaining collectors never run
                    return Err(FactsError::Transport(e));
                }
                Err(e @ (CollectError::Unsupported(_) | CollectError::Parse(_))) => {
                    warn!(collector = entry.name, error = %e, "collector failed, continuing");
                    warnings.push(format!("subset {} not collected: {e}", entry.name));
                }
            }
        }

        Ok(tree)
    }
}
