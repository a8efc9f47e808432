//! Subset resolution
//!
//! Turns the caller's legacy and resource token lists into one deduplicated,
//! canonically ordered collector plan. Negation (`!name`), the `all` wildcard
//! (both namespaces) and the `min` wildcard (legacy only) are handled here;
//! unknown tokens degrade to warnings and never abort resolution.

use std::collections::BTreeSet;

use tracing::debug;

use crate::registry::{CollectorRegistry, Namespace};

/// Wildcard selecting every name in a namespace
pub const WILDCARD_ALL: &str = "all";
/// Wildcard selecting the minimal legacy subset
pub const WILDCARD_MIN: &str = "min";

/// Legacy subset names `min` expands to: the identity facts only, strictly
/// excluding the config and neighbor categories.
pub const MIN_SUBSET: &[&str] = &["default"];

/// One requested subset, parsed once from the `!` prefix convention at the
/// boundary so nothing downstream re-parses prefix characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsetToken {
    /// Subset name or wildcard, prefix stripped
    pub name: String,
    /// Whether the token excludes rather than selects
    pub negated: bool,
}

impl SubsetToken {
    /// Parse one raw token (`"config"`, `"!config"`, `"all"`, ...)
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('!') {
            Some(name) => Self {
                name: name.to_string(),
                negated: true,
            },
            None => Self {
                name: raw.to_string(),
                negated: false,
            },
        }
    }

    /// Parse a whole token list
    #[must_use]
    pub fn parse_all(raw: &[String]) -> Vec<Self> {
        raw.iter().map(|t| Self::parse(t)).collect()
    }
}

/// Which selection a namespace falls back to when the caller supplied no
/// tokens for it at all. Carried as configuration so the scheduled flip of
/// the legacy default from `All` to `Min` is a one-line change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegacyDefault {
    /// Every legacy subset (current default)
    #[default]
    All,
    /// The minimal subset only (future default)
    Min,
}

/// Resolver configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverConfig {
    /// Default selection for an empty legacy request
    pub legacy_default: LegacyDefault,
}

const DEFAULT_CHANGE_WARNING: &str = "default value for the legacy subset selection will change \
     from `all` to `min` in a future release; request `all` explicitly to keep the current behavior";

/// One entry of the resolved plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCollector {
    /// Registered collector name
    pub name: String,
    /// Namespace the name was resolved in
    pub namespace: Namespace,
}

/// Output of resolution: the ordered plan (legacy block first, then resource
/// block, each in canonical registry order) plus request-level warnings.
#[derive(Debug, Default)]
pub struct ResolvedSubsets {
    /// Deduplicated collector plan in execution order
    pub collectors: Vec<ResolvedCollector>,
    /// Warnings about the request itself (unknown tokens, deprecated default)
    pub warnings: Vec<String>,
}

/// Resolve both namespaces' token lists into one execution plan.
#[must_use]
pub fn resolve(
    registry: &CollectorRegistry,
    config: ResolverConfig,
    legacy_tokens: &[SubsetToken],
    resource_tokens: &[SubsetToken],
) -> ResolvedSubsets {
    let mut resolved = ResolvedSubsets::default();

    resolve_namespace(
        registry,
        Namespace::Legacy,
        legacy_tokens,
        config,
        &mut resolved,
    );
    resolve_namespace(
        registry,
        Namespace::Resource,
        resource_tokens,
        config,
        &mut resolved,
    );

    debug!(
        collectors = ?resolved.collectors.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        warnings = resolved.warnings.len(),
        "subset selection resolved"
    );

    resolved
}

fn resolve_namespace(
    registry: &CollectorRegistry,
    namespace: Namespace,
    tokens: &[SubsetToken],
    config: ResolverConfig,
    out: &mut ResolvedSubsets,
) {
    let mut include: BTreeSet<&str> = BTreeSet::new();
    let mut exclude: BTreeSet<&str> = BTreeSet::new();

    for token in tokens {
        let target = if token.negated {
            &mut exclude
        } else {
            &mut include
        };
        match expand(registry, namespace, &token.name) {
            Some(names) => target.extend(names),
            None => out
                .warnings
                .push(format!("unrecognized subset: {}", token.name)),
        }
    }

    // Documented default: only when the namespace got no tokens at all.
    // The legacy namespace defaults to `all` (deprecated); resource facts
    // are opt-in and default to nothing.
    if tokens.is_empty() && namespace == Namespace::Legacy {
        let wildcard = match config.legacy_default {
            LegacyDefault::All => WILDCARD_ALL,
            LegacyDefault::Min => WILDCARD_MIN,
        };
        include.extend(expand(registry, namespace, wildcard).unwrap_or_default());
        if config.legacy_default == LegacyDefault::All {
            out.warnings.push(DEFAULT_CHANGE_WARNING.to_string());
        }
    }

    // Exclusion dominates inclusion regardless of token order, then the
    // canonical registry order fixes execution order.
    for name in registry.all_names(namespace) {
        if include.contains(name) && !exclude.contains(name) {
            out.collectors.push(ResolvedCollector {
                name: name.to_string(),
                namespace,
            });
        }
    }
}

/// Expand one token name to registered names. `None` means the token neither
/// names a registered subset nor a wildcard meaningful in this namespace.
fn expand<'r>(
    registry: &'r CollectorRegistry,
    namespace: Namespace,
    name: &str,
) -> Option<Vec<&'r str>> {
    if name == WILDCARD_ALL {
        return Some(registry.all_names(namespace).collect());
    }
    if name == WILDCARD_MIN {
        // `min` only means something for legacy categories; in the resource
        // namespace it expands to nothing rather than erroring.
        return match namespace {
            Namespace::Legacy => Some(
                registry
                    .all_names(namespace)
                    .filter(|n| MIN_SUBSET.contains(n))
                    .collect(),
            ),
            Namespace::Resource => Some(Vec::new()),
        };
    }
    registry
        .all_names(namespace)
        .find(|n| *n == name)
        .map(|n| vec![n])
}
