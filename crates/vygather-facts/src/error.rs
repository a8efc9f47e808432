//! Error types for vygather-facts

use thiserror::Error;
use vygather_connect::ConnectError;

/// Error reported by a single collector.
///
/// `Unsupported` and `Parse` are intrinsic to the target device and degrade
/// to warnings; `Transport` invalidates the whole run.
#[derive(Error, Debug)]
pub enum CollectError {
    /// The device does not support this subset (feature absent, section empty)
    #[error("not supported by device: {0}")]
    Unsupported(String),

    /// The device answered but the output could not be parsed
    #[error("unparseable device output: {0}")]
    Parse(String),

    /// The connection itself failed
    #[error(transparent)]
    Transport(#[from] ConnectError),
}

/// Fatal errors from a fact-gathering run.
#[derive(Error, Debug)]
pub enum FactsError {
    /// The resolver produced a name absent from the registry.
    /// Indicates an internal consistency bug, never a bad request.
    #[error("unknown collector: {0}")]
    UnknownCollector(String),

    /// Two collectors wrote the same fact key.
    /// Indicates a registry/contract bug, never silently resolved.
    #[error("fact key collision: {key} written by more than one collector")]
    FactCollision {
        /// The contested key
        key: String,
    },

    /// The device connection failed; remaining collectors were not invoked
    #[error(transparent)]
    Transport(#[from] ConnectError),
}
