//! Device connection trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ConnectError;
use crate::result::CommandOutput;

/// A serialized request/response channel to a network device.
///
/// Implementations hold at most one outstanding request at a time; callers
/// issue requests strictly sequentially. Every error returned from this trait
/// is a transport-level failure and invalidates the run that triggered it.
#[async_trait]
pub trait DeviceConnection: Send + Sync {
    /// Execute one operational command on the device and collect its output.
    async fn request(&self, cmd: &str) -> Result<CommandOutput, ConnectError>;

    /// Execute one command with a per-request deadline.
    async fn request_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandOutput, ConnectError>;

    /// Whether a session is currently established.
    fn is_connected(&self) -> bool {
        false
    }

    /// Transport discriminator for logging ("ssh", "mock", ...).
    fn transport_name(&self) -> &'static str;
}
