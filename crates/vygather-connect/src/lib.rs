//! vygather-connect: device connection abstraction
//!
//! Provides the `DeviceConnection` trait and an SSH implementation for talking
//! to the management plane of a network device.

pub mod error;
pub mod keys;
pub mod result;
pub mod ssh;
pub mod traits;

pub use error::ConnectError;
pub use keys::{KeySource, ResolvedKey};
pub use result::{CommandOutput, ConnectionInfo};
pub use ssh::{SshConnection, SshConnectionBuilder};
pub use traits::DeviceConnection;
