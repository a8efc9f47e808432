//! Device configuration file

use std::path::Path;
use std::time::Duration;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Connection settings for a managed device, loadable from TOML.
/// Command-line flags override file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// IP address or hostname of the device
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH user (defaults to vyos)
    #[serde(default = "default_user")]
    pub user: String,
    /// Path to SSH private key (optional, falls back to ssh-agent)
    pub ssh_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    22
}

fn default_user() -> String {
    "vyos".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl DeviceConfig {
    /// Load a device config from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading device config {}", path.display()))?;
        toml::from_str(&raw)
            .wrap_err_with(|| format!("parsing device config {}", path.display()))
    }

    /// Per-request deadline
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: DeviceConfig = toml::from_str(r#"host = "192.0.2.1""#).unwrap();
        assert_eq!(config.port, 22);
        assert_eq!(config.user, "vyos");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.ssh_key.is_none());
    }

    #[test]
    fn test_full_config() {
        let config: DeviceConfig = toml::from_str(
            r#"
host = "r1.example.net"
port = 2222
user = "admin"
ssh_key = "/home/ops/.ssh/id_ed25519"
timeout_secs = 5
"#,
        )
        .unwrap();
        assert_eq!(config.port, 2222);
        assert_eq!(config.ssh_key.as_deref(), Some("/home/ops/.ssh/id_ed25519"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }
}
