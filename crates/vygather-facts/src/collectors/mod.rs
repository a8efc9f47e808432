//! Builtin collectors for VyOS-style devices
//!
//! Legacy collectors write `net_*` keys at the top of the fact tree; resource
//! collectors each contribute one entry under `network_resources`. All of them
//! drive the device through plain operational-mode commands and parse the
//! `set ...` configuration dialect.

pub mod interfaces;
pub mod l3_interfaces;
pub mod legacy;
pub mod lldp;
pub mod static_routes;

use vygather_connect::DeviceConnection;

use crate::error::CollectError;

/// Operational commands the builtin collectors issue
pub mod commands {
    pub const SHOW_VERSION: &str = "show version";
    pub const SHOW_HOST_NAME: &str = "show host name";
    pub const SHOW_CONFIG_COMMANDS: &str = "show configuration commands";
    pub const SHOW_LLDP_NEIGHBORS: &str = "show lldp neighbors detail";
}

/// Run one operational command and return its stdout.
///
/// A nonzero exit is a device-intrinsic condition (unknown command, feature
/// not enabled) and reports as `Unsupported`; channel errors pass through as
/// `Transport` via the `ConnectError` conversion.
pub(crate) async fn show(
    conn: &dyn DeviceConnection,
    cmd: &str,
) -> Result<String, CollectError> {
    let output = conn.request(cmd).await?;
    if !output.success() {
        return Err(CollectError::Unsupported(format!(
            "`{cmd}` failed on device: {}",
            output.combined_output().trim()
        )));
    }
    Ok(output.stdout)
}

/// Fetch the device configuration as `set ...` lines, keeping only the lines
/// starting with `prefix` and splitting each into unquoted tokens.
pub(crate) async fn config_tokens(
    conn: &dyn DeviceConnection,
    prefix: &str,
) -> Result<Vec<Vec<String>>, CollectError> {
    let stdout = show(conn, commands::SHOW_CONFIG_COMMANDS).await?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with(prefix))
        .map(split_config_line)
        .collect())
}

/// Split one `set ...` line into tokens, honoring single-quoted values
/// (`set interfaces ethernet eth0 description 'WAN uplink'`).
pub(crate) fn split_config_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '\'' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_line() {
        assert_eq!(
            split_config_line("set interfaces ethernet eth0 mtu 9000"),
            vec!["set", "interfaces", "ethernet", "eth0", "mtu", "9000"]
        );
    }

    #[test]
    fn test_split_quoted_value_keeps_spaces() {
        assert_eq!(
            split_config_line("set interfaces ethernet eth0 description 'WAN uplink'"),
            vec!["set", "interfaces", "ethernet", "eth0", "description", "WAN uplink"]
        );
    }

    #[test]
    fn test_split_quoted_empty_value() {
        assert_eq!(
            split_config_line("set service lldp interface eth1 ''"),
            vec!["set", "service", "lldp", "interface", "eth1"]
        );
    }
}
