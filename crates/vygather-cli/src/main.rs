//! vygather CLI
//!
//! Gathers facts from a VyOS-style network device and prints them as JSON.
//! Warnings never suppress output; transport failures and contract violations
//! exit nonzero with the cause.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vygather_connect::{ConnectionInfo, KeySource, SshConnection};
use vygather_facts::{FactGatherer, ResolverConfig, SubsetToken, builtin_registry};

mod config;

use config::DeviceConfig;

#[derive(Parser)]
#[command(name = "vygather")]
#[command(about = "Gather facts from a VyOS-style network device", long_about = None)]
struct Cli {
    /// Device address (overrides the config file)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// SSH port
    #[arg(long)]
    port: Option<u16>,

    /// SSH user
    #[arg(short, long)]
    user: Option<String>,

    /// Path to SSH private key (defaults to ssh-agent)
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Device config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Legacy subset selection: all, min, default, config, neighbors,
    /// each optionally negated with a leading `!`
    #[arg(short = 'g', long = "gather-subset", value_delimiter = ',')]
    gather_subset: Vec<String>,

    /// Resource subset selection: all, interfaces, l3_interfaces, ...
    #[arg(short = 'r', long = "gather-network-resources", value_delimiter = ',')]
    gather_network_resources: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    /// Merge the config file (if any) with flag overrides
    fn device_config(&self) -> Result<DeviceConfig> {
        let mut device = match &self.config {
            Some(path) => DeviceConfig::load(path)?,
            None => DeviceConfig {
                host: String::new(),
                port: 22,
                user: "vyos".to_string(),
                ssh_key: None,
                timeout_secs: 30,
            },
        };

        if let Some(host) = &self.host {
            device.host = host.clone();
        }
        if let Some(port) = self.port {
            device.port = port;
        }
        if let Some(user) = &self.user {
            device.user = user.clone();
        }
        if let Some(key) = &self.key {
            device.ssh_key = Some(key.display().to_string());
        }
        if let Some(timeout) = self.timeout {
            device.timeout_secs = timeout;
        }

        if device.host.is_empty() {
            eyre::bail!("no device given: pass --host or a config file with a host entry");
        }

        Ok(device)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let device = cli.device_config()?;

    let conn_info =
        ConnectionInfo::new(&device.host, &device.user).with_port(device.port);
    let key_source = match &device.ssh_key {
        Some(path) => KeySource::Path(path.into()),
        None => KeySource::Agent,
    };
    let conn = SshConnection::new(conn_info, &key_source)
        .wrap_err("building device connection")?
        .with_request_timeout(device.timeout());

    let legacy = SubsetToken::parse_all(&cli.gather_subset);
    let resources = SubsetToken::parse_all(&cli.gather_network_resources);

    let gatherer = FactGatherer::new(builtin_registry(), ResolverConfig::default());
    let result = gatherer
        .gather(&conn, &legacy, &resources)
        .await
        .wrap_err_with(|| format!("gathering facts from {}", device.host))?;

    info!(
        host = %device.host,
        fact_keys = result.facts.len(),
        warnings = result.warnings.len(),
        "gather complete"
    );

    conn.disconnect().await.ok();

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{rendered}");

    Ok(())
}
