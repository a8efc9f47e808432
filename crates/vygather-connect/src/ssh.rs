//! SSH device connection using the russh crate

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{ChannelMsg, Disconnect, client};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

use crate::error::ConnectError;
use crate::keys::{KeySource, ResolvedKey};
use crate::result::{CommandOutput, ConnectionInfo};
use crate::traits::DeviceConnection;

/// SSH client handler for russh
#[derive(Debug)]
struct DeviceClientHandler;

impl client::Handler for DeviceClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Accept all server keys (like StrictHostKeyChecking=no)
        // In production, this should verify against known_hosts
        Ok(true)
    }
}

/// SSH connection to a network device
///
/// Holds one SSH session to the device's management plane. The session is
/// established lazily on the first request, and all requests are serialized
/// through it (one outstanding command at a time).
pub struct SshConnection {
    /// Connection configuration
    conn_info: ConnectionInfo,
    /// Resolved SSH key
    key: ResolvedKey,
    /// Deadline applied to every plain `request`, if set
    request_timeout: Option<Duration>,
    /// SSH session (initialized on first use)
    session: Mutex<Option<client::Handle<DeviceClientHandler>>>,
}

impl std::fmt::Debug for SshConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConnection")
            .field("conn_info", &self.conn_info)
            .field("key", &self.key)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl SshConnection {
    /// Create a new SSH connection
    ///
    /// # Errors
    /// Returns `ConnectError::KeyError` if key resolution fails
    pub fn new(conn_info: ConnectionInfo, key_source: &KeySource) -> Result<Self, ConnectError> {
        let key = key_source
            .resolve()
            .map_err(|e| ConnectError::KeyError(e.to_string()))?;

        Ok(Self {
            conn_info,
            key,
            request_timeout: None,
            session: Mutex::new(None),
        })
    }

    /// Apply a deadline to every request issued through this connection
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Get connection info
    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.conn_info
    }

    /// Connect to the device
    #[instrument(skip(self), fields(host = %self.conn_info.host))]
    async fn connect(&self) -> Result<(), ConnectError> {
        let mut session_lock = self.session.lock().await;

        if session_lock.is_some() {
            return Ok(());
        }

        info!(
            host = %self.conn_info.host,
            port = self.conn_info.port,
            user = %self.conn_info.user,
            "connecting to device"
        );

        let config = Arc::new(client::Config::default());
        let handler = DeviceClientHandler;

        let mut session = client::connect(
            config,
            (&self.conn_info.host[..], self.conn_info.port),
            handler,
        )
        .await
        .map_err(|e| ConnectError::ConnectionFailed(e.to_string()))?;

        if self.key.use_agent() {
            // TODO: agent auth via russh's agent client
            return Err(ConnectError::AuthenticationFailed(
                "SSH agent authentication not yet implemented".to_string(),
            ));
        } else if let Some(key_path) = self.key.path() {
            let key_pair = load_secret_key(key_path, None)
                .map_err(|e| ConnectError::KeyError(e.to_string()))?;

            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .ok()
                .flatten()
                .flatten();
            let auth_res = session
                .authenticate_publickey(
                    &self.conn_info.user,
                    PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
                )
                .await
                .map_err(|e| ConnectError::AuthenticationFailed(e.to_string()))?;

            if !auth_res.success() {
                return Err(ConnectError::AuthenticationFailed(
                    "Public key authentication failed".to_string(),
                ));
            }
        } else {
            return Err(ConnectError::AuthenticationFailed(
                "No authentication method available".to_string(),
            ));
        }

        info!(host = %self.conn_info.host, "device session established");

        *session_lock = Some(session);
        Ok(())
    }

    /// Run one command on the device
    #[instrument(skip(self, cmd), fields(host = %self.conn_info.host))]
    async fn execute_remote(&self, cmd: &str) -> Result<CommandOutput, ConnectError> {
        let mut session_lock = self.session.lock().await;

        let session = session_lock.as_mut().ok_or(ConnectError::NotConnected)?;

        debug!(command = %cmd, "sending device command");

        let start = Instant::now();

        let mut channel = session
            .channel_open_session()
            .await
            .map_err(|e| ConnectError::IoError(e.to_string()))?;

        channel
            .exec(true, cmd)
            .await
            .map_err(|e| ConnectError::IoError(e.to_string()))?;

        let mut status = -1;
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        loop {
            let msg = channel.wait().await;

            match msg {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        // stderr
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    status = exit_status.cast_signed();
                }
                Some(ChannelMsg::Eof) | None => break,
                _ => {}
            }
        }

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&stdout).to_string();
        let stderr = String::from_utf8_lossy(&stderr).to_string();

        debug!(
            command = %cmd,
            status = status,
            duration = ?duration,
            "device command completed"
        );

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
            duration,
        })
    }

    /// Disconnect from the device
    ///
    /// # Errors
    /// Returns `ConnectError::IoError` if disconnection fails
    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        let mut session_lock = self.session.lock().await;

        if let Some(session) = session_lock.take() {
            session
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
                .map_err(|e| ConnectError::IoError(e.to_string()))?;
            info!(host = %self.conn_info.host, "device session closed");
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceConnection for SshConnection {
    #[instrument(skip(self), fields(host = %self.conn_info.host))]
    async fn request(&self, cmd: &str) -> Result<CommandOutput, ConnectError> {
        match self.request_timeout {
            Some(deadline) => self.request_with_timeout(cmd, deadline).await,
            None => {
                self.connect().await?;
                self.execute_remote(cmd).await
            }
        }
    }

    #[instrument(skip(self), fields(host = %self.conn_info.host))]
    async fn request_with_timeout(
        &self,
        cmd: &str,
        timeout_duration: Duration,
    ) -> Result<CommandOutput, ConnectError> {
        let start = Instant::now();

        debug!(command = %cmd, timeout = ?timeout_duration, "requesting with deadline");

        // Ensure connection first (outside of timeout)
        self.connect().await?;

        let result = timeout(timeout_duration, self.execute_remote(cmd)).await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                error!(
                    command = %cmd,
                    timeout = ?timeout_duration,
                    elapsed = ?start.elapsed(),
                    "device command timed out"
                );
                Err(ConnectError::Timeout {
                    timeout: timeout_duration,
                })
            }
        }
    }

    fn is_connected(&self) -> bool {
        // Synchronous peek; the real state is only proven by using the session
        let session_opt = self.session.try_lock();
        session_opt.map(|s| s.is_some()).unwrap_or(false)
    }

    fn transport_name(&self) -> &'static str {
        "ssh"
    }
}

/// Builder for `SshConnection`
pub struct SshConnectionBuilder {
    conn_info: ConnectionInfo,
    key_source: KeySource,
}

impl SshConnectionBuilder {
    /// Create builder with required fields
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            conn_info: ConnectionInfo::new(host, user),
            key_source: KeySource::Agent,
        }
    }

    /// Set SSH key path
    #[must_use]
    pub fn with_key_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.key_source = KeySource::Path(path.into());
        self
    }

    /// Use SSH agent
    #[must_use]
    pub fn with_agent(mut self) -> Self {
        self.key_source = KeySource::Agent;
        self
    }

    /// Set key from environment variable (base64)
    #[must_use]
    pub fn with_env_key(mut self, var_name: impl Into<String>) -> Self {
        self.key_source = KeySource::Env(var_name.into());
        self
    }

    /// Set custom port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.conn_info.port = port;
        self
    }

    /// Build the connection
    ///
    /// # Errors
    /// Returns `ConnectError::KeyError` if key resolution fails
    pub fn build(self) -> Result<SshConnection, ConnectError> {
        SshConnection::new(self.conn_info, &self.key_source)
    }
}
