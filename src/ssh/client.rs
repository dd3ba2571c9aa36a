//! SSH Client implementation using russh

use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use russh::keys::key::PrivateKeyWithHashAlg;
use russh::keys::{HashAlg, PublicKey};
use russh::*;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::config::{AuthMethod, SshConfig};
use super::error::SshError;
use super::handle_owner::{spawn_handle_owner_task, HandleController};
use crate::forwarding::TunnelConn;

/// An authenticated SSH control channel.
///
/// `controller` opens channels through the tunnel. `forwarded` yields the
/// connections the server hands back for remote (`tcpip-forward`) forwards;
/// draining it is the job of an accept loop outside this crate.
pub struct SshTransport {
    pub controller: HandleController,
    pub forwarded: mpsc::UnboundedReceiver<TunnelConn>,
    pub server_addr: String,
}

pub struct SshClient {
    config: SshConfig,
}

impl SshClient {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// Connect, authenticate and hand the session to its owner task
    pub async fn connect(self) -> Result<SshTransport, SshError> {
        let addr = self.config.server_addr();

        info!("Connecting to SSH server at {}", addr);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| SshError::ConnectionFailed(format!("Failed to resolve address: {}", e)))?
            .next()
            .ok_or_else(|| SshError::ConnectionFailed("No address found".to_string()))?;

        let ssh_config = client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(Duration::from_secs(self.config.keepalive_interval_secs)),
            keepalive_max: 3,
            ..Default::default()
        };

        let (forwarded_tx, forwarded) = mpsc::unbounded_channel();
        let handler = ClientHandler::new(
            self.config.host.clone(),
            self.config.host_key_fingerprint.clone(),
            forwarded_tx,
        );

        let mut handle = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            client::connect(Arc::new(ssh_config), socket_addr, handler),
        )
        .await
        .map_err(|_| SshError::Timeout("Connection timed out".to_string()))??;

        debug!("SSH handshake completed");

        let authenticated = match &self.config.auth {
            AuthMethod::Password { password } => handle
                .authenticate_password(&self.config.username, password)
                .await
                .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?,
            AuthMethod::Key {
                key_path,
                passphrase,
            } => {
                let key = russh::keys::load_secret_key(key_path, passphrase.as_deref())?;
                let key_with_hash = PrivateKeyWithHashAlg::new(Arc::new(key), None);

                handle
                    .authenticate_publickey(&self.config.username, key_with_hash)
                    .await
                    .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?
            }
        };

        if !authenticated.success() {
            return Err(SshError::AuthenticationFailed(
                "Authentication rejected by server".to_string(),
            ));
        }

        info!("SSH authentication successful for {}@{}", self.config.username, addr);

        Ok(SshTransport {
            controller: spawn_handle_owner_task(handle, addr.clone()),
            forwarded,
            server_addr: addr,
        })
    }
}

/// Client handler for russh callbacks
///
/// Verifies the server key against an optional pinned fingerprint and
/// passes server-opened `forwarded-tcpip` channels on as connections.
pub struct ClientHandler {
    host: String,
    /// `None` accepts any key.
    expected_fingerprint: Option<String>,
    forwarded_tx: mpsc::UnboundedSender<TunnelConn>,
}

impl ClientHandler {
    pub fn new(
        host: String,
        expected_fingerprint: Option<String>,
        forwarded_tx: mpsc::UnboundedSender<TunnelConn>,
    ) -> Self {
        Self {
            host,
            expected_fingerprint,
            forwarded_tx,
        }
    }

    fn verify_fingerprint(&self, actual: &str) -> Result<bool, SshError> {
        match &self.expected_fingerprint {
            None => {
                warn!(
                    "No pinned host key for {}, accepting {}",
                    self.host, actual
                );
                Ok(true)
            }
            Some(expected) if expected == actual => {
                info!("Host key verified for {}", self.host);
                Ok(true)
            }
            Some(expected) => Err(SshError::HostKeyMismatch {
                host: self.host.clone(),
                expected: expected.clone(),
                actual: actual.to_string(),
            }),
        }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint(HashAlg::Sha256).to_string();
        self.verify_fingerprint(&fingerprint)
    }

    /// Called when someone connects to a port the server listens on for us.
    async fn server_channel_open_forwarded_tcpip(
        &mut self,
        channel: Channel<client::Msg>,
        connected_address: &str,
        connected_port: u32,
        originator_address: &str,
        originator_port: u32,
        _session: &mut client::Session,
    ) -> Result<(), Self::Error> {
        debug!(
            "Server opened forwarded-tcpip channel: {}:{} from {}:{}",
            connected_address, connected_port, originator_address, originator_port
        );

        let conn = TunnelConn::new(
            channel.into_stream(),
            format!("{}:{}", originator_address, originator_port),
        );
        if self.forwarded_tx.send(conn).is_err() {
            warn!(
                "No accept loop for forwarded connection on {}:{}, dropping it",
                connected_address, connected_port
            );
        }

        Ok(())
    }
}
