//! Tunneled dialer: opens logical connections through the SSH control channel.

use async_trait::async_trait;
use tracing::debug;

use super::error::SshError;
use super::handle_owner::HandleController;
use crate::forwarding::{split_host_port, Dialer, EndpointKind, TunnelConn};

/// Originator reported to the server for direct-tcpip channels.
const ORIGINATOR_HOST: &str = "127.0.0.1";

/// Dials through the SSH server (`direct-tcpip` / `direct-streamlocal`).
#[derive(Clone)]
pub struct SshDialer {
    controller: HandleController,
}

impl SshDialer {
    pub fn new(controller: HandleController) -> Self {
        Self { controller }
    }
}

#[async_trait]
impl Dialer for SshDialer {
    async fn dial(&self, kind: EndpointKind, address: &str) -> Result<TunnelConn, SshError> {
        let channel = match kind {
            EndpointKind::Tcp => {
                let (host, port) = split_host_port(address)
                    .map_err(|e| SshError::ConnectionFailed(e.to_string()))?;
                self.controller
                    .open_direct_tcpip(host, u32::from(port), ORIGINATOR_HOST, 0)
                    .await?
            }
            EndpointKind::Unix => self.controller.open_direct_streamlocal(address).await?,
        };

        debug!("Opened {} channel to {} through the tunnel", kind, address);
        Ok(TunnelConn::new(channel.into_stream(), address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::HandleCommand;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_tcp_dial_sends_direct_tcpip() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);
        let dialer = SshDialer::new(HandleController::new(cmd_tx));

        let dial = tokio::spawn(async move { dialer.dial(EndpointKind::Tcp, "db.internal:5432").await });

        match cmd_rx.recv().await {
            Some(HandleCommand::ChannelOpenDirectTcpip {
                host,
                port,
                reply_tx,
                ..
            }) => {
                assert_eq!(host, "db.internal");
                assert_eq!(port, 5432);
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            _ => panic!("expected a direct-tcpip request"),
        }

        let err = dial.await.unwrap().err().unwrap();
        assert!(matches!(err, SshError::ChannelError(_)));
    }

    #[tokio::test]
    async fn test_unix_dial_sends_direct_streamlocal() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);
        let dialer = SshDialer::new(HandleController::new(cmd_tx));

        let dial =
            tokio::spawn(async move { dialer.dial(EndpointKind::Unix, "/run/docker.sock").await });

        match cmd_rx.recv().await {
            Some(HandleCommand::ChannelOpenDirectStreamlocal { socket_path, .. }) => {
                assert_eq!(socket_path, "/run/docker.sock");
            }
            _ => panic!("expected a direct-streamlocal request"),
        }

        // reply_tx dropped without answer
        assert!(matches!(
            dial.await.unwrap().err().unwrap(),
            SshError::Disconnected
        ));
    }

    #[tokio::test]
    async fn test_tcp_dial_rejects_missing_port() {
        let (cmd_tx, _cmd_rx) = mpsc::channel(4);
        let dialer = SshDialer::new(HandleController::new(cmd_tx));

        let err = dialer.dial(EndpointKind::Tcp, "db.internal").await.err().unwrap();
        assert!(matches!(err, SshError::ConnectionFailed(_)));
        assert_eq!(
            err.to_string(),
            "Connection failed: invalid tcp address: db.internal"
        );
    }
}
