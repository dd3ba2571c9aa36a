//! Handle Owner Task
//!
//! Only one task owns the `Handle<ClientHandler>`. Dialers and remote
//! forward requests talk to it through a cloneable `HandleController`
//! which sends commands over an mpsc channel, so no lock is ever held
//! across an `.await` on the SSH handle.
//!
//! ```ignore
//! let controller = spawn_handle_owner_task(handle, "bastion:22".into());
//! let channel = controller.open_direct_tcpip("10.0.0.1", 5432, "127.0.0.1", 0).await?;
//! ```

use russh::client::{Handle, Msg};
use russh::Channel;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::client::ClientHandler;
use super::error::SshError;

/// Commands sent to the Handle Owner Task
pub enum HandleCommand {
    /// Open a direct-tcpip channel (tcp endpoints)
    ChannelOpenDirectTcpip {
        host: String,
        port: u32,
        originator_host: String,
        originator_port: u32,
        reply_tx: oneshot::Sender<Result<Channel<Msg>, russh::Error>>,
    },

    /// Open a direct-streamlocal@openssh.com channel (unix socket endpoints)
    ChannelOpenDirectStreamlocal {
        socket_path: String,
        reply_tx: oneshot::Sender<Result<Channel<Msg>, russh::Error>>,
    },

    /// Request remote forward (tcpip-forward)
    TcpipForward {
        address: String,
        port: u32,
        reply_tx: oneshot::Sender<Result<u32, russh::Error>>,
    },

    /// Cancel remote forward
    CancelTcpipForward {
        address: String,
        port: u32,
        reply_tx: oneshot::Sender<Result<(), russh::Error>>,
    },

    /// Disconnect the SSH connection
    Disconnect,
}

/// Controller for sending commands to the Handle Owner Task
///
/// Cloning is cheap (it copies the sender). Anything holding a controller
/// can open channels through the tunnel, so keep it in-process.
#[derive(Clone)]
pub struct HandleController {
    cmd_tx: mpsc::Sender<HandleCommand>,
}

impl HandleController {
    /// Create a controller around an existing command sender.
    ///
    /// Outside tests, get one from `spawn_handle_owner_task`.
    pub fn new(cmd_tx: mpsc::Sender<HandleCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Open a direct-tcpip channel to `host:port` on the far side of the tunnel
    pub async fn open_direct_tcpip(
        &self,
        host: &str,
        port: u32,
        originator_host: &str,
        originator_port: u32,
    ) -> Result<Channel<Msg>, SshError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(HandleCommand::ChannelOpenDirectTcpip {
                host: host.to_string(),
                port,
                originator_host: originator_host.to_string(),
                originator_port,
                reply_tx,
            })
            .await
            .map_err(|_| SshError::Disconnected)?;
        reply_rx
            .await
            .map_err(|_| SshError::Disconnected)?
            .map_err(|e| SshError::ChannelError(e.to_string()))
    }

    /// Open a channel to a unix socket on the far side of the tunnel
    pub async fn open_direct_streamlocal(
        &self,
        socket_path: &str,
    ) -> Result<Channel<Msg>, SshError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(HandleCommand::ChannelOpenDirectStreamlocal {
                socket_path: socket_path.to_string(),
                reply_tx,
            })
            .await
            .map_err(|_| SshError::Disconnected)?;
        reply_rx
            .await
            .map_err(|_| SshError::Disconnected)?
            .map_err(|e| SshError::ChannelError(e.to_string()))
    }

    /// Request remote port forward (tcpip-forward)
    ///
    /// Returns the actual bound port (may differ if requested port was 0)
    pub async fn tcpip_forward(&self, address: &str, port: u32) -> Result<u32, SshError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(HandleCommand::TcpipForward {
                address: address.to_string(),
                port,
                reply_tx,
            })
            .await
            .map_err(|_| SshError::Disconnected)?;
        reply_rx
            .await
            .map_err(|_| SshError::Disconnected)?
            .map_err(|e| SshError::ConnectionFailed(e.to_string()))
    }

    /// Cancel a remote port forward
    pub async fn cancel_tcpip_forward(&self, address: &str, port: u32) -> Result<(), SshError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(HandleCommand::CancelTcpipForward {
                address: address.to_string(),
                port,
                reply_tx,
            })
            .await
            .map_err(|_| SshError::Disconnected)?;
        reply_rx
            .await
            .map_err(|_| SshError::Disconnected)?
            .map_err(|e| SshError::ConnectionFailed(e.to_string()))
    }

    /// Disconnect the SSH connection
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(HandleCommand::Disconnect).await;
    }

    /// Check if the Handle Owner Task is still running
    pub fn is_connected(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}

/// Spawn the Handle Owner Task
///
/// Consumes the Handle and returns a controller for sending commands.
/// `label` only appears in logs.
pub fn spawn_handle_owner_task(handle: Handle<ClientHandler>, label: String) -> HandleController {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<HandleCommand>(64);

    tokio::spawn(async move {
        let mut handle = handle; // sole owner from here on

        info!("Handle owner task started for {}", label);

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                HandleCommand::ChannelOpenDirectTcpip {
                    host,
                    port,
                    originator_host,
                    originator_port,
                    reply_tx,
                } => {
                    debug!("Opening direct-tcpip channel to {}:{}", host, port);
                    let result = handle
                        .channel_open_direct_tcpip(&host, port, &originator_host, originator_port)
                        .await;
                    if reply_tx.send(result).is_err() {
                        warn!("Caller dropped before receiving direct_tcpip result");
                    }
                }

                HandleCommand::ChannelOpenDirectStreamlocal {
                    socket_path,
                    reply_tx,
                } => {
                    debug!("Opening direct-streamlocal channel to {}", socket_path);
                    let result = handle.channel_open_direct_streamlocal(socket_path).await;
                    if reply_tx.send(result).is_err() {
                        warn!("Caller dropped before receiving direct_streamlocal result");
                    }
                }

                HandleCommand::TcpipForward {
                    address,
                    port,
                    reply_tx,
                } => {
                    let result = handle.tcpip_forward(&address, port).await;
                    match &result {
                        Ok(bound_port) => {
                            let bound_port = *bound_port;
                            if reply_tx.send(result).is_err() {
                                // Nobody will ever cancel it otherwise.
                                warn!(
                                    "Caller dropped after tcpip_forward succeeded. \
                                     Cancelling orphaned forward {}:{}",
                                    address, bound_port
                                );
                                let _ = handle.cancel_tcpip_forward(&address, bound_port).await;
                            }
                        }
                        Err(_) => {
                            let _ = reply_tx.send(result);
                        }
                    }
                }

                HandleCommand::CancelTcpipForward {
                    address,
                    port,
                    reply_tx,
                } => {
                    let result = handle.cancel_tcpip_forward(&address, port).await;
                    if reply_tx.send(result).is_err() {
                        warn!("Caller dropped before receiving cancel_tcpip_forward result");
                    }
                }

                HandleCommand::Disconnect => {
                    info!("Disconnect requested for {}", label);
                    break;
                }
            }
        }

        drain_pending_commands(&mut cmd_rx);

        let _ = handle
            .disconnect(russh::Disconnect::ByApplication, "Tunnel closed", "en")
            .await;
        info!("Handle owner task terminated for {}", label);
    });

    HandleController::new(cmd_tx)
}

/// Drain all pending commands, returning Disconnected error to each
fn drain_pending_commands(cmd_rx: &mut mpsc::Receiver<HandleCommand>) {
    cmd_rx.close();

    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            HandleCommand::ChannelOpenDirectTcpip { reply_tx, .. } => {
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            HandleCommand::ChannelOpenDirectStreamlocal { reply_tx, .. } => {
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            HandleCommand::TcpipForward { reply_tx, .. } => {
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            HandleCommand::CancelTcpipForward { reply_tx, .. } => {
                let _ = reply_tx.send(Err(russh::Error::Disconnect));
            }
            HandleCommand::Disconnect => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_owner_reports_disconnected() {
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        drop(cmd_rx);
        let controller = HandleController::new(cmd_tx);

        assert!(!controller.is_connected());
        let err = controller
            .open_direct_tcpip("10.0.0.1", 22, "127.0.0.1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, SshError::Disconnected));
    }

    #[tokio::test]
    async fn test_drained_commands_get_disconnect_errors() {
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);
        let controller = HandleController::new(cmd_tx);

        let open = tokio::spawn({
            let controller = controller.clone();
            async move { controller.open_direct_streamlocal("/run/app.sock").await }
        });
        let forward = tokio::spawn({
            let controller = controller.clone();
            async move { controller.tcpip_forward("0.0.0.0", 9000).await }
        });

        // Wait until both commands are queued, then drain like the owner does on exit.
        while cmd_rx.len() < 2 {
            tokio::task::yield_now().await;
        }
        drain_pending_commands(&mut cmd_rx);

        assert!(matches!(
            open.await.unwrap().unwrap_err(),
            SshError::ChannelError(_)
        ));
        assert!(matches!(
            forward.await.unwrap().unwrap_err(),
            SshError::ConnectionFailed(_)
        ));
    }
}
