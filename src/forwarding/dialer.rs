//! Dial capability consumed by the forwarder

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::conn::TunnelConn;
use super::endpoint::EndpointKind;
use crate::ssh::SshError;

/// Opens a connection to `address` using the transport named by `kind`.
///
/// Implemented by [`NetDialer`] for plain sockets and by
/// [`SshDialer`](crate::ssh::SshDialer) for channels through the tunnel.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, kind: EndpointKind, address: &str) -> Result<TunnelConn, SshError>;
}

/// Plain network dialer
#[derive(Debug, Clone, Copy, Default)]
pub struct NetDialer;

#[async_trait]
impl Dialer for NetDialer {
    async fn dial(&self, kind: EndpointKind, address: &str) -> Result<TunnelConn, SshError> {
        match kind {
            EndpointKind::Tcp => {
                let stream = TcpStream::connect(address).await?;
                // Disable Nagle's algorithm for low-latency forwarding
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Failed to set TCP_NODELAY: {}", e);
                }
                debug!("Dialed tcp {}", address);
                Ok(TunnelConn::new(stream, address))
            }
            #[cfg(unix)]
            EndpointKind::Unix => {
                let stream = tokio::net::UnixStream::connect(address).await?;
                debug!("Dialed unix {}", address);
                Ok(TunnelConn::new(stream, address))
            }
            #[cfg(not(unix))]
            EndpointKind::Unix => Err(SshError::UnsupportedKind(kind.to_string())),
        }
    }
}
