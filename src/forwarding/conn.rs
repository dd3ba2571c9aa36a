//! Connections handed to and produced by the forwarder

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

/// Any bidirectional byte stream the pump can drive
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// A live connection: TCP socket, unix socket or SSH channel
pub struct TunnelConn {
    pub(crate) stream: BoxedStream,
    peer_addr: String,
}

impl TunnelConn {
    pub fn new<S: AsyncStream + 'static>(stream: S, peer_addr: impl Into<String>) -> Self {
        Self {
            stream: Box::new(stream),
            peer_addr: peer_addr.into(),
        }
    }

    /// Address of the peer that opened (or was dialed for) this connection
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl fmt::Debug for TunnelConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConn")
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

/// Close signal for one connection shared by both pump halves.
///
/// Closing wakes whoever is blocked reading the connection. Closing again
/// is a no-op.
#[derive(Clone, Default)]
pub(crate) struct Closer {
    token: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl Closer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that actually closed it.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub(crate) async fn closed(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let closer = Closer::new();
        assert!(closer.close());
        assert!(!closer.close());
        // Already closed: resolves immediately
        closer.closed().await;
    }

    #[tokio::test]
    async fn test_close_wakes_waiter() {
        let closer = Closer::new();
        let waiter = tokio::spawn({
            let closer = closer.clone();
            async move { closer.closed().await }
        });
        closer.close();
        waiter.await.unwrap();
    }
}
