//! Errors surfaced through the connection state stream

use std::fmt;

use thiserror::Error;

use super::endpoint::EndpointKind;
use crate::ssh::SshError;

/// Which side of the tunnel a dial went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Local => f.write_str("local"),
            Side::Remote => f.write_str("remote"),
        }
    }
}

/// Label of one half of the pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDirection {
    RemoteToLocal,
    LocalToRemote,
}

impl fmt::Display for CopyDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyDirection::RemoteToLocal => f.write_str("remote to local"),
            CopyDirection::LocalToRemote => f.write_str("local to remote"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ForwardError {
    /// The opposite side could not be dialed; terminal for the connection.
    #[error("{side} dial {kind} to {address} failed: {source}")]
    Dial {
        side: Side,
        kind: EndpointKind,
        address: String,
        #[source]
        source: SshError,
    },

    /// Read or write failure while pumping (never a clean end-of-stream).
    #[error("failed copying bytes from {direction}: {source}")]
    Copy {
        direction: CopyDirection,
        #[source]
        source: std::io::Error,
    },

    /// Not a `host:port` (or `[v6]:port`) pair
    #[error("invalid tcp address: {0}")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_error_message() {
        let err = ForwardError::Dial {
            side: Side::Remote,
            kind: EndpointKind::Tcp,
            address: "10.0.0.1:9999".into(),
            source: SshError::ChannelError("Connection refused".into()),
        };
        assert_eq!(
            err.to_string(),
            "remote dial tcp to 10.0.0.1:9999 failed: Channel error: Connection refused"
        );
    }

    #[test]
    fn test_copy_error_message() {
        let err = ForwardError::Copy {
            direction: CopyDirection::LocalToRemote,
            source: std::io::Error::from(std::io::ErrorKind::BrokenPipe),
        };
        assert!(err
            .to_string()
            .starts_with("failed copying bytes from local to remote: "));
    }
}
