//! Dial targets for both sides of a tunnel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ForwardError;

/// Transport kind of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// `host:port`
    Tcp,
    /// Filesystem path of a unix domain socket
    Unix,
}

impl EndpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointKind::Tcp => "tcp",
            EndpointKind::Unix => "unix",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dial target: transport kind plus address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub kind: EndpointKind,
    pub address: String,
}

impl Endpoint {
    pub fn new(kind: EndpointKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
        }
    }

    /// TCP endpoint; IPv6 hosts are bracketed
    pub fn tcp(host: &str, port: u16) -> Self {
        let address = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };
        Self::new(EndpointKind::Tcp, address)
    }

    pub fn unix(path: impl Into<String>) -> Self {
        Self::new(EndpointKind::Unix, path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.kind, self.address)
    }
}

/// Accepts `tcp://host:port`, `unix:///path/to.sock` and bare `host:port`.
impl FromStr for Endpoint {
    type Err = ForwardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, address) = match s.split_once("://") {
            Some(("tcp", rest)) => (EndpointKind::Tcp, rest),
            Some(("unix", rest)) => (EndpointKind::Unix, rest),
            Some((scheme, _)) => {
                return Err(ForwardError::Config(format!(
                    "unsupported endpoint scheme '{}' in '{}'",
                    scheme, s
                )))
            }
            None => (EndpointKind::Tcp, s),
        };

        if address.is_empty() {
            return Err(ForwardError::Config(format!("empty address in '{}'", s)));
        }
        if kind == EndpointKind::Tcp {
            split_host_port(address)?;
        }

        Ok(Self::new(kind, address))
    }
}

/// Split `host:port` (or `[v6]:port`) into its parts
pub fn split_host_port(address: &str) -> Result<(&str, u16), ForwardError> {
    let invalid = || ForwardError::InvalidAddress(address.to_string());

    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let port = port.parse::<u16>().map_err(|_| invalid())?;

    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host, port))
}
