//! Static tunnel configuration read by the forwarder

use serde::{Deserialize, Serialize};

use super::direction::ForwardType;
use super::endpoint::Endpoint;

/// Direction and endpoints of one tunnel
///
/// `server` is only used to describe connections; dialing through the
/// tunnel goes through the dialer handed to the forwarder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardConfig {
    pub forward_type: ForwardType,
    pub local: Endpoint,
    pub remote: Endpoint,
    pub server: Endpoint,
}

impl ForwardConfig {
    /// `ssh -L local:remote server`
    pub fn local(local: Endpoint, remote: Endpoint, server: Endpoint) -> Self {
        Self {
            forward_type: ForwardType::Local,
            local,
            remote,
            server,
        }
    }

    /// `ssh -R remote:local server`
    pub fn remote(local: Endpoint, remote: Endpoint, server: Endpoint) -> Self {
        Self {
            forward_type: ForwardType::Remote,
            local,
            remote,
            server,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarding::EndpointKind;

    #[test]
    fn test_deserialize() {
        let config: ForwardConfig = serde_json::from_str(
            r#"{
                "forward_type": "local",
                "local": {"kind": "tcp", "address": "127.0.0.1:15432"},
                "remote": {"kind": "tcp", "address": "db.internal:5432"},
                "server": {"kind": "tcp", "address": "bastion:22"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.forward_type, ForwardType::Local);
        assert_eq!(config.remote.kind, EndpointKind::Tcp);
        assert_eq!(config.server.address, "bastion:22");
    }
}
