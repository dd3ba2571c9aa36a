//! Direction resolution for a forward type

use serde::{Deserialize, Serialize};

use super::error::{CopyDirection, Side};

/// Type of port forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardType {
    /// Accept locally, dial the remote endpoint through the tunnel (-L)
    Local,
    /// Accept on the server, dial the local endpoint directly (-R)
    Remote,
}

/// Which dialer reaches the side being dialed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialVia {
    /// Through the SSH control channel
    Tunnel,
    /// Plain socket from this host
    Network,
}

/// Everything that differs between local and remote forwarding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    /// Side the accepted connection came in on
    pub accepted: Side,
    /// Side that gets dialed
    pub dialed: Side,
    pub via: DialVia,
    /// Label for bytes copied accepted -> dialed
    pub accepted_to_dialed: CopyDirection,
    /// Label for bytes copied dialed -> accepted
    pub dialed_to_accepted: CopyDirection,
}

impl Direction {
    pub fn resolve(forward_type: ForwardType) -> Self {
        match forward_type {
            ForwardType::Local => Self {
                accepted: Side::Local,
                dialed: Side::Remote,
                via: DialVia::Tunnel,
                accepted_to_dialed: CopyDirection::RemoteToLocal,
                dialed_to_accepted: CopyDirection::LocalToRemote,
            },
            ForwardType::Remote => Self {
                accepted: Side::Remote,
                dialed: Side::Local,
                via: DialVia::Network,
                accepted_to_dialed: CopyDirection::LocalToRemote,
                dialed_to_accepted: CopyDirection::RemoteToLocal,
            },
        }
    }
}
