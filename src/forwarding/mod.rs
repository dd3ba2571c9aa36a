//! Port Forwarding Module
//!
//! Per-connection forwarding for local (-L) and remote (-R) SSH tunnels.
//! The listener lives elsewhere; this module takes one accepted connection,
//! dials the other side and pipes bytes both ways until it is done.

mod config;
mod conn;
mod dialer;
mod direction;
mod endpoint;
mod error;
mod forwarder;
mod pump;
mod state;
mod stats;

pub use config::ForwardConfig;
pub use conn::{AsyncStream, BoxedStream, TunnelConn};
pub use dialer::{Dialer, NetDialer};
pub use direction::{DialVia, Direction, ForwardType};
pub use endpoint::{split_host_port, Endpoint, EndpointKind};
pub use error::{CopyDirection, ForwardError, Side};
pub use forwarder::ConnectionForwarder;
pub use state::{ChannelReporter, ConnStateKind, LogReporter, StateReporter, TunneledConnState};
pub use stats::{ForwardStats, ForwardStatsAtomic};
