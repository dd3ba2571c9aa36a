//! sshtun - per-connection forwarding for SSH tunnels
//!
//! `forwarding` handles one accepted connection at a time for local and
//! remote forwards. `ssh` provides the russh-backed control channel that
//! local forwards dial through.

pub mod forwarding;
pub mod ssh;

pub use forwarding::{
    ConnectionForwarder, Dialer, Endpoint, EndpointKind, ForwardConfig, ForwardError,
    ForwardType, NetDialer, StateReporter, TunnelConn, TunneledConnState,
};
pub use ssh::{SshClient, SshConfig, SshDialer, SshError};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging
///
/// `RUST_LOG` overrides the default `info` filter. Calling this again after
/// a subscriber is installed does nothing.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
