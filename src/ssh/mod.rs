//! SSH module - the authenticated control channel behind the tunnel
//!
//! Built on russh. The forwarding core never touches the SSH session
//! directly: it only sees `SshDialer`, which asks the handle owner task
//! to open `direct-tcpip` / `direct-streamlocal` channels.

mod client;
mod config;
mod dialer;
mod error;
mod handle_owner;

pub use client::{ClientHandler, SshClient, SshTransport};
pub use config::{AuthMethod, SshConfig};
pub use dialer::SshDialer;
pub use error::SshError;
pub use handle_owner::{spawn_handle_owner_task, HandleCommand, HandleController};
