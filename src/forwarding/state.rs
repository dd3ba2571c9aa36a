//! Connection State Notifications
//!
//! Every forwarded connection produces an ordered stream of
//! `TunneledConnState` values:
//!
//! ```text
//! Accepted -> DialFailed
//! Accepted -> Established -> [ClosedWithError] -> ClosedFinal
//! ```
//!
//! They are delivered synchronously to a `StateReporter`.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::error::ForwardError;
use super::forwarder::ConnectionForwarder;

/// State of one connection made through the tunnel
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TunneledConnState {
    /// Address that initiated the connection
    pub from: String,
    /// Human-readable status message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Set only on failure
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<Arc<ForwardError>>,
    /// Both sides connected and piping has begun
    pub ready: bool,
    /// The connection has terminated
    pub closed: bool,
}

fn serialize_error<S: Serializer>(
    error: &Option<Arc<ForwardError>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Position of a state in the per-connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStateKind {
    Accepted,
    DialFailed,
    Established,
    ClosedWithError,
    ClosedFinal,
}

impl ConnStateKind {
    /// No further state follows for this connection
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnStateKind::DialFailed | ConnStateKind::ClosedFinal)
    }
}

impl TunneledConnState {
    pub(crate) fn accepted(from: &str, info: String) -> Self {
        Self {
            from: from.to_string(),
            info: Some(info),
            ..Default::default()
        }
    }

    pub(crate) fn dial_failed(from: &str, error: ForwardError) -> Self {
        Self {
            from: from.to_string(),
            error: Some(Arc::new(error)),
            ..Default::default()
        }
    }

    pub(crate) fn established(from: &str, descriptor: &str) -> Self {
        Self {
            from: from.to_string(),
            info: Some(format!("connection established: {}", descriptor)),
            ready: true,
            ..Default::default()
        }
    }

    pub(crate) fn closed_with_error(from: &str, error: ForwardError) -> Self {
        Self {
            from: from.to_string(),
            error: Some(Arc::new(error)),
            closed: true,
            ..Default::default()
        }
    }

    pub(crate) fn closed(from: &str, descriptor: &str) -> Self {
        Self {
            from: from.to_string(),
            info: Some(format!("connection closed: {}", descriptor)),
            closed: true,
            ..Default::default()
        }
    }

    /// Classify this state within the lifecycle
    pub fn kind(&self) -> ConnStateKind {
        match (self.ready, self.closed, self.error.is_some()) {
            (true, _, _) => ConnStateKind::Established,
            (false, true, true) => ConnStateKind::ClosedWithError,
            (false, true, false) => ConnStateKind::ClosedFinal,
            (false, false, true) => ConnStateKind::DialFailed,
            (false, false, false) => ConnStateKind::Accepted,
        }
    }
}

impl fmt::Display for TunneledConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.from)?;
        if let Some(info) = &self.info {
            f.write_str(info)?;
        }
        if let Some(error) = &self.error {
            write!(f, "Error: {}", error)?;
        }
        Ok(())
    }
}

/// Observer for connection states.
///
/// Called synchronously on the forwarding path, in order for a given
/// connection. Different connections may call it concurrently, so
/// implementations must be reentrant and must not block for long.
pub trait StateReporter: Send + Sync {
    fn on_state(&self, forwarder: &ConnectionForwarder, state: &TunneledConnState);
}

impl<F> StateReporter for F
where
    F: Fn(&ConnectionForwarder, &TunneledConnState) + Send + Sync,
{
    fn on_state(&self, forwarder: &ConnectionForwarder, state: &TunneledConnState) {
        self(forwarder, state)
    }
}

/// Forwards states into an unbounded channel (for UIs and tests)
#[derive(Clone)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<TunneledConnState>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TunneledConnState>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StateReporter for ChannelReporter {
    fn on_state(&self, _forwarder: &ConnectionForwarder, state: &TunneledConnState) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(state.clone());
    }
}

impl fmt::Debug for ChannelReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReporter")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Logs every state through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StateReporter for LogReporter {
    fn on_state(&self, forwarder: &ConnectionForwarder, state: &TunneledConnState) {
        if state.error.is_some() {
            warn!(forward = ?forwarder.forward_type(), "{}", state);
        } else {
            info!(forward = ?forwarder.forward_type(), "{}", state);
        }
    }
}
