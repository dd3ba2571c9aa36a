//! Connection Forwarder
//!
//! Handles exactly one accepted connection per `forward()` call:
//!
//! 1. report the accept
//! 2. dial the opposite endpoint (through the tunnel for local forwards,
//!    directly for remote forwards)
//! 3. pump bytes both ways until both halves are done
//! 4. report the outcome and the final close
//!
//! Nothing escapes the call as an error; the state reporter is the only
//! place failures show up.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::ForwardConfig;
use super::conn::TunnelConn;
use super::dialer::{Dialer, NetDialer};
use super::direction::{DialVia, Direction, ForwardType};
use super::endpoint::Endpoint;
use super::error::{ForwardError, Side};
use super::pump::pump;
use super::state::{StateReporter, TunneledConnState};
use super::stats::{ForwardStats, ForwardStatsAtomic};

/// Forwards accepted connections for one tunnel
pub struct ConnectionForwarder {
    config: ForwardConfig,
    /// Dials through the SSH control channel
    tunnel_dialer: Arc<dyn Dialer>,
    /// Dials plain sockets from this host
    net_dialer: Arc<dyn Dialer>,
    reporter: Option<Arc<dyn StateReporter>>,
    /// Cancelled when the whole tunnel is being torn down
    lifetime: CancellationToken,
    stats: ForwardStatsAtomic,
}

impl ConnectionForwarder {
    pub fn new(config: &ForwardConfig, tunnel_dialer: Arc<dyn Dialer>) -> Self {
        Self {
            config: config.clone(),
            tunnel_dialer,
            net_dialer: Arc::new(NetDialer),
            reporter: None,
            lifetime: CancellationToken::new(),
            stats: ForwardStatsAtomic::new(),
        }
    }

    /// Replace the plain socket dialer
    pub fn with_net_dialer(mut self, net_dialer: Arc<dyn Dialer>) -> Self {
        self.net_dialer = net_dialer;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn StateReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Tie the forwarder to the tunnel's lifetime token
    pub fn with_lifetime(mut self, lifetime: CancellationToken) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn forward_type(&self) -> ForwardType {
        self.config.forward_type
    }

    pub fn config(&self) -> &ForwardConfig {
        &self.config
    }

    pub fn lifetime(&self) -> &CancellationToken {
        &self.lifetime
    }

    pub fn stats(&self) -> ForwardStats {
        self.stats.to_stats()
    }

    /// Forward one accepted connection until both directions are done.
    pub async fn forward(&self, from_conn: TunnelConn) {
        let from = from_conn.peer_addr().to_string();
        let conn_id = Uuid::new_v4();
        let _active = self.stats.track();

        let direction = Direction::resolve(self.config.forward_type);
        let (accepted_ep, dial_ep) = self.endpoints(&direction);

        self.report(TunneledConnState::accepted(
            &from,
            format!("accepted {} connection", accepted_ep.kind),
        ));

        let dialer = match direction.via {
            DialVia::Tunnel => &self.tunnel_dialer,
            DialVia::Network => &self.net_dialer,
        };

        let to_conn = match dialer.dial(dial_ep.kind, &dial_ep.address).await {
            Ok(conn) => conn,
            Err(source) => {
                self.stats.failed_dials.fetch_add(1, Ordering::Relaxed);
                let error = ForwardError::Dial {
                    side: direction.dialed,
                    kind: dial_ep.kind,
                    address: dial_ep.address.clone(),
                    source,
                };
                debug!(%conn_id, "{}", error);
                self.report(TunneledConnState::dial_failed(&from, error));
                close_accepted(from_conn).await;
                return;
            }
        };

        let descriptor = self.describe(&from);
        info!(%conn_id, "Forwarding {}", descriptor);
        self.report(TunneledConnState::established(&from, &descriptor));

        let conn_done = self.lifetime.child_token();
        let error = pump(from_conn, to_conn, &direction, &conn_done, &self.stats).await;
        // Both halves dropped their guards by now; this never waits.
        conn_done.cancelled().await;

        match error {
            Some(error) if self.lifetime.is_cancelled() => {
                debug!(%conn_id, "Ignoring copy error during tunnel shutdown: {}", error);
            }
            Some(error) => {
                self.report(TunneledConnState::closed_with_error(&from, error));
            }
            None => {}
        }

        debug!(%conn_id, "Connection closed: {}", descriptor);
        self.report(TunneledConnState::closed(&from, &descriptor));
    }

    /// (accepted side, side to dial)
    fn endpoints(&self, direction: &Direction) -> (&Endpoint, &Endpoint) {
        match direction.accepted {
            Side::Local => (&self.config.local, &self.config.remote),
            Side::Remote => (&self.config.remote, &self.config.local),
        }
    }

    /// `from -(kind)> local -(ssh)> server -(kind)> remote`
    fn describe(&self, from: &str) -> String {
        let ForwardConfig {
            local,
            remote,
            server,
            ..
        } = &self.config;
        format!(
            "{} -({})> {} -(ssh)> {} -({})> {}",
            from, local.kind, local.address, server.address, remote.kind, remote.address
        )
    }

    fn report(&self, state: TunneledConnState) {
        if let Some(reporter) = &self.reporter {
            reporter.on_state(self, &state);
        }
    }
}

async fn close_accepted(conn: TunnelConn) {
    let mut stream = conn.stream;
    let _ = stream.shutdown().await;
}
