//! Per-forwarder counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Snapshot of a forwarder's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardStats {
    /// Connections handed to the forwarder
    pub connection_count: u64,
    /// Connections currently inside `forward()`
    pub active_connections: u64,
    /// Dials of the opposite side that failed
    pub failed_dials: u64,
    /// Bytes copied accepted -> dialed
    pub bytes_sent: u64,
    /// Bytes copied dialed -> accepted
    pub bytes_received: u64,
}

/// Lock-free counters updated from the pump halves
#[derive(Debug, Default)]
pub struct ForwardStatsAtomic {
    pub connection_count: AtomicU64,
    pub active_connections: AtomicU64,
    pub failed_dials: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
}

impl ForwardStatsAtomic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_stats(&self) -> ForwardStats {
        ForwardStats {
            connection_count: self.connection_count.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            failed_dials: self.failed_dials.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }

    /// Count a connection in; the guard counts it out when dropped
    pub(crate) fn track(&self) -> ActiveGuard<'_> {
        self.connection_count.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        ActiveGuard { stats: self }
    }
}

pub(crate) struct ActiveGuard<'a> {
    stats: &'a ForwardStatsAtomic,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.stats.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_guard() {
        let stats = ForwardStatsAtomic::new();
        {
            let _a = stats.track();
            let _b = stats.track();
            assert_eq!(stats.to_stats().active_connections, 2);
        }
        let snapshot = stats.to_stats();
        assert_eq!(snapshot.connection_count, 2);
        assert_eq!(snapshot.active_connections, 0);
    }
}
