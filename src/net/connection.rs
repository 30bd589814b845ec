//! Per-connection identity and the live-connection count.
//!
//! # Responsibilities
//! - Number client connections so their log events can be told apart
//! - Count connections still being served, for the drain at shutdown
//! - Keep the `proxy_active_connections` gauge in step with that count

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::observability::metrics;

/// Source of connection ids; only uniqueness matters, so `Relaxed` suffices.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier attached to a client connection's span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Live {
    count: AtomicU64,
    drained: Notify,
}

/// Counts client connections that are still being served.
///
/// Cloning shares the count.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    live: Arc<Live>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. It stays counted until the guard is dropped.
    pub fn track(&self) -> ConnectionGuard {
        let now = self.live.count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(now);
        ConnectionGuard {
            live: Arc::clone(&self.live),
            id: ConnectionId::next(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.live.count.load(Ordering::SeqCst)
    }

    /// Wait for the count to reach zero, at most `grace`.
    ///
    /// Returns `false` if connections were still open when `grace` ran out.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.live.drained.notified();
                if self.active_count() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

/// Keeps one connection counted while it is alive.
#[derive(Debug)]
pub struct ConnectionGuard {
    live: Arc<Live>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let now = self.live.count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_connections(now);
        if now == 0 {
            self.live.drained.notify_waiters();
        }
        tracing::trace!(connection_id = %self.id, "Connection released");
    }
}
