//! Accept loop for the forward proxy.
//!
//! # Responsibilities
//! - Accept client connections through the bounded listener
//! - Run every connection in its own task with its own span
//! - Log and count each connection's outcome
//! - Stop accepting on shutdown and drain live connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::ProxyConfig;
use crate::net::{ConnectionPermit, ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::proxy::orchestrator::{serve_connection, Outcome, ProxySettings};
use crate::resilience::timeouts::from_secs;

/// Pause after a failed accept.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// The forward proxy server.
pub struct ProxyServer {
    settings: Arc<ProxySettings>,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl ProxyServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            settings: Arc::new(ProxySettings::from(config)),
            tracker: ConnectionTracker::new(),
            shutdown_grace: from_secs(config.timeouts.shutdown_grace_secs),
        }
    }

    /// Tracker of live connections.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(address = %addr, "Proxy server accepting connections");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                    Err(ListenerError::LimitClosed) => return Err(ListenerError::LimitClosed),
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        let remaining = self.tracker.active_count();
        if remaining > 0 {
            tracing::info!(connections = remaining, "Draining connections");
            if !self.tracker.wait_idle(self.shutdown_grace).await {
                tracing::warn!(
                    connections = self.tracker.active_count(),
                    "Shutdown grace period elapsed with connections still open"
                );
            }
        }

        tracing::info!("Proxy server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let guard = self.tracker.track();
        let settings = Arc::clone(&self.settings);
        metrics::record_connection();

        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer);
        tokio::spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                let started = Instant::now();
                let outcome = serve_connection(stream, &settings).await;
                report(&outcome, started.elapsed());
            }
            .instrument(span),
        );
    }
}

/// Log a finished connection and update counters.
fn report(outcome: &Outcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        Outcome::ClientClosed => {
            tracing::debug!(elapsed_ms, "Client closed without a request");
        }
        Outcome::BadRequest(error) => {
            tracing::info!(error = %error, elapsed_ms, "Rejected request");
        }
        Outcome::ClientTimeout(timeout) => {
            tracing::info!(error = %timeout, elapsed_ms, "Client request head timed out");
        }
        Outcome::UpstreamFailed { target, error } => {
            metrics::record_upstream_error(error.kind());
            tracing::warn!(
                origin = %target,
                kind = error.kind(),
                error = %error,
                elapsed_ms,
                "Target request failed"
            );
        }
        Outcome::Relayed { target, bytes } => {
            metrics::record_response_bytes(*bytes);
            tracing::info!(origin = %target, bytes, elapsed_ms, "Response relayed");
        }
    }
    metrics::record_outcome(outcome.label());
}
