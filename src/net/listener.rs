//! Client-facing TCP listener with bounded admission.
//!
//! # Responsibilities
//! - Bind the proxy port on the configured host
//! - Admit at most `max_connections` clients at once
//! - Report accept failures to the caller, which keeps listening

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Failures of the client-facing socket.
#[derive(Debug)]
pub enum ListenerError {
    /// The proxy port could not be bound.
    Bind(io::Error),
    /// A single accept failed; the socket remains usable.
    Accept(io::Error),
    /// The admission semaphore was closed.
    LimitClosed,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "cannot bind proxy port: {}", e),
            ListenerError::Accept(e) => write!(f, "cannot accept client: {}", e),
            ListenerError::LimitClosed => write!(f, "client admission closed"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Accepts clients, holding one admission slot per live connection.
///
/// Once every slot is taken, `accept` waits for a connection to finish
/// before taking the next client off the backlog.
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl Listener {
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let socket = TcpListener::bind(config.bind_address())
            .await
            .map_err(ListenerError::Bind)?;
        let bound = socket.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %bound,
            max_connections = config.max_connections,
            "Proxy port bound"
        );

        Ok(Self {
            socket,
            slots: Arc::new(Semaphore::new(config.max_connections)),
            capacity: config.max_connections,
        })
    }

    /// Take a slot, then the next client.
    ///
    /// The returned permit must live as long as the connection is served.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::LimitClosed)?;

        let (stream, peer) = self.socket.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(
            peer = %peer,
            free_slots = self.slots.available_permits(),
            "Client accepted"
        );

        Ok((stream, peer, ConnectionPermit { _slot: slot }))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Slots not currently held by a connection.
    pub fn available_permits(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.capacity
    }
}

/// An admission slot, released on drop (including when the connection task panics).
#[derive(Debug)]
pub struct ConnectionPermit {
    _slot: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback(max_connections: usize) -> ListenerConfig {
        ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections,
        }
    }

    #[tokio::test]
    async fn each_client_holds_a_slot() {
        let listener = Listener::bind(&loopback(2)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert_eq!(listener.max_connections(), 2);

        let _client = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_permits(), 1);

        drop(permit);
        assert_eq!(listener.available_permits(), 2);
    }

    #[tokio::test]
    async fn full_listener_waits_for_a_free_slot() {
        let listener = Listener::bind(&loopback(1)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _first = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();

        let _second = TcpStream::connect(addr).await.unwrap();
        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err());

        drop(permit);
        assert!(listener.accept().await.is_ok());
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let first = Listener::bind(&loopback(1)).await.unwrap();
        let taken = ListenerConfig {
            port: first.local_addr().unwrap().port(),
            ..loopback(1)
        };
        assert!(matches!(Listener::bind(&taken).await, Err(ListenerError::Bind(_))));
    }
}
