//! HTTP/1.x Forward Proxy Library
//!
//! Accepts a client's request, validates it, resolves the origin server,
//! rewrites the head so it is safe to forward (HTTP/1.0, mandatory headers,
//! `Connection: close`) and relays the origin's response back.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use lifecycle::Shutdown;
pub use proxy::ProxyServer;
