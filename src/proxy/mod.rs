//! Forward proxy core.
//!
//! # Data Flow
//! ```text
//! Listener
//!     → server.rs (one task per connection)
//!     → orchestrator.rs (parse → connect → forward → relay)
//!     → http (request head), upstream (target connection)
//! ```

pub mod orchestrator;
pub mod server;

pub use orchestrator::{serve_connection, Outcome, ProxySettings};
pub use server::ProxyServer;
