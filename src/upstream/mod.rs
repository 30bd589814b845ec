//! Target server side of a proxied connection.
//!
//! # Data Flow
//! ```text
//! ParsedRequest (target + normalized head)
//!     → connector.rs (resolve, connect with timeout)
//!     → forwarder.rs (send head, relay response bytes to the client)
//! ```
//!
//! # Design Decisions
//! - One target connection per client connection, never pooled or reused
//! - The response is streamed, not buffered whole
//! - Failures before the first relayed byte become 502/504 responses

pub mod connector;
pub mod error;
pub mod forwarder;

pub use connector::connect;
pub use error::UpstreamError;
pub use forwarder::{relay_response, send_request};
