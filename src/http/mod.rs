//! HTTP/1.x request head handling.
//!
//! # Data Flow
//! ```text
//! client stream
//!     → line.rs (bounded CRLF line reads)
//!     → request_line.rs (target authority, HTTP/1.0 downgrade)
//!     → headers.rs (classification, close-forcing, Host fallback, synthesis)
//!     → request.rs (ParsedRequest: target + ordered head lines)
//!     → [proxy orchestrator forwards it]
//!
//! On any parse error:
//!     → response.rs (400 Bad Request) and the connection ends
//! ```

pub mod error;
pub mod headers;
pub mod line;
pub mod request;
pub mod request_line;
pub mod response;

pub use error::{LineError, ParseError};
pub use headers::{read_request, HeaderNormalizer, NormalizeSettings};
pub use line::LineReader;
pub use request::{HeaderPresence, HeaderSet, ParsedRequest, Target};
pub use response::ErrorResponse;
