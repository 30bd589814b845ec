//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Client head read / target connect / response relay:
//!     → timeouts.rs (enforce per-stage deadline)
//!     → On timeout: the connection ends with 408 or 504 where a response is still possible
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external wait has a deadline
//! - No retries: a failed request is reported, never replayed

pub mod timeouts;

pub use timeouts::{with_timeout, Elapsed};
