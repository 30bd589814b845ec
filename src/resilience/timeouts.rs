//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound the client head read, the target connect and every relay read/write
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors and name the stage that stalled
//! - Timed-out target stages return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// A stage did not complete within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{stage} timed out after {millis}ms", millis = .after.as_millis())]
pub struct Elapsed {
    pub stage: &'static str,
    pub after: Duration,
}

/// Run `future` with a deadline, tagging a timeout with `stage`.
pub async fn with_timeout<F, T>(stage: &'static str, after: Duration, future: F) -> Result<T, Elapsed>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| Elapsed { stage, after })
}

/// Seconds from config as a `Duration`, never zero.
pub fn from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}
