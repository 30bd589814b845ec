//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem once, before anything else runs
//! - Configure log level at runtime via `RUST_LOG`
//! - Terminate the process if the log sink stops accepting writes
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log output goes to stderr; there is no fallback sink

use std::io::{self, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "forward_proxy=info";

/// Exit status when the log sink fails.
pub const LOG_FAILURE_EXIT_CODE: i32 = 74;

/// Writer that exits the process on any write failure.
#[derive(Debug)]
pub struct CriticalWriter<W> {
    inner: W,
}

impl<W: Write> CriticalWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

fn sink_failed(_error: io::Error) -> ! {
    std::process::exit(LOG_FAILURE_EXIT_CODE)
}

impl<W: Write> Write for CriticalWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write(buf) {
            Ok(n) => Ok(n),
            Err(e) => sink_failed(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.flush() {
            Ok(()) => Ok(()),
            Err(e) => sink_failed(e),
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(|| CriticalWriter::new(io::stderr())))
        .try_init()
}
