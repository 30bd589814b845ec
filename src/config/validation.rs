//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits large enough to hold a request line)
//! - Reject header values that would corrupt the forwarded request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// Smallest line limit that still fits a realistic request line.
pub const MIN_LINE_BYTES: usize = 64;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `listener.max_connections` is zero.
    NoConnections,
    /// A timeout field is zero.
    ZeroTimeout(&'static str),
    /// `limits.max_line_bytes` is below [`MIN_LINE_BYTES`].
    LineLimitTooSmall(usize),
    /// `limits.max_header_lines` is zero.
    NoHeaderLines,
    /// `headers.user_agent` is empty.
    EmptyUserAgent,
    /// `headers.user_agent` contains CR or LF.
    UserAgentLineBreak,
    /// `observability.metrics_address` is not a socket address.
    MetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoConnections => write!(f, "listener.max_connections must be greater than 0"),
            ValidationError::ZeroTimeout(field) => write!(f, "timeouts.{} must be greater than 0", field),
            ValidationError::LineLimitTooSmall(n) => {
                write!(f, "limits.max_line_bytes is {}, minimum is {}", n, MIN_LINE_BYTES)
            }
            ValidationError::NoHeaderLines => write!(f, "limits.max_header_lines must be greater than 0"),
            ValidationError::EmptyUserAgent => write!(f, "headers.user_agent must not be empty"),
            ValidationError::UserAgentLineBreak => write!(f, "headers.user_agent must not contain CR or LF"),
            ValidationError::MetricsAddress(addr) => {
                write!(f, "observability.metrics_address {:?} is not a socket address", addr)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::NoConnections);
    }

    let timeouts = [
        ("client_read_secs", config.timeouts.client_read_secs),
        ("connect_secs", config.timeouts.connect_secs),
        ("idle_secs", config.timeouts.idle_secs),
        ("shutdown_grace_secs", config.timeouts.shutdown_grace_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if config.limits.max_line_bytes < MIN_LINE_BYTES {
        errors.push(ValidationError::LineLimitTooSmall(config.limits.max_line_bytes));
    }
    if config.limits.max_header_lines == 0 {
        errors.push(ValidationError::NoHeaderLines);
    }

    let user_agent = &config.headers.user_agent;
    if user_agent.trim().is_empty() {
        errors.push(ValidationError::EmptyUserAgent);
    } else if user_agent.contains(['\r', '\n']) {
        errors.push(ValidationError::UserAgentLineBreak);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
