//! Target-side failures.

use std::io;

use thiserror::Error;

use crate::http::ErrorResponse;
use crate::resilience::Elapsed;

/// Failures while connecting to the target or relaying its response.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// DNS resolution of the target failed.
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The target name resolved to no addresses.
    #[error("{target} resolved to no addresses")]
    NoAddress { target: String },

    /// Every resolved address refused or failed the connection.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Connection establishment exceeded the connect timeout.
    #[error("connecting to {target}: {source}")]
    ConnectTimeout {
        target: String,
        #[source]
        source: Elapsed,
    },

    /// Writing the request head to the target failed.
    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),

    /// The target closed without sending a response.
    #[error("target closed without a response")]
    EmptyResponse,

    /// Reading the response from the target failed.
    #[error("failed to read response after {relayed} bytes: {source}")]
    Receive {
        relayed: u64,
        #[source]
        source: io::Error,
    },

    /// The target or the client stalled past the idle timeout.
    #[error("relay stalled after {relayed} bytes: {source}")]
    IdleTimeout {
        relayed: u64,
        #[source]
        source: Elapsed,
    },

    /// Writing the response to the client failed.
    #[error("failed to write response to client after {relayed} bytes: {source}")]
    ClientWrite {
        relayed: u64,
        #[source]
        source: io::Error,
    },
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Resolve { .. } => "resolve",
            UpstreamError::NoAddress { .. } => "no_address",
            UpstreamError::Connect { .. } => "connect",
            UpstreamError::ConnectTimeout { .. } => "connect_timeout",
            UpstreamError::Send(_) => "send",
            UpstreamError::EmptyResponse => "empty_response",
            UpstreamError::Receive { .. } => "receive",
            UpstreamError::IdleTimeout { .. } => "idle_timeout",
            UpstreamError::ClientWrite { .. } => "client_write",
        }
    }

    /// Response for the client, if nothing has been relayed yet.
    pub fn response(&self) -> Option<ErrorResponse> {
        match self {
            UpstreamError::ConnectTimeout { .. } => Some(ErrorResponse::GatewayTimeout),
            UpstreamError::IdleTimeout { relayed: 0, .. } => Some(ErrorResponse::GatewayTimeout),
            UpstreamError::Receive { relayed: 0, .. } => Some(ErrorResponse::BadGateway),
            UpstreamError::Resolve { .. }
            | UpstreamError::NoAddress { .. }
            | UpstreamError::Connect { .. }
            | UpstreamError::Send(_)
            | UpstreamError::EmptyResponse => Some(ErrorResponse::BadGateway),
            UpstreamError::IdleTimeout { .. }
            | UpstreamError::Receive { .. }
            | UpstreamError::ClientWrite { .. } => None,
        }
    }
}
