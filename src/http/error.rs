//! Errors raised while reading and normalizing a client request head.

use thiserror::Error;

/// Failures of the line source feeding the parser.
#[derive(Debug, Error)]
pub enum LineError {
    /// Reading from the client failed.
    #[error("client read failed: {0}")]
    Io(#[from] std::io::Error),

    /// No line terminator within the configured limit.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    /// The line is not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// A client protocol error. Every variant answers the client with `400 Bad Request`.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The request line has no space after the method.
    #[error("request line has no method separator")]
    MissingMethodSeparator,

    /// No ` HTTP/1.` token follows the request target.
    #[error("request line has no HTTP/1.x version")]
    MissingVersion,

    /// The version minor digit is absent or not a digit.
    #[error("request line has a malformed HTTP version")]
    InvalidVersion,

    /// An absolute-form target or `Host` header names no host.
    #[error("target host is empty")]
    EmptyHost,

    /// A `:` port separator is followed by no digits.
    #[error("port separator is not followed by digits")]
    MissingPort,

    /// The port digits do not fit a TCP port.
    #[error("port {0} is out of range")]
    InvalidPort(String),

    /// A `Host` header line has no value.
    #[error("Host header has no value")]
    MissingHostValue,

    /// Neither the request line nor a `Host` header named a target.
    #[error("no target host in request line or Host header")]
    UnresolvedTarget,

    /// The head ended before a request line arrived.
    #[error("request line is missing")]
    EmptyRequest,

    /// More header lines than the configured limit.
    #[error("more than {limit} header lines")]
    TooManyHeaders { limit: usize },

    /// The line source rejected a line.
    #[error(transparent)]
    Line(#[from] LineError),
}

impl ParseError {
    /// Whether the failure came from the client transport rather than the request text.
    pub fn is_transport(&self) -> bool {
        matches!(self, ParseError::Line(LineError::Io(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_errors_convert_into_parse_errors() {
        let err: ParseError = LineError::LineTooLong { limit: 64 }.into();
        assert_eq!(err.to_string(), "line exceeds 64 bytes");
        assert!(!err.is_transport());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err: ParseError = LineError::from(io).into();
        assert!(err.is_transport());
    }
}
