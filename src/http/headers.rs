//! Header stream normalization.
//!
//! # Responsibilities
//! - Consume head lines until the blank line
//! - Resolve the target from the `Host` header when the request line has none
//! - Force `Connection` and `Proxy-Connection` to `close`
//! - Append the mandatory headers the client left out
//!
//! # Design Decisions
//! - First classification wins; request-line authority beats `Host`
//! - Lines are rebuilt rather than edited in place, keeping the client's terminator
//! - Any error stops parsing immediately; nothing partial is forwarded

use tokio::io::AsyncRead;

use crate::config::ProxyConfig;
use crate::http::error::ParseError;
use crate::http::line::LineReader;
use crate::http::request::{
    HeaderKind, HeaderSet, ParsedRequest, Target, CONNECTION, DEFAULT_PORT, PROXY_CONNECTION,
};
use crate::http::request_line::{self, parse_port, scan_authority, RequestLine};

/// Per-request limits and injected values.
#[derive(Debug, Clone)]
pub struct NormalizeSettings {
    pub max_header_lines: usize,
    pub user_agent: String,
}

impl From<&ProxyConfig> for NormalizeSettings {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            max_header_lines: config.limits.max_header_lines,
            user_agent: config.headers.user_agent.clone(),
        }
    }
}

/// Split a line into content and terminator (`"\r\n"`, `"\n"` or empty).
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

fn is_blank(line: &str) -> bool {
    line == "\r\n" || line == "\n"
}

/// Header value with leading whitespace removed, terminator excluded.
fn header_value(content: &str) -> &str {
    content
        .split_once(':')
        .map(|(_, value)| value.trim_start_matches([' ', '\t']))
        .unwrap_or_default()
}

/// Rebuild `Name: close` unless the value already is `close`.
fn force_close(line: &str, name: &str) -> String {
    let (content, terminator) = split_terminator(line);
    if header_value(content).trim_end() == "close" {
        return line.to_string();
    }
    let terminator = if terminator.is_empty() { "\r\n" } else { terminator };
    format!("{}: close{}", name, terminator)
}

/// A line cut off by end of stream gets CRLF.
fn terminated(line: String) -> String {
    if line.ends_with('\n') {
        line
    } else {
        line + "\r\n"
    }
}

/// Accumulates one request's head, line by line.
#[derive(Debug)]
pub struct HeaderNormalizer {
    host: Option<String>,
    port: Option<u16>,
    headers: HeaderSet,
}

impl HeaderNormalizer {
    /// Start from an interpreted request line.
    pub fn new(request_line: RequestLine) -> Self {
        let mut headers = HeaderSet::new();
        headers.push_kind(HeaderKind::Other, terminated(request_line.line));
        Self {
            host: request_line.host,
            port: request_line.port,
            headers,
        }
    }

    /// Classify, rewrite if needed and keep one header line.
    pub fn accept(&mut self, line: &str) -> Result<(), ParseError> {
        let kind = HeaderKind::of(line);
        let forwarded = match kind {
            HeaderKind::Host => {
                self.resolve_from_host(line)?;
                line.to_string()
            }
            HeaderKind::Connection => force_close(line, CONNECTION),
            HeaderKind::ProxyConnection => force_close(line, PROXY_CONNECTION),
            HeaderKind::UserAgent | HeaderKind::Other => line.to_string(),
        };

        self.headers.push_kind(kind, terminated(forwarded));
        Ok(())
    }

    fn resolve_from_host(&mut self, line: &str) -> Result<(), ParseError> {
        let (content, _) = split_terminator(line);
        let value = header_value(content);
        if value.trim().is_empty() {
            return Err(ParseError::MissingHostValue);
        }

        let authority = scan_authority(value);
        if authority.host.is_empty() {
            return Err(ParseError::EmptyHost);
        }
        if self.host.is_none() {
            self.host = Some(authority.host.to_string());
        }
        if self.port.is_none() {
            self.port = Some(match authority.port {
                Some(digits) => parse_port(digits)?,
                None => DEFAULT_PORT,
            });
        }
        Ok(())
    }

    /// Resolve the target and append missing mandatory headers.
    pub fn finish(mut self, user_agent: &str) -> Result<ParsedRequest, ParseError> {
        let host = self.host.ok_or(ParseError::UnresolvedTarget)?;
        let target = Target::new(host, self.port.unwrap_or(DEFAULT_PORT));
        self.headers.synthesize_missing(&target, user_agent);
        Ok(ParsedRequest::new(target, self.headers))
    }
}

/// Read and normalize one request head from the client.
///
/// Returns `Ok(None)` when the client closed without sending anything.
pub async fn read_request<R>(
    reader: &mut LineReader<R>,
    settings: &NormalizeSettings,
) -> Result<Option<ParsedRequest>, ParseError>
where
    R: AsyncRead + Unpin,
{
    let first = match reader.read_line().await? {
        Some(line) => line,
        None => return Ok(None),
    };
    if is_blank(&first) {
        return Err(ParseError::EmptyRequest);
    }

    let mut normalizer = HeaderNormalizer::new(request_line::interpret(&first)?);
    let mut header_count = 0;

    // End of stream before the blank line closes the head as well.
    while let Some(line) = reader.read_line().await? {
        if is_blank(&line) {
            break;
        }
        header_count += 1;
        if header_count > settings.max_header_lines {
            return Err(ParseError::TooManyHeaders {
                limit: settings.max_header_lines,
            });
        }
        normalizer.accept(&line)?;
    }

    normalizer.finish(&settings.user_agent).map(Some)
}
