//! Parsed request data model.
//!
//! # Responsibilities
//! - Hold the resolved target origin of one client request
//! - Keep header lines in forwarding order with presence flags for the
//!   four headers the proxy guarantees
//! - Serialize the normalized head for the target
//!
//! # Design Decisions
//! - Owned exclusively by one connection task; never shared
//! - Mandatory-header synthesis is idempotent: a flag once set stays set

use std::fmt;

/// Port used when neither the request line nor `Host` names one.
pub const DEFAULT_PORT: u16 = 80;

/// Header names the proxy tracks, matched case-sensitively.
pub const HOST: &str = "Host";
pub const USER_AGENT: &str = "User-Agent";
pub const CONNECTION: &str = "Connection";
pub const PROXY_CONNECTION: &str = "Proxy-Connection";

/// Classification of a header line by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Host,
    UserAgent,
    Connection,
    ProxyConnection,
    Other,
}

impl HeaderKind {
    /// Classify a raw header line by the text before its first `:`.
    pub fn of(line: &str) -> Self {
        match line.split_once(':').map(|(name, _)| name) {
            Some(HOST) => HeaderKind::Host,
            Some(USER_AGENT) => HeaderKind::UserAgent,
            Some(CONNECTION) => HeaderKind::Connection,
            Some(PROXY_CONNECTION) => HeaderKind::ProxyConnection,
            _ => HeaderKind::Other,
        }
    }
}

/// The origin server a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `Host` header value: the port is omitted when it is the default.
    pub fn host_header_value(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Which mandatory headers are present in a [`HeaderSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderPresence {
    pub host: bool,
    pub user_agent: bool,
    pub connection: bool,
    pub proxy_connection: bool,
}

impl HeaderPresence {
    fn mark(&mut self, kind: HeaderKind) {
        match kind {
            HeaderKind::Host => self.host = true,
            HeaderKind::UserAgent => self.user_agent = true,
            HeaderKind::Connection => self.connection = true,
            HeaderKind::ProxyConnection => self.proxy_connection = true,
            HeaderKind::Other => {}
        }
    }

    pub fn all(&self) -> bool {
        self.host && self.user_agent && self.connection && self.proxy_connection
    }
}

/// Ordered head lines (request line first), each with its terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    lines: Vec<String>,
    presence: HeaderPresence,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, classifying it by name.
    pub fn push(&mut self, line: String) {
        let kind = HeaderKind::of(&line);
        self.push_kind(kind, line);
    }

    /// Append a line whose classification is already known.
    pub(crate) fn push_kind(&mut self, kind: HeaderKind, line: String) {
        self.presence.mark(kind);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn presence(&self) -> HeaderPresence {
        self.presence
    }

    /// Append each mandatory header that is still missing, in the order
    /// `Host`, `User-Agent`, `Connection`, `Proxy-Connection`.
    pub fn synthesize_missing(&mut self, target: &Target, user_agent: &str) {
        if !self.presence.host {
            let line = format!("{}: {}\r\n", HOST, target.host_header_value());
            self.push_kind(HeaderKind::Host, line);
        }
        if !self.presence.user_agent {
            let line = format!("{}: {}\r\n", USER_AGENT, user_agent);
            self.push_kind(HeaderKind::UserAgent, line);
        }
        if !self.presence.connection {
            self.push_kind(HeaderKind::Connection, format!("{}: close\r\n", CONNECTION));
        }
        if !self.presence.proxy_connection {
            self.push_kind(
                HeaderKind::ProxyConnection,
                format!("{}: close\r\n", PROXY_CONNECTION),
            );
        }
    }
}

/// A fully normalized request ready to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    target: Target,
    headers: HeaderSet,
}

impl ParsedRequest {
    pub(crate) fn new(target: Target, headers: HeaderSet) -> Self {
        Self { target, headers }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// The rewritten request line.
    pub fn request_line(&self) -> &str {
        self.headers.lines().first().map(String::as_str).unwrap_or_default()
    }

    /// The head as sent to the target, ending with the blank line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.headers.lines().iter().map(String::len).sum::<usize>() + 2;
        let mut out = Vec::with_capacity(len);
        for line in self.headers.lines() {
            out.extend_from_slice(line.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out
    }
}
