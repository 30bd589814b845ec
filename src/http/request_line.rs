//! Request-line interpretation.
//!
//! Extracts the target authority from absolute-form request lines and
//! downgrades the protocol version to HTTP/1.0. Origin-form lines carry no
//! authority, so resolution is left to the `Host` header.

use crate::http::error::ParseError;

const VERSION_MARKER: &str = " HTTP/1.";
const SCHEME_MARKER: &str = "://";

/// The interpreted first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The line with its version rewritten to HTTP/1.0, terminator kept.
    pub line: String,
    /// Host named by an absolute-form target.
    pub host: Option<String>,
    /// Port named by an absolute-form target.
    pub port: Option<u16>,
}

/// A host and optional port scanned from the front of some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Authority<'a> {
    pub host: &'a str,
    /// Digits after a `:` separator; empty when the separator has none.
    pub port: Option<&'a str>,
    /// Bytes of `text` covered by host and port.
    pub len: usize,
}

/// Scan `host[:digits]` up to the first CR, LF, space, `/` or `:`.
pub(crate) fn scan_authority(text: &str) -> Authority<'_> {
    let host_end = text
        .find(|c| matches!(c, '\r' | '\n' | ' ' | '/' | ':'))
        .unwrap_or(text.len());
    let host = &text[..host_end];

    if !text[host_end..].starts_with(':') {
        return Authority {
            host,
            port: None,
            len: host_end,
        };
    }

    let digits_start = host_end + 1;
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    Authority {
        host,
        port: Some(&text[digits_start..digits_start + digits_len]),
        len: digits_start + digits_len,
    }
}

/// Convert scanned port digits to a TCP port.
pub(crate) fn parse_port(digits: &str) -> Result<u16, ParseError> {
    if digits.is_empty() {
        return Err(ParseError::MissingPort);
    }
    digits
        .parse()
        .map_err(|_| ParseError::InvalidPort(digits.to_string()))
}

/// Length of a leading `scheme://` inside the target token, or 0.
fn scheme_len(target: &str) -> usize {
    let token_end = target.find([' ', '\r', '\n']).unwrap_or(target.len());
    let token = &target[..token_end];
    match token.find(SCHEME_MARKER) {
        Some(i) if !token[..i].contains('/') => i + SCHEME_MARKER.len(),
        _ => 0,
    }
}

/// Interpret a request line of the form `METHOD target HTTP/1.x`.
pub fn interpret(line: &str) -> Result<RequestLine, ParseError> {
    let separator = line.find(' ').ok_or(ParseError::MissingMethodSeparator)?;
    let target_start = separator + 1;
    let target = &line[target_start..];

    let (host, port, version_search_from) = if target.starts_with('/') {
        (None, None, target_start)
    } else {
        let authority_start = target_start + scheme_len(target);
        let authority = scan_authority(&line[authority_start..]);
        if authority.host.is_empty() {
            return Err(ParseError::EmptyHost);
        }
        let port = authority.port.map(parse_port).transpose()?;
        (
            Some(authority.host.to_string()),
            port,
            authority_start + authority.len,
        )
    };

    let minor_at = line[version_search_from..]
        .find(VERSION_MARKER)
        .map(|i| version_search_from + i + VERSION_MARKER.len())
        .ok_or(ParseError::MissingVersion)?;
    let minor_is_digit = line
        .as_bytes()
        .get(minor_at)
        .is_some_and(u8::is_ascii_digit);
    if !minor_is_digit {
        return Err(ParseError::InvalidVersion);
    }

    let mut rewritten = String::with_capacity(line.len());
    rewritten.push_str(&line[..minor_at]);
    rewritten.push('0');
    rewritten.push_str(&line[minor_at + 1..]);

    Ok(RequestLine {
        line: rewritten,
        host,
        port,
    })
}
