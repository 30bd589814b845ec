//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// User agent sent when the client did not supply one.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Root configuration for the forward proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host, port, connection limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request head limits.
    pub limits: LimitsConfig,

    /// Header synthesis settings.
    pub headers: HeadersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host (e.g., "0.0.0.0").
    pub host: String,

    /// Listening port. Overridden by the positional CLI argument.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// The `host:port` pair to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_connections: 1024,
        }
    }
}

/// Timeout configuration for the stages of a proxied connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the client to deliver the full request head, in seconds.
    pub client_read_secs: u64,

    /// Target connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Maximum silence from the target while relaying, in seconds.
    pub idle_secs: u64,

    /// How long shutdown waits for live connections to drain, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            client_read_secs: 10,
            connect_secs: 5,
            idle_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Limits applied while reading the client's request head.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest accepted line, terminator included.
    pub max_line_bytes: usize,

    /// Most header lines accepted after the request line.
    pub max_header_lines: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: 8192,
            max_header_lines: 100,
        }
    }
}

/// Settings for headers the proxy injects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadersConfig {
    /// Value of the synthesized `User-Agent` header.
    pub user_agent: String,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 3128

            [timeouts]
            connect_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.port, 3128);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.timeouts.connect_secs, 2);
        assert_eq!(config.timeouts.idle_secs, 30);
        assert_eq!(config.headers.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let listener = ListenerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 1,
        };
        assert_eq!(listener.bind_address(), "127.0.0.1:0");
    }
}
