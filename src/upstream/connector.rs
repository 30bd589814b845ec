//! Target connection establishment.

use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};

use crate::http::Target;
use crate::resilience::with_timeout;
use crate::upstream::error::UpstreamError;

/// Resolve the target and connect to the first address that accepts,
/// all within `connect_timeout`.
pub async fn connect(target: &Target, connect_timeout: Duration) -> Result<TcpStream, UpstreamError> {
    let name = target.to_string();

    let attempt = async {
        let addrs = lookup_host((target.host.as_str(), target.port))
            .await
            .map_err(|source| UpstreamError::Resolve {
                target: name.clone(),
                source,
            })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    tracing::debug!(target_addr = %addr, "Connected to target");
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(target_addr = %addr, error = %e, "Connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(source) => UpstreamError::Connect {
                target: name.clone(),
                source,
            },
            None => UpstreamError::NoAddress {
                target: name.clone(),
            },
        })
    };

    match with_timeout("connect", connect_timeout, attempt).await {
        Ok(result) => result,
        Err(source) => Err(UpstreamError::ConnectTimeout {
            target: name.clone(),
            source,
        }),
    }
}
