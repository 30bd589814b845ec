//! Request forwarding and response relay.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::ParsedRequest;
use crate::resilience::with_timeout;
use crate::upstream::error::UpstreamError;

const RELAY_CHUNK_SIZE: usize = 16 * 1024;

/// Write the normalized request head to the target.
pub async fn send_request<W>(origin: &mut W, request: &ParsedRequest) -> Result<(), UpstreamError>
where
    W: AsyncWrite + Unpin,
{
    origin
        .write_all(&request.to_bytes())
        .await
        .map_err(UpstreamError::Send)?;
    origin.flush().await.map_err(UpstreamError::Send)
}

/// Copy the target's response to the client verbatim until the target closes.
///
/// Every read from the target and every write to the client must make
/// progress within `idle_timeout`. Returns the number of bytes relayed.
pub async fn relay_response<R, W>(
    origin: &mut R,
    client: &mut W,
    idle_timeout: Duration,
) -> Result<u64, UpstreamError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_CHUNK_SIZE];
    let mut relayed = 0u64;

    loop {
        let read = match with_timeout("target_read", idle_timeout, origin.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(source)) => return Err(UpstreamError::Receive { relayed, source }),
            Err(source) => return Err(UpstreamError::IdleTimeout { relayed, source }),
        };
        if read == 0 {
            break;
        }

        match with_timeout("client_write", idle_timeout, client.write_all(&buf[..read])).await {
            Ok(Ok(())) => {}
            Ok(Err(source)) => return Err(UpstreamError::ClientWrite { relayed, source }),
            Err(source) => return Err(UpstreamError::IdleTimeout { relayed, source }),
        }
        relayed += read as u64;
    }

    if relayed == 0 {
        return Err(UpstreamError::EmptyResponse);
    }
    client
        .flush()
        .await
        .map_err(|source| UpstreamError::ClientWrite { relayed, source })?;
    Ok(relayed)
}
