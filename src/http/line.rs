//! Bounded line reader over the client stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::http::error::LineError;

/// Reads CRLF (or bare LF) terminated lines, refusing lines longer than a fixed limit.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line_bytes: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_line_bytes,
        }
    }

    /// Read one line including its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. A final line cut off by end of
    /// stream is returned without a terminator.
    pub async fn read_line(&mut self) -> Result<Option<String>, LineError> {
        let mut line = Vec::new();

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            }

            let room = self.max_line_bytes - line.len();
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) if pos < room => {
                    line.extend_from_slice(&available[..=pos]);
                    self.inner.consume(pos + 1);
                    break;
                }
                _ => {
                    let take = available.len().min(room);
                    line.extend_from_slice(&available[..take]);
                    self.inner.consume(take);
                    if line.len() >= self.max_line_bytes {
                        return Err(LineError::LineTooLong {
                            limit: self.max_line_bytes,
                        });
                    }
                }
            }
        }

        String::from_utf8(line)
            .map(Some)
            .map_err(|_| LineError::InvalidUtf8)
    }

    /// Bytes received from the client but not yet consumed as lines.
    pub fn buffered_len(&self) -> usize {
        self.inner.buffer().len()
    }
}
