//! Per-connection session framing.
//!
//! Bytes are read in fixed-size chunks into an accumulation buffer. Every
//! complete `\n`-terminated line is evaluated in arrival order and answered
//! with exactly one response line before the next read. A line may span any
//! number of chunks; bytes after a newline stay buffered for the next line.
//!
//! A session ends when the peer closes the stream, delivers a read of exactly
//! two bytes starting with `X` (the disconnect message), goes idle past the
//! read timeout, or sends a line longer than the configured maximum. None of
//! these produce a response, and any partially received line is dropped.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::errors::RegistResult;
use crate::pipeline::ActivationPipeline;
use crate::protocol::DISCONNECT_BYTE;
use crate::server::logging::{log_session_event, SessionEvent};

/// Bytes requested per socket read.
pub const READ_CHUNK_SIZE: usize = 256;

/// Limits applied to one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub max_line_bytes: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for SessionOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
            max_line_bytes: config.max_line_bytes,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side of the stream.
    Closed,
    /// The peer sent the disconnect message.
    Disconnected,
    /// No data arrived within the read timeout.
    TimedOut,
    /// A request line grew past `max_line_bytes`.
    Oversized,
}

/// Run `fut` under an optional deadline; `None` means the deadline passed.
async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = io::Result<T>>,
) -> Option<io::Result<T>> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Serve one connection until it ends.
///
/// Rejected requests keep the session open; only transport failures are
/// returned as errors.
pub async fn serve<S>(
    mut stream: S,
    pipeline: &ActivationPipeline,
    options: &SessionOptions,
) -> RegistResult<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let read = match bounded(options.read_timeout, stream.read(&mut chunk)).await {
            Some(read) => read?,
            None => {
                log_session_event(SessionEvent::TimedOut, None);
                return Ok(SessionEnd::TimedOut);
            }
        };

        if read == 0 {
            log_session_event(SessionEvent::Closed, None);
            return Ok(SessionEnd::Closed);
        }
        if read == 2 && chunk[0] == DISCONNECT_BYTE {
            buffer.clear();
            log_session_event(SessionEvent::Disconnected, None);
            return Ok(SessionEnd::Disconnected);
        }

        buffer.extend_from_slice(&chunk[..read]);

        while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            let request = String::from_utf8_lossy(&line[..newline]);

            let token = pipeline.evaluate(&request);
            let event = if token.is_activated() {
                SessionEvent::Issued
            } else {
                SessionEvent::Rejected
            };

            let mut response = token.to_string().into_bytes();
            response.push(b'\n');
            let written = bounded(options.write_timeout, async {
                stream.write_all(&response).await?;
                stream.flush().await
            })
            .await;
            match written {
                Some(result) => result?,
                None => {
                    log_session_event(SessionEvent::TimedOut, Some("write"));
                    return Ok(SessionEnd::TimedOut);
                }
            }

            log_session_event(event, Some(token.kind()));
        }

        if buffer.len() > options.max_line_bytes {
            log_session_event(SessionEvent::Oversized, None);
            return Ok(SessionEnd::Oversized);
        }
    }
}
