//! TCP client for the activation endpoint.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::errors::{RegistError, RegistResult};
use crate::protocol::{Rejection, ResponseToken, DISCONNECT_MESSAGE};

/// One open session with the activation server.
pub struct ActivationClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ActivationClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> RegistResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| RegistError::NetworkError(format!("connect failed: {e}")))?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Send one request line and wait for its response line.
    pub async fn send_line(&mut self, line: &str) -> RegistResult<String> {
        if line.contains('\n') {
            return Err(RegistError::ProtocolError(
                "request must be a single line".to_string(),
            ));
        }
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut response = String::new();
        if self.reader.read_line(&mut response).await? == 0 {
            return Err(RegistError::NetworkError(
                "server closed the connection".to_string(),
            ));
        }
        if response.ends_with('\n') {
            response.pop();
        }
        Ok(response)
    }

    /// Send a request and classify the response.
    pub async fn request(&mut self, line: &str) -> RegistResult<ResponseToken> {
        let response = self.send_line(line).await?;
        Ok(match Rejection::from_code(&response) {
            Some(rejection) => ResponseToken::Rejected(rejection),
            None => ResponseToken::Activated(response),
        })
    }

    /// Send the disconnect message and close the stream.
    pub async fn disconnect(mut self) -> RegistResult<()> {
        self.writer.write_all(DISCONNECT_MESSAGE).await?;
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}
