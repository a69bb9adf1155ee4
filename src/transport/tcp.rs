//! TCP gateway transport.
//!
//! Connects to a bus gateway that tunnels raw frames over a TCP stream.
//! The gateway answers every request with exactly one frame — either real
//! device data or its timeout sentinel — so each round trip is one write
//! followed by reads until a full 14-byte reply has accumulated.

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use crate::protocol::FRAME_SIZE;

/// A connected gateway client.
pub struct TcpGateway {
    stream: TcpStream,
    /// Accumulated reply bytes; the stream may deliver a frame in pieces.
    buffer: BytesMut,
}

impl TcpGateway {
    /// Connect to a gateway at `host:port`.
    pub async fn connect(endpoint: &str) -> std::io::Result<Self> {
        let stream = TcpStream::connect(endpoint).await?;
        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(FRAME_SIZE * 4),
        })
    }
}

#[async_trait::async_trait]
impl Transport for TcpGateway {
    async fn request(&mut self, frame: &[u8]) -> std::io::Result<Vec<u8>> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;

        while self.buffer.len() < FRAME_SIZE {
            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "gateway closed the connection mid-reply",
                ));
            }
        }

        Ok(self.buffer.split_to(FRAME_SIZE).to_vec())
    }
}
