//! Minimal client for the TCP transport

use std::io;

use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::interfaces::rpc::{FrameError, RpcError, RpcRequest, RpcResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("Connection closed before a response arrived")]
    Closed,

    #[error("Response id {got:?} does not match request id {expected}")]
    UnexpectedReply { expected: String, got: Option<String> },

    #[error("Remote error: {0}")]
    Remote(RpcError),
}

pub struct TcpClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TcpClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Send one request and wait for its response.
    pub async fn send(&mut self, pattern: &str, data: Value) -> Result<Value, ClientError> {
        let id = uuid::Uuid::new_v4().to_string();
        let request = RpcRequest::new(id.clone(), pattern, data);

        let mut text = serde_json::to_string(&request).map_err(FrameError::from)?;
        text.push('\n');
        self.writer.write_all(text.as_bytes()).await?;

        let line = self.lines.next_line().await?.ok_or(ClientError::Closed)?;
        let response = RpcResponse::parse(&line)?;
        if response.id.as_deref() != Some(id.as_str()) {
            return Err(ClientError::UnexpectedReply {
                expected: id,
                got: response.id,
            });
        }
        response.into_result().map_err(ClientError::Remote)
    }

    /// Write a raw line and return the raw reply line.
    pub async fn send_raw(&mut self, line: &str) -> Result<String, ClientError> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.lines.next_line().await?.ok_or(ClientError::Closed)
    }
}
