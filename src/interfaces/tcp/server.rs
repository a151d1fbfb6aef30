//! Point-to-point RPC transport
//!
//! Newline-delimited JSON over TCP: one request frame per line in, one
//! response frame per line out. Requests on a connection are answered in order.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};

use crate::interfaces::rpc::{RpcError, RpcHandler, RpcRequest, RpcResponse};
use crate::shared::ShutdownSignal;

pub struct TcpTransport {
    listener: TcpListener,
    handler: Arc<dyn RpcHandler>,
    shutdown: ShutdownSignal,
}

impl TcpTransport {
    pub async fn bind(addr: impl ToSocketAddrs, handler: Arc<dyn RpcHandler>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handler,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Set the shutdown signal for graceful shutdown
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown is signalled.
    pub async fn run(self) -> io::Result<()> {
        let addr = self.local_addr()?;
        info!("🔌 RPC transport listening on tcp://{}", addr);
        info!("   Patterns: {}", self.handler.patterns().join(", "));

        let stopped = self.shutdown.notified().wait();
        tokio::pin!(stopped);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => self.spawn_connection(stream, peer),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                _ = &mut stopped => {
                    info!("🛑 RPC transport received shutdown signal");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let handler = self.handler.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer, handler, shutdown).await {
                error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<dyn RpcHandler>,
    shutdown: ShutdownSignal,
) -> io::Result<()> {
    info!("New connection from: {}", peer);

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let stopped = shutdown.notified().wait();
    tokio::pin!(stopped);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut stopped => {
                info!("[{}] Connection closing due to server shutdown", peer);
                break;
            }
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        debug!("[{}] <- {}", peer, line);
        let response = match RpcRequest::parse(&line) {
            Ok(request) => handler.handle(request).await,
            Err(e) => {
                warn!("[{}] Malformed frame: {}", peer, e);
                RpcResponse::error(None, RpcError::bad_request(e.to_string()))
            }
        };

        let mut text = response.serialize().map_err(io::Error::other)?;
        debug!("[{}] -> {}", peer, text);
        text.push('\n');
        writer.write_all(text.as_bytes()).await?;
    }

    info!("[{}] Disconnected", peer);
    Ok(())
}
