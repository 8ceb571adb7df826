//! Redis protocol server
//!
//! Accepts client connections and runs the parse -> dispatch -> encode loop

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::split;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use resp::{AsyncRespEncoder, AsyncRespParser, Command, RespError, RespValue};

/// Redis protocol server
pub struct RedisServer {
    dispatcher: Arc<Dispatcher>,
    addr: SocketAddr,
}

impl RedisServer {
    pub fn new(dispatcher: Arc<Dispatcher>, addr: SocketAddr) -> Self {
        Self { dispatcher, addr }
    }

    /// Accept connections until the process exits
    pub async fn start(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Redis server listening on {}", self.addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    debug!("New client connection from {}", addr);
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, dispatcher).await {
                            warn!("Error handling client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Per-connection loop
async fn handle_client(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (reader, writer) = split(stream);
    let mut parser = AsyncRespParser::new(reader);
    let mut encoder = AsyncRespEncoder::new(writer);

    loop {
        parser.reset_bytes_read();
        let value = match parser.parse().await {
            Ok(v) => v,
            Err(RespError::UnexpectedEof) => break,
            Err(e) => {
                encoder
                    .encode(&RespValue::error(format!("ERR {}", e)))
                    .await?;
                break;
            }
        };

        let command = match Command::try_from(&value) {
            Ok(cmd) => cmd,
            Err(e) => {
                encoder.encode(&RespValue::error(e.to_string())).await?;
                continue;
            }
        };

        debug!(command = command.name(), write = command.is_write(), "dispatch");
        let response = dispatcher.dispatch(command);
        encoder.encode(&response).await?;
    }

    Ok(())
}
