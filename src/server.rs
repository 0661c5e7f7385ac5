use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::protocol::{CommandFactory, Parser, Response};
use crate::service::Service;

/// TCP server
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    cmd_factory: Arc<CommandFactory>,
    service: Arc<Service>,
}

impl Server {
    /// Create and bind TCP server to specified address
    pub async fn bind(addr: &str, service: Arc<Service>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("TCP server bound to {}", local_addr);

        // Initialize command factory
        let cmd_factory = Arc::new(CommandFactory::init());

        Ok(Self {
            listener,
            local_addr,
            cmd_factory,
            service,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle a single client connection
    async fn handle_connection(
        self: Arc<Self>,
        mut stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> std::io::Result<()> {
        let mut pending = BytesMut::with_capacity(8192); // Buffer for incomplete requests

        loop {
            match stream.read_buf(&mut pending).await {
                Ok(0) => {
                    info!("Connection closed by client: {}", peer_addr);
                    break;
                }
                Ok(_) => loop {
                    let frame = match Parser::next_frame(&mut pending) {
                        Ok(Some(frame)) => frame,
                        Ok(None) => break,
                        Err(e) => {
                            warn!("Dropping connection from {}: {}", peer_addr, e);
                            stream.write_all(&Response::from(e).encode()).await?;
                            return Ok(());
                        }
                    };

                    debug!("Received request from {}: {}", peer_addr, String::from_utf8_lossy(&frame));

                    let response = self.cmd_factory.execute(&frame, &self.service).await;
                    if let Err(e) = stream.write_all(&response.encode()).await {
                        warn!("Failed to write response to {}: {}", peer_addr, e);
                        return Ok(());
                    }
                },
                Err(e) => {
                    error!("Error reading from {}: {}", peer_addr, e);
                    break;
                }
            }
        }

        info!("Connection handler ended for {}", peer_addr);
        Ok(())
    }

    /// Start server, accept and process connections
    pub async fn run(self: Arc<Self>) {
        info!("Server started, listening on {}", self.local_addr);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("New connection accepted from {}", peer_addr);

                    // Clone the Arc<Server> for the new connection
                    let server = Arc::clone(&self);

                    // Spawn an independent task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, peer_addr).await {
                            error!("Error handling connection from {}: {}", peer_addr, e);
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
