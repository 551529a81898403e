use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::dispatch::InboundResponder;
use crate::connection::configure_keepalive;
use crate::error::RelayError;
use crate::messages::RpcRequest;

/// Pause after a failed accept, so a persistent error such as running out of
/// file descriptors does not spin the loop
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Local socket the relay calls back into. Lives independently of the
/// outbound connection.
pub struct InboundListener {
    local_addr: SocketAddr,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl InboundListener {
    pub async fn bind(addr: &str, responder: InboundResponder) -> Result<Self, RelayError> {
        let bind_error = |source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!("Listening for relay rpc calls on {}", local_addr);

        let accept_task = tokio::spawn(accept_loop(listener, Arc::new(responder)));

        Ok(Self {
            local_addr,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting. Returns once the socket is closed; connections that were
    /// already accepted run to completion. Closing twice is a no-op.
    pub async fn close(&self) {
        let Some(task) = self.accept_task.lock().await.take() else {
            return;
        };
        task.abort();
        // The listener is dropped together with the aborted task
        let _ = task.await;
        info!("Stopped listening for relay rpc calls on {}", self.local_addr);
    }

    pub async fn is_closed(&self) -> bool {
        self.accept_task.lock().await.is_none()
    }
}

impl Drop for InboundListener {
    fn drop(&mut self) {
        if let Some(task) = self.accept_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn accept_loop(listener: TcpListener, responder: Arc<InboundResponder>) {
    let listener = &listener;
    accept_connections(move || listener.accept(), responder).await
}

async fn accept_connections<F, Fut>(mut accept: F, responder: Arc<InboundResponder>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<(TcpStream, SocketAddr)>>,
{
    loop {
        match accept().await {
            Ok((socket, addr)) => {
                configure_keepalive(&socket);
                tokio::spawn(serve_connection(socket, addr, responder.clone()));
            }
            Err(e) => {
                warn!("Error accepting relay rpc connection: {}", e);
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

/// Serve requests from one relay connection in order until it closes
async fn serve_connection(socket: TcpStream, addr: SocketAddr, responder: Arc<InboundResponder>) {
    info!("Relay connected for rpc from {}", addr);

    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Relay rpc connection from {} closed", addr);
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                let request = match serde_json::from_str::<RpcRequest>(&line) {
                    Ok(request) => request,
                    Err(e) => {
                        error!("Failed to parse rpc request from {}: {}", addr, e);
                        continue;
                    }
                };

                let response = responder.respond(request).await;
                if let Err(e) = writer.write_all(response.to_line().as_bytes()).await {
                    error!("Failed to write rpc response to {}: {}", addr, e);
                    break;
                }
            }
            Err(e) => {
                error!("Relay rpc connection from {} read error: {}", addr, e);
                break;
            }
        }
    }

    debug!("Relay rpc connection from {} cleanup complete", addr);
}
