use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::messages::{RpcRequest, RpcResponse};

/// Configure TCP keep-alive on a relay socket, failures are ignored
pub(crate) fn configure_keepalive(socket: &TcpStream) {
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(10))
        .with_interval(Duration::from_secs(1));
    let sf = SockRef::from(socket);
    let _ = sf.set_tcp_keepalive(&keepalive);
}

/// Dial the relay within the configured timeout and wrap the stream in a fresh
/// rpc connection
pub async fn dial(config: &RelayConfig) -> Result<RpcConnection, RelayError> {
    let addr = config.relay_addr();
    let dialing = TcpStream::connect(&addr);
    let stream = match tokio::time::timeout(config.dial_timeout, dialing).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(RelayError::Connect { addr, source }),
        Err(_) => {
            return Err(RelayError::ConnectTimeout {
                addr,
                timeout: config.dial_timeout,
            });
        }
    };

    configure_keepalive(&stream);
    let connection = RpcConnection::new(stream).map_err(|source| RelayError::Connect {
        addr: addr.clone(),
        source,
    })?;
    info!("Connected to relay server at {}", addr);
    Ok(connection)
}

#[derive(Default)]
struct PendingState {
    shut_down: bool,
    calls: HashMap<u64, oneshot::Sender<RpcResponse>>,
}

/// Calls waiting for their response, keyed by request id. Once shut down no
/// call can be registered and every waiting call fails.
#[derive(Default)]
struct PendingCalls {
    state: Mutex<PendingState>,
}

impl PendingCalls {
    fn state(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: u64, tx: oneshot::Sender<RpcResponse>) -> Result<(), RelayError> {
        let mut state = self.state();
        if state.shut_down {
            return Err(RelayError::Shutdown);
        }
        state.calls.insert(id, tx);
        Ok(())
    }

    fn cancel(&self, id: u64) {
        self.state().calls.remove(&id);
    }

    fn complete(&self, response: RpcResponse) {
        let Some(id) = response.call_id() else {
            warn!("Relay sent a response with unexpected id {}", response.id);
            return;
        };
        let waiting = self.state().calls.remove(&id);
        match waiting {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => warn!("Relay sent a response for unknown call {}", id),
        }
    }

    fn shut_down(&self) {
        let mut state = self.state();
        state.shut_down = true;
        // Dropping the senders fails every waiting call
        state.calls.clear();
    }

    fn is_shut_down(&self) -> bool {
        self.state().shut_down
    }

    #[cfg(test)]
    fn waiting(&self) -> usize {
        self.state().calls.len()
    }
}

/// Removes a call from the pending table when its future goes away, answered
/// or not
struct PendingEntry<'a> {
    pending: &'a PendingCalls,
    id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.pending.cancel(self.id);
    }
}

/// Outbound rpc transport to the relay. Calls may be issued concurrently and
/// are matched to responses by id. Dropping the connection closes the socket.
pub struct RpcConnection {
    peer: SocketAddr,
    next_id: AtomicU64,
    pending: Arc<PendingCalls>,
    writer_tx: mpsc::UnboundedSender<String>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
}

impl RpcConnection {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();
        let (writer_tx, writer_rx) = mpsc::unbounded_channel::<String>();
        let pending = Arc::new(PendingCalls::default());

        let reader_task = tokio::spawn(read_responses(reader, peer, pending.clone()));
        let writer_task = tokio::spawn(write_requests(writer, writer_rx, pending.clone()));

        Ok(Self {
            peer,
            next_id: AtomicU64::new(0),
            pending,
            writer_tx,
            reader_task,
            writer_task,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// True once the link is known to be gone; further calls fail with
    /// `RelayError::Shutdown` without being sent
    pub fn is_shut_down(&self) -> bool {
        self.pending.is_shut_down()
    }

    /// Invoke `method` on the relay and wait for its decoded result
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RelayError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let line = RpcRequest::call(method, params, id)?.to_line()?;

        let (tx, rx) = oneshot::channel();
        self.pending.register(id, tx)?;
        let _entry = PendingEntry {
            pending: &self.pending,
            id,
        };
        if self.writer_tx.send(line).is_err() {
            return Err(RelayError::Shutdown);
        }
        debug!("Sent {} (call {}) to relay {}", method, id, self.peer);

        // Cut off after sending: the relay may have seen it
        let response = rx.await.map_err(|_| RelayError::Disconnected)?;
        response.into_result()
    }
}

impl Drop for RpcConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

/// Read response lines from the relay until the link goes away
async fn read_responses(reader: OwnedReadHalf, peer: SocketAddr, pending: Arc<PendingCalls>) {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Relay {} closed the connection", peer);
                break;
            }
            Ok(_) => match serde_json::from_str::<RpcResponse>(&line) {
                Ok(response) => pending.complete(response),
                Err(e) => {
                    error!("Failed to parse response from relay {}: {}", peer, e);
                }
            },
            Err(e) => {
                error!("Relay {} read error: {}", peer, e);
                break;
            }
        }
    }

    pending.shut_down();
}

/// Handle writing request lines to the relay socket
async fn write_requests(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    pending: Arc<PendingCalls>,
) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            error!("Failed to write to relay: {}", e);
            pending.shut_down();
            break;
        }
    }
}
