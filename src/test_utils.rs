use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::callback::ClientCallback;
use crate::config::RelayConfig;
use crate::messages::{RpcRequest, RpcResponse, ServerStatus};

type Handler = dyn Fn(usize, &RpcRequest) -> Option<RpcResponse> + Send + Sync;

/// Scripted relay on 127.0.0.1. The handler sees the index of the connection a
/// request arrived on; returning `None` hangs up that connection.
pub struct FakeRelay {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(usize, RpcRequest)>>>,
    task: JoinHandle<()>,
}

impl FakeRelay {
    /// With `accept_limit` set the listener is dropped after that many
    /// connections, so later dials are refused
    pub async fn start<F>(accept_limit: Option<usize>, handler: F) -> Self
    where
        F: Fn(usize, &RpcRequest) -> Option<RpcResponse> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let task = tokio::spawn({
            let connections = connections.clone();
            let requests = requests.clone();
            async move {
                let mut listener = Some(listener);
                while let Some(current) = listener.as_ref() {
                    let Ok((socket, _)) = current.accept().await else {
                        continue;
                    };
                    let index = connections.fetch_add(1, Ordering::SeqCst);
                    if accept_limit.is_some_and(|limit| index + 1 >= limit) {
                        listener = None;
                    }
                    tokio::spawn(serve(socket, index, handler.clone(), requests.clone()));
                }
            }
        });

        Self {
            addr,
            connections,
            requests,
            task,
        }
    }

    /// Answers every request with `result`
    pub async fn replying(result: Value) -> Self {
        Self::start(None, move |_, request| {
            Some(RpcResponse::ok(request.id.clone(), result.clone()))
        })
        .await
    }

    /// Client config pointing at this relay, listening on an ephemeral local port
    pub fn config(&self) -> RelayConfig {
        RelayConfig::for_relay("127.0.0.1", self.addr.port()).with_listener("127.0.0.1", 0)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<(usize, RpcRequest)> {
        self.requests.lock().await.clone()
    }
}

impl Drop for FakeRelay {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    socket: TcpStream,
    index: usize,
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<(usize, RpcRequest)>>>,
) {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let Ok(request) = serde_json::from_str::<RpcRequest>(&line) else {
            continue;
        };
        requests.lock().await.push((index, request.clone()));
        match handler(index, &request) {
            Some(response) => {
                if writer.write_all(response.to_line().as_bytes()).await.is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}

/// Callback consumer that records every notification
#[derive(Default)]
pub struct RecordingCallback {
    pub connected: std::sync::Mutex<Vec<String>>,
    pub closed: std::sync::Mutex<Vec<String>>,
    pub status: std::sync::Mutex<ServerStatus>,
}

impl RecordingCallback {
    pub fn set_status(&self, status: Value) {
        *self.status.lock().unwrap() = ServerStatus(status);
    }

    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

impl ClientCallback for RecordingCallback {
    fn game_connected(&self, name: &str) {
        self.connected.lock().unwrap().push(name.to_string());
    }

    fn game_closed(&self, name: &str) {
        self.closed.lock().unwrap().push(name.to_string());
    }

    fn status(&self) -> ServerStatus {
        self.status.lock().unwrap().clone()
    }
}

/// Minimal relay-side caller for our inbound listener
pub struct RelayCaller {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl RelayCaller {
    pub async fn connect(addr: SocketAddr) -> std::io::Result<Self> {
        let (reader, writer) = TcpStream::connect(addr).await?.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    pub async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    pub async fn call(&mut self, method: &str, params: Value, id: u64) -> RpcResponse {
        let request = serde_json::json!({"method": method, "params": [params], "id": id});
        self.send_raw(&request.to_string()).await;
        self.read_response().await
    }

    pub async fn read_response(&mut self) -> RpcResponse {
        let mut line = String::new();
        self.reader.read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }
}
