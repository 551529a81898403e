use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::callback::ClientCallback;
use crate::messages::{GameIdentity, RpcRequest, RpcResponse, client_methods};

/// The whole inbound protocol surface
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCall {
    GameConnected(GameIdentity),
    GameClosed(GameIdentity),
    Status,
}

impl InboundCall {
    /// Error strings go back to the relay verbatim
    pub fn parse(request: &RpcRequest) -> Result<Self, String> {
        match request.method.as_str() {
            client_methods::GAME_CONNECTED => Ok(Self::GameConnected(game_identity(request)?)),
            client_methods::GAME_CLOSED => Ok(Self::GameClosed(game_identity(request)?)),
            // The argument is unused
            client_methods::STATUS => Ok(Self::Status),
            other => Err(format!("rpc: can't find method {}", other)),
        }
    }

    /// Forward to the consumer and produce the rpc result
    fn dispatch(self, callback: &dyn ClientCallback) -> Value {
        match self {
            Self::GameConnected(game) => {
                debug!("Relay reports host connected to game {}", game.name);
                callback.game_connected(&game.name);
                Value::Null
            }
            Self::GameClosed(game) => {
                debug!("Relay reports game {} closed", game.name);
                callback.game_closed(&game.name);
                Value::Null
            }
            Self::Status => {
                debug!("Relay requested status");
                callback.status().0
            }
        }
    }
}

fn game_identity(request: &RpcRequest) -> Result<GameIdentity, String> {
    serde_json::from_value(request.argument().clone())
        .map_err(|e| format!("invalid params for {}: {}", request.method, e))
}

/// Answers relay-originated calls using the consumer it was built with
pub struct InboundResponder {
    callback: Arc<dyn ClientCallback>,
}

impl InboundResponder {
    pub fn new(callback: Arc<dyn ClientCallback>) -> Self {
        Self { callback }
    }

    pub async fn respond(&self, request: RpcRequest) -> RpcResponse {
        let call = match InboundCall::parse(&request) {
            Ok(call) => call,
            Err(message) => {
                warn!("Rejected relay call {}: {}", request.method, message);
                return RpcResponse::error(request.id, message);
            }
        };

        // The consumer may block, keep it off the async workers
        let callback = self.callback.clone();
        match tokio::task::spawn_blocking(move || call.dispatch(callback.as_ref())).await {
            Ok(result) => RpcResponse::ok(request.id, result),
            Err(e) => {
                error!("Callback failed while handling {}: {}", request.method, e);
                RpcResponse::error(request.id, format!("callback failed: {}", e))
            }
        }
    }
}
