use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unable to connect to relay server at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {timeout:?} connecting to relay server at {addr}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// The transport is gone; the only error that earns a reconnect
    #[error("connection to relay is shut down")]
    Shutdown,

    /// The link dropped while the call was in flight. The relay may already
    /// have acted on it, so it is never resent.
    #[error("connection to relay was lost while the call was in flight")]
    Disconnected,

    #[error("lost connection to relay and unable to reconnect")]
    LostConnection,

    #[error("relay returned an error: {0}")]
    Remote(String),

    #[error("failed to encode rpc frame: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode rpc result: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unable to listen for rpc calls on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    pub fn is_shutdown(&self) -> bool {
        matches!(self, RelayError::Shutdown)
    }

    /// True when the caller should consider the relay session abandoned
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, RelayError::LostConnection)
    }
}
