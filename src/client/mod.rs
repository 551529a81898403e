mod caller;
mod retry;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::callback::ClientCallback;
use crate::config::RelayConfig;
use crate::connection::{RpcConnection, dial};
use crate::error::RelayError;
use crate::responder::{InboundListener, InboundResponder};

/// Client side of the relay interface.
///
/// Owns exactly one outbound connection to the relay, replaced wholesale on
/// reconnect, and the inbound listener the relay pushes notifications to. The
/// two fail independently: losing the relay link leaves the listener up.
pub struct RelayClient {
    config: RelayConfig,
    // Held across call, reconnect and re-call so the handle swap is exclusive
    relay: Mutex<RpcConnection>,
    listener: InboundListener,
}

impl RelayClient {
    /// Connect to the relay and start listening for its calls. Notifications
    /// go to `callback`. Fails if either step fails.
    pub async fn connect(
        config: RelayConfig,
        callback: Arc<dyn ClientCallback>,
    ) -> Result<Self, RelayError> {
        let relay = dial(&config)
            .await
            .inspect_err(|e| error!("Relay client not started: {}", e))?;

        let listener =
            InboundListener::bind(&config.listen_addr(), InboundResponder::new(callback))
                .await
                .inspect_err(|e| error!("Relay client not started: {}", e))?;

        Ok(Self {
            config,
            relay: Mutex::new(relay),
            listener,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Address the relay should call us back on
    pub fn listen_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Dial the relay again and install the new connection. On failure the
    /// current connection is kept.
    pub async fn connect_relay(&self) -> bool {
        let mut relay = self.relay.lock().await;
        self.replace_connection(&mut relay).await
    }

    async fn replace_connection(&self, slot: &mut RpcConnection) -> bool {
        match dial(&self.config).await {
            Ok(connection) => {
                // The old connection is dropped here and its socket closed
                *slot = connection;
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Stop accepting relay calls. The outbound connection stays usable until
    /// the client is dropped.
    pub async fn close_connection(&self) {
        self.listener.close().await;
        info!("Relay client stopped listening");
    }

    pub async fn is_listening(&self) -> bool {
        !self.listener.is_closed().await
    }
}
