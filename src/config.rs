use std::time::Duration;

pub const DEFAULT_RELAY_HOST: &str = "localhost";
pub const DEFAULT_RELAY_PORT: u16 = 7398;
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the relay lives and where we listen for its notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub relay_host: String,
    pub relay_port: u16,
    pub listen_host: String,
    /// 0 binds an ephemeral port, see `RelayClient::listen_addr`
    pub listen_port: u16,
    pub dial_timeout: Duration,
}

impl RelayConfig {
    /// Relay at `host:port`, listening on `port + 1` by convention. A relay on
    /// the last port gets the one below it instead.
    pub fn for_relay(host: impl Into<String>, port: u16) -> Self {
        Self {
            relay_host: host.into(),
            relay_port: port,
            listen_port: port.checked_add(1).unwrap_or(port - 1),
            ..Self::default()
        }
    }

    pub fn with_listener(mut self, host: impl Into<String>, port: u16) -> Self {
        self.listen_host = host.into();
        self.listen_port = port;
        self
    }

    pub fn relay_addr(&self) -> String {
        format!("{}:{}", self.relay_host, self.relay_port)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_host: DEFAULT_RELAY_HOST.to_string(),
            relay_port: DEFAULT_RELAY_PORT,
            listen_host: "0.0.0.0".to_string(),
            listen_port: DEFAULT_RELAY_PORT + 1,
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}
