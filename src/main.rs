use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use relay_interface::{ClientCallback, RelayClient, RelayConfig, ServerStatus};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "relay_host", about = "Host games through a relay server")]
struct Args {
    #[arg(long, default_value = "localhost")]
    relay_host: String,

    #[arg(long, default_value_t = 7398)]
    relay_port: u16,

    /// Interface the relay calls back on
    #[arg(long, default_value = "0.0.0.0")]
    listen_host: String,

    /// Port the relay calls back on, defaults to relay port + 1
    #[arg(long)]
    listen_port: Option<u16>,

    /// Seconds to wait for the relay to accept a connection
    #[arg(long, default_value_t = 10)]
    dial_timeout: u64,

    /// Game to create once connected, removed again on shutdown
    #[arg(long)]
    game: Option<String>,

    /// Password protecting the host position
    #[arg(long, default_value = "")]
    password: String,

    /// Log at info instead of debug
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Default, Serialize)]
struct HostStatus {
    connected_games: BTreeSet<String>,
}

/// Logs relay notifications and reports which games have a host connected
#[derive(Default)]
struct LoggingHost {
    status: Mutex<HostStatus>,
}

impl ClientCallback for LoggingHost {
    fn game_connected(&self, name: &str) {
        info!("Host connected to game {}", name);
        if let Ok(mut status) = self.status.lock() {
            status.connected_games.insert(name.to_string());
        }
    }

    fn game_closed(&self, name: &str) {
        info!("Game {} closed", name);
        if let Ok(mut status) = self.status.lock() {
            status.connected_games.remove(name);
        }
    }

    fn status(&self) -> ServerStatus {
        let Ok(status) = self.status.lock() else {
            return ServerStatus::default();
        };
        ServerStatus::new(&*status).unwrap_or_default()
    }
}

/// Entry point: connects to the relay and serves its notifications until Ctrl-C
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.quiet {
            tracing::Level::INFO
        } else {
            tracing::Level::DEBUG
        })
        .init();

    let mut config = RelayConfig::for_relay(args.relay_host, args.relay_port);
    config.listen_host = args.listen_host;
    config.dial_timeout = Duration::from_secs(args.dial_timeout);
    if let Some(port) = args.listen_port {
        config.listen_port = port;
    }

    let client = RelayClient::connect(config, Arc::new(LoggingHost::default())).await?;
    info!("Relay calls accepted on {}", client.listen_addr());

    if let Some(game) = &args.game {
        if client.create_game(game, &args.password).await {
            info!("Relay is hosting game {}", game);
        } else {
            warn!("Relay refused to host game {}", game);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    if let Some(game) = &args.game {
        if !client.remove_game(game).await {
            warn!("Relay did not remove game {}", game);
        }
    }
    client.close_connection().await;

    Ok(())
}
