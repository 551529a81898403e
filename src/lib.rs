//! Client side of the game relay interface.
//!
//! A hosting process uses [`RelayClient`] to ask the relay to create and remove
//! games, while the relay calls back into a local listener to report hosts
//! connecting, games closing and to query status. Both directions speak
//! newline-delimited JSON-RPC over TCP.

pub mod callback;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod messages;
pub mod responder;

#[cfg(test)]
mod test_utils;

pub use callback::ClientCallback;
pub use client::RelayClient;
pub use config::RelayConfig;
pub use error::RelayError;
pub use messages::{GameIdentity, ServerStatus};
