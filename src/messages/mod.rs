mod msg_game;
mod msg_rpc;

pub use self::msg_game::*;
pub use self::msg_rpc::*;

/// Operations the relay exposes to us
pub mod relay_methods {
    pub const NEW_GAME: &str = "ServerRPCMethods.NewGame";
    pub const REMOVE_GAME: &str = "ServerRPCMethods.RemoveGame";
}

/// Operations we expose to the relay
pub mod client_methods {
    pub const GAME_CONNECTED: &str = "ClientRPCMethods.GameConnected";
    pub const GAME_CLOSED: &str = "ClientRPCMethods.GameClosed";
    pub const STATUS: &str = "ClientRPCMethods.Status";
}
