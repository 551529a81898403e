use crate::messages::ServerStatus;

/// Receives the notifications the relay pushes to us.
///
/// Calls are synchronous and may block; each inbound connection waits for the
/// consumer before serving its next request, other connections are unaffected.
pub trait ClientCallback: Send + Sync + 'static {
    /// A host connected to the named game
    fn game_connected(&self, name: &str);

    /// The named game ended
    fn game_closed(&self, name: &str);

    /// Current status snapshot, produced fresh for every query
    fn status(&self) -> ServerStatus;
}
