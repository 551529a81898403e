use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use super::RelayClient;
use super::retry::{RetryBudget, RetryStep};
use crate::error::RelayError;
use crate::messages::{GameIdentity, relay_methods};

impl RelayClient {
    /// Call `method` on the relay. A call refused by a shut down transport gets
    /// one reconnect and one more attempt; any other failure is returned as is.
    pub(crate) async fn call_with_retry<P, R>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, RelayError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let mut relay = self.relay.lock().await;
        let mut budget = RetryBudget::new();

        loop {
            let err = match relay.call(method, params).await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            match budget.after_failure(err) {
                RetryStep::Reconnect => {
                    if !self.replace_connection(&mut relay).await {
                        error!("Lost connection to relay and unable to reconnect");
                        return Err(RelayError::LostConnection);
                    }
                    warn!("Lost connection to relay but was able to reconnect");
                }
                RetryStep::Fail(err) => {
                    error!("Relay call {} failed: {}", method, err);
                    return Err(err);
                }
            }
        }
    }

    /// Ask the relay to host `name`, with the host position protected by
    /// `host_password`. Returns what the relay reported.
    pub async fn try_create_game(
        &self,
        name: &str,
        host_password: &str,
    ) -> Result<bool, RelayError> {
        let game = GameIdentity::new(name, host_password);
        self.call_with_retry(relay_methods::NEW_GAME, &game).await
    }

    /// Like `try_create_game`, failures count as `false`
    pub async fn create_game(&self, name: &str, host_password: &str) -> bool {
        self.try_create_game(name, host_password).await.unwrap_or(false)
    }

    pub async fn try_remove_game(&self, name: &str) -> Result<bool, RelayError> {
        let game = GameIdentity::named(name);
        self.call_with_retry(relay_methods::REMOVE_GAME, &game).await
    }

    pub async fn remove_game(&self, name: &str) -> bool {
        self.try_remove_game(name).await.unwrap_or(false)
    }
}
