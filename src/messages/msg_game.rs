use serde::{Deserialize, Serialize};

/// Name/password pair identifying a hosted game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameIdentity {
    #[serde(rename = "Name")]
    pub name: String,
    // Only meaningful when creating a game
    #[serde(rename = "Password", default)]
    pub password: String,
}

impl GameIdentity {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }
}

/// Status snapshot handed to the relay. Its shape belongs to the callback
/// consumer, so it travels as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerStatus(pub serde_json::Value);

impl ServerStatus {
    pub fn new<T: Serialize>(status: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(status).map(Self)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}
