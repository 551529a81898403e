use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

static NO_ARGUMENT: Value = Value::Null;

/// One request line: `{"method": .., "params": [arg], "id": ..}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

impl RpcRequest {
    pub fn call<P: Serialize>(method: &str, params: &P, id: u64) -> Result<Self, RelayError> {
        let argument = serde_json::to_value(params).map_err(RelayError::Encode)?;
        Ok(Self {
            method: method.to_string(),
            params: Value::Array(vec![argument]),
            id: Value::from(id),
        })
    }

    /// The single positional argument; a bare value is accepted as well
    pub fn argument(&self) -> &Value {
        match &self.params {
            Value::Array(params) => params.first().unwrap_or(&NO_ARGUMENT),
            other => other,
        }
    }

    pub fn to_line(&self) -> Result<String, RelayError> {
        serde_json::to_string(self)
            .map(|json| format!("{}\n", json))
            .map_err(RelayError::Encode)
    }
}

/// One response line: `{"id": .., "result": .., "error": null | "message"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: Value,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn error(id: Value, message: impl Into<String>) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Some(message.into()),
        }
    }

    /// Id of a response to one of our own calls
    pub fn call_id(&self) -> Option<u64> {
        self.id.as_u64()
    }

    pub fn into_result<R: DeserializeOwned>(self) -> Result<R, RelayError> {
        if let Some(message) = self.error {
            return Err(RelayError::Remote(message));
        }
        serde_json::from_value(self.result).map_err(RelayError::Decode)
    }

    // Serializing plain JSON values cannot fail
    pub fn to_line(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"id":null,"result":null,"error":"serialization failed"}"#.to_string()
        });
        format!("{}\n", json)
    }
}
