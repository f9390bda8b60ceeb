//! Response envelopes and collection normalization.
//!
//! The backend answers `{success, data?, message?, token?, user?}`. List
//! endpoints return `data` either as an id-keyed object or as an array; both
//! become a plain `Vec` here so nothing above this layer sees the difference.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::ApiError;
use crate::models::UserProfile;

#[derive(Debug, Deserialize)]
#[serde(bound = "D: DeserializeOwned")]
pub struct Envelope<D> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub data: Option<D>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl<D> Default for Envelope<D> {
    fn default() -> Self {
        Self {
            success: Some(true),
            data: None,
            message: None,
            token: None,
            user: None,
        }
    }
}

impl<D: DeserializeOwned> Envelope<D> {
    /// Decode a 2xx body. No body counts as success; `success: false` is a
    /// rejection carrying the server message or `fallback`.
    pub fn decode(body: Option<Value>, fallback: &str) -> Result<Self, ApiError> {
        let envelope: Self = match body {
            None => return Ok(Self::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::MalformedPayload(e.to_string()))?,
        };

        if envelope.success == Some(false) {
            return Err(ApiError::Rejected {
                message: envelope
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            });
        }

        Ok(envelope)
    }
}

/// A list payload normalized to sequence order. `null` entries are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T>(pub Vec<T>);

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Collection<T> {
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Collection<T> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        normalize(value).map_err(serde::de::Error::custom)
    }
}

fn normalize<T: DeserializeOwned>(value: Value) -> Result<Collection<T>, String> {
    let entries: Vec<Value> = match value {
        Value::Array(items) => items,
        // serde_json keeps insertion order (preserve_order feature)
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Null => Vec::new(),
        other => {
            return Err(format!(
                "expected a list or keyed mapping, found {}",
                kind(&other)
            ))
        }
    };

    entries
        .into_iter()
        .filter(|v| !v.is_null())
        .map(|v| serde_json::from_value(v).map_err(|e| e.to_string()))
        .collect::<Result<Vec<T>, String>>()
        .map(Collection)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
