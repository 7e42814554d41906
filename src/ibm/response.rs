//! Response decoding
//!
//! Parses a successful [`RawResponse`] into a typed [`ServiceResponse`] and
//! keeps the entity tag for the next conditional update.

use super::error::ServiceError;
use super::http::RawResponse;
use reqwest::header::{HeaderMap, ETAG};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque version token from the `ETag` header, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTag(String);

impl EntityTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Result type for operations whose response carries no entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty;

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Empty)
    }
}

/// A decoded service response
#[derive(Debug, Clone)]
pub struct ServiceResponse<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub result: T,
    /// Present when the service sent an `ETag` header
    pub etag: Option<EntityTag>,
}

impl<T> ServiceResponse<T> {
    pub fn into_result(self) -> T {
        self.result
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl<T: Serialize> ServiceResponse<T> {
    /// Result as a JSON value, for logging and observers
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.result).unwrap_or(Value::Null)
    }
}

/// Extract the entity tag verbatim, if any
pub fn entity_tag(headers: &HeaderMap) -> Option<EntityTag> {
    headers
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(EntityTag::new)
}

/// Decode a successful response into `T`
pub fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<ServiceResponse<T>, ServiceError> {
    let status = raw.status;
    let decode_error = |e: serde_json::Error| ServiceError::Decode {
        status,
        message: e.to_string(),
    };

    let result = if raw.body.iter().all(u8::is_ascii_whitespace) {
        T::deserialize(Value::Null).map_err(decode_error)?
    } else {
        serde_json::from_slice(&raw.body).map_err(decode_error)?
    };

    let etag = entity_tag(&raw.headers);

    Ok(ServiceResponse {
        status,
        headers: raw.headers,
        result,
        etag,
    })
}
