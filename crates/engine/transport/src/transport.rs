//! Transport traits the service clients are written against

use crate::error::{Result, TransportError};
use crate::request::{JsonRequest, MultipartForm};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Performs JSON requests and returns the parsed body
///
/// Implementations must return [`TransportError::Status`] for any non-2xx
/// response and [`TransportError::Decode`] when the body is not valid JSON.
/// An empty 2xx body is returned as [`Value::Null`].
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn request_json(&self, request: JsonRequest) -> Result<Value>;
}

/// Raw downloads and multipart uploads
#[async_trait]
pub trait MultipartTransport: Send + Sync {
    /// Download the body at `url`
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// POST a multipart form and return the parsed JSON body
    async fn post_multipart(&self, url: &str, form: MultipartForm) -> Result<Value>;
}

/// Both capabilities, for clients that need uploads as well as JSON calls
pub trait HttpTransport: JsonTransport + MultipartTransport {}

impl<T: JsonTransport + MultipartTransport + ?Sized> HttpTransport for T {}

/// Deserialize a JSON body into a typed response
pub fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| TransportError::decode(url, e))
}
