//! reqwest-backed transport implementation

use crate::error::{Result, TransportError};
use crate::request::{FormPart, JsonRequest, Method, MultipartForm};
use crate::transport::{JsonTransport, MultipartTransport};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Default timeout applied to every request (60 seconds)
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Transport that talks to real services over HTTPS
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Reuse an existing client (connection pool, proxy settings)
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the timeout applied to each request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if e.is_connect() {
            TransportError::Connection(format!("Failed to connect to {}: {}", url, e))
        } else {
            TransportError::Request(e.to_string())
        }
    }

    /// Check the status and parse the body as JSON
    async fn read_json(&self, url: &str, response: Response) -> Result<Value> {
        let response = self.check_status(url, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::decode(url, e))
    }

    async fn check_status(&self, url: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = service_message(&body);
        tracing::debug!(%url, status = status.as_u16(), ?message, "request rejected");

        Err(TransportError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            message,
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the `message` field services put in JSON error bodies
fn service_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn to_reqwest_form(form: MultipartForm) -> multipart::Form {
    form.into_parts()
        .into_iter()
        .fold(multipart::Form::new(), |form, part| match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                bytes,
            } => form.part(name, multipart::Part::bytes(bytes).file_name(file_name)),
        })
}

#[async_trait]
impl JsonTransport for ReqwestTransport {
    async fn request_json(&self, request: JsonRequest) -> Result<Value> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(self.timeout);

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(&request.url, e))?;

        self.read_json(&request.url, response).await
    }
}

#[async_trait]
impl MultipartTransport for ReqwestTransport {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let response = self.check_status(url, response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        Ok(bytes.to_vec())
    }

    async fn post_multipart(&self, url: &str, form: MultipartForm) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .multipart(to_reqwest_form(form))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        self.read_json(url, response).await
    }
}
