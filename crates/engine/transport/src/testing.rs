//! Scripted in-memory transport for tests
//!
//! Routes are keyed by method and exact URL. Each route replays its replies
//! in order and keeps repeating the final one once the script runs out, so a
//! single `Reply::Json` answers every call. Every call is recorded.

use crate::error::{Result, TransportError};
use crate::request::{JsonRequest, Method, MultipartForm};
use crate::transport::{JsonTransport, MultipartTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// A canned response
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Bytes(Vec<u8>),
    Fail(TransportError),
    /// Sleep (on the tokio clock) before producing the inner reply
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub fn delayed(delay: Duration, reply: Reply) -> Self {
        Reply::Delayed(delay, Box::new(reply))
    }

    /// Shorthand for a non-2xx status
    pub fn status(status: u16) -> Self {
        Reply::Fail(TransportError::Status {
            status,
            url: String::new(),
            message: None,
        })
    }
}

/// A request as seen by the scripted transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: Option<Value>,
    pub form: Option<MultipartForm>,
}

struct Route {
    method: Method,
    url: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

enum Payload {
    Json(Value),
    Bytes(Vec<u8>),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the replies for one method + URL
    pub fn on(self, method: Method, url: impl Into<String>, replies: Vec<Reply>) -> Self {
        self.push_route(method, url, replies);
        self
    }

    /// Append replies to an existing route (or create it)
    pub fn push_route(&self, method: Method, url: impl Into<String>, replies: Vec<Reply>) {
        let url = url.into();
        let mut routes = lock(&self.routes);
        match routes.iter_mut().find(|r| r.method == method && r.url == url) {
            Some(route) => route.replies.extend(replies),
            None => routes.push(Route {
                method,
                url,
                replies: replies.into(),
            }),
        }
    }

    /// All recorded calls, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls made to one method + URL
    pub fn count(&self, method: Method, url: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    fn next_reply(&self, method: Method, url: &str) -> Reply {
        let mut routes = lock(&self.routes);
        let route = routes
            .iter_mut()
            .find(|r| r.method == method && r.url == url);

        match route {
            Some(route) if route.replies.len() > 1 => {
                route.replies.pop_front().unwrap_or_else(|| unscripted(url))
            }
            Some(route) => route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| unscripted(url)),
            None => unscripted(url),
        }
    }

    async fn play(&self, call: RecordedCall) -> Result<Payload> {
        let mut reply = self.next_reply(call.method, &call.url);
        let url = call.url.clone();
        lock(&self.calls).push(call);

        loop {
            match reply {
                Reply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
                Reply::Json(value) => return Ok(Payload::Json(value)),
                Reply::Bytes(bytes) => return Ok(Payload::Bytes(bytes)),
                Reply::Fail(TransportError::Status {
                    status, message, ..
                }) => {
                    return Err(TransportError::Status {
                        status,
                        url,
                        message,
                    })
                }
                Reply::Fail(err) => return Err(err),
            }
        }
    }
}

fn unscripted(url: &str) -> Reply {
    Reply::Fail(TransportError::Status {
        status: 404,
        url: url.to_string(),
        message: Some("no scripted reply".to_string()),
    })
}

fn into_json(url: &str, payload: Payload) -> Result<Value> {
    match payload {
        Payload::Json(value) => Ok(value),
        Payload::Bytes(bytes) => {
            serde_json::from_slice(&bytes).map_err(|e| TransportError::decode(url, e))
        }
    }
}

#[async_trait]
impl JsonTransport for ScriptedTransport {
    async fn request_json(&self, request: JsonRequest) -> Result<Value> {
        let url = request.url.clone();
        let payload = self
            .play(RecordedCall {
                method: request.method,
                url: request.url,
                bearer_token: request.bearer_token,
                body: request.body,
                form: None,
            })
            .await?;
        into_json(&url, payload)
    }
}

#[async_trait]
impl MultipartTransport for ScriptedTransport {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let payload = self
            .play(RecordedCall {
                method: Method::Get,
                url: url.to_string(),
                bearer_token: None,
                body: None,
                form: None,
            })
            .await?;

        match payload {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Json(value) => Ok(value.to_string().into_bytes()),
        }
    }

    async fn post_multipart(&self, url: &str, form: MultipartForm) -> Result<Value> {
        let payload = self
            .play(RecordedCall {
                method: Method::Post,
                url: url.to_string(),
                bearer_token: None,
                body: None,
                form: Some(form),
            })
            .await?;
        into_json(url, payload)
    }
}
