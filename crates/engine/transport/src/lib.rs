//! HTTP transport abstraction for the printprompt service clients
//!
//! The generation and pricing clients never touch `reqwest` directly. They
//! are written against two small traits so they can be driven by a real
//! HTTP stack in production and by canned responses in tests:
//!
//! - [`JsonTransport`]: send a JSON request, get the parsed body or an error
//! - [`MultipartTransport`]: download raw bytes and upload multipart forms
//!
//! [`ReqwestTransport`] implements both. With the `testing` feature,
//! [`testing::ScriptedTransport`] replays scripted replies and records calls.
//!
//! # Example
//!
//! ```no_run
//! use printprompt_transport::{JsonRequest, JsonTransport, ReqwestTransport};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::new();
//! let body = transport
//!     .request_json(JsonRequest::get("https://api.craftcloud3d.com/v5/health_check"))
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http_client;
pub mod request;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, TransportError};
pub use http_client::ReqwestTransport;
pub use request::{FormPart, JsonRequest, Method, MultipartForm};
pub use transport::{decode, HttpTransport, JsonTransport, MultipartTransport};
