//! 3D-print quote engine
//!
//! Uploads a generated mesh to the Craftcloud print marketplace, requests
//! prices for a set of materials and polls the computation until every
//! vendor has answered. The completed computation is reduced to two offers:
//! the cheapest and the fastest quote + shipping pair.
//!
//! The HTTP layer is injected as an
//! [`HttpTransport`](printprompt_transport::HttpTransport).
//!
//! # Example
//!
//! ```no_run
//! use craftcloud::{QuoteConfig, QuoteEngine, QuoteRequest};
//! use printprompt_transport::ReqwestTransport;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = QuoteEngine::new(QuoteConfig::from_env()?, Arc::new(ReqwestTransport::new()))?;
//! let selection = engine
//!     .get_quote(&QuoteRequest::new("https://assets.example/queen.obj", "DE"))
//!     .await?;
//!
//! if let Some(cheapest) = selection.cheapest {
//!     println!("cheapest: {:.2} in {} days", cheapest.total_cost, cheapest.total_time);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod selection;
pub mod types;

pub use client::CraftcloudClient;
pub use config::QuoteConfig;
pub use engine::{QuoteEngine, QuoteRequest};
pub use error::{QuoteError, Result};
pub use selection::{delivery_upper_bound, pair_options, select_options, QuoteOption, QuoteSelection};
pub use types::{Currency, LengthUnit, PriceComputation, Quote, Shipping};
