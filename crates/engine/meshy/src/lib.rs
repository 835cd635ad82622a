//! Text-to-3D generation client
//!
//! Submits a prompt to the Meshy text-to-3D service and polls the task until
//! it succeeds, fails, or the attempt budget runs out.
//!
//! # Features
//!
//! - **Preview generation**: fixed preview parameters (negative prompt, art
//!   style, remeshing) kept in [`GenerationConfig`]
//! - **Progress reporting**: a caller callback sees monotonic 0-100 progress
//! - **Bounded wait**: fixed poll interval and attempt budget
//! - **Single failure surface**: every outcome is a [`GenerationError`]
//!
//! The HTTP layer is injected as a [`JsonTransport`](printprompt_transport::JsonTransport),
//! so the poller runs against scripted responses in tests.

pub mod config;
pub mod error;
pub mod poller;
pub mod types;

pub use config::GenerationConfig;
pub use error::{GenerationError, Result};
pub use poller::GenerationPoller;
pub use types::{GeneratedModel, MeshFormat, TaskSnapshot, TaskStatus};
