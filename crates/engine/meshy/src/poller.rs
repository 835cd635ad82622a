//! Submit a text-to-3D task and poll it to completion

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::types::{CreateTaskResponse, GeneratedModel, TaskSnapshot, TaskStatus, TextTo3dRequest};
use printprompt_transport::{decode, JsonRequest, JsonTransport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Turns a prompt into a generated mesh
///
/// One poller runs at most one generation at a time; a second concurrent
/// call on the same instance fails with [`GenerationError::Busy`].
///
/// # Example
///
/// ```no_run
/// use meshy::{GenerationConfig, GenerationPoller};
/// use printprompt_transport::ReqwestTransport;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let poller = GenerationPoller::new(
///     GenerationConfig::from_env()?,
///     Arc::new(ReqwestTransport::new()),
/// )?;
///
/// let model = poller
///     .generate("a chess queen", |progress| println!("{progress}%"))
///     .await?;
/// println!("GLB: {}", model.glb_url);
/// # Ok(())
/// # }
/// ```
pub struct GenerationPoller {
    transport: Arc<dyn JsonTransport>,
    config: GenerationConfig,
    active: AtomicBool,
}

impl GenerationPoller {
    /// Fails with [`GenerationError::Config`] on missing credentials
    pub fn new(config: GenerationConfig, transport: Arc<dyn JsonTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            active: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Whether a generation is currently polling on this instance
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Generate a mesh from `prompt`
    ///
    /// `on_progress` receives the service-reported progress (0-100) after
    /// each poll that carries one. Reported values never decrease within
    /// one call.
    pub async fn generate<F>(&self, prompt: &str, mut on_progress: F) -> Result<GeneratedModel>
    where
        F: FnMut(u8) + Send,
    {
        if prompt.trim().is_empty() {
            warn!("rejecting empty prompt");
            return Err(GenerationError::InvalidPrompt);
        }

        let Some(_guard) = ActiveGuard::acquire(&self.active) else {
            warn!("generation already in progress on this poller");
            return Err(GenerationError::Busy);
        };

        let result = self.run(prompt, &mut on_progress).await;
        if let Err(e) = &result {
            error!(error = %e, "Meshy generation failed");
        }
        result
    }

    async fn run<F>(&self, prompt: &str, on_progress: &mut F) -> Result<GeneratedModel>
    where
        F: FnMut(u8) + Send,
    {
        let task_id = self.submit(prompt).await?;
        info!(%task_id, "generation task submitted");

        let max_attempts = self.config.max_attempts;
        let mut progress = ProgressReporter::default();

        for attempt in 1..=max_attempts {
            let snapshot = self.fetch_task(&task_id).await?;
            debug!(%task_id, attempt, status = ?snapshot.status, progress = ?snapshot.progress, "polled task");

            if let Some(value) = snapshot.progress {
                progress.report(value, on_progress);
            }

            match snapshot.status {
                TaskStatus::Succeeded => match snapshot.generated_model() {
                    Some(model) => {
                        info!(%task_id, attempt, "generation succeeded");
                        return Ok(model);
                    }
                    None => warn!(%task_id, "task succeeded without both model URLs, polling again"),
                },
                TaskStatus::Failed => {
                    let message = snapshot
                        .failure_message()
                        .unwrap_or("Preview generation failed");
                    return Err(GenerationError::Failed(message.to_string()));
                }
                TaskStatus::Pending | TaskStatus::Processing => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        Err(GenerationError::TimedOut {
            attempts: max_attempts,
        })
    }

    /// Create a generation task and return its identifier
    pub async fn submit(&self, prompt: &str) -> Result<String> {
        let body = TextTo3dRequest {
            mode: self.config.mode.clone(),
            prompt: prompt.to_string(),
            negative_prompt: self.config.negative_prompt.clone(),
            art_style: self.config.art_style.clone(),
            should_remesh: self.config.should_remesh,
        };
        let url = self.config.tasks_url();
        let body = serde_json::to_value(&body)
            .map_err(|e| TransportError::Request(format!("failed to encode request body: {}", e)))?;

        let value = self
            .transport
            .request_json(JsonRequest::post(&url, body).with_bearer(&self.config.api_key))
            .await?;
        let created: CreateTaskResponse = decode(&url, value)?;

        if created.result.trim().is_empty() {
            return Err(TransportError::decode(&url, "empty task identifier").into());
        }
        Ok(created.result)
    }

    /// Read the current state of a task
    pub async fn fetch_task(&self, task_id: &str) -> Result<TaskSnapshot> {
        let url = self.config.task_url(task_id);
        let value = self
            .transport
            .request_json(JsonRequest::get(&url).with_bearer(&self.config.api_key))
            .await?;
        Ok(decode(&url, value)?)
    }
}

/// Holds the single-flight flag for the duration of one generation
struct ActiveGuard<'a>(&'a AtomicBool);

impl<'a> ActiveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Forwards progress to the caller, clamped to 0-100 and never decreasing
#[derive(Debug, Default)]
struct ProgressReporter {
    last: Option<u8>,
}

impl ProgressReporter {
    fn report<F: FnMut(u8)>(&mut self, raw: f64, on_progress: &mut F) {
        if raw.is_nan() {
            return;
        }
        let value = raw.clamp(0.0, 100.0) as u8;

        if let Some(last) = self.last {
            if value < last {
                debug!(value, last, "ignoring progress regression");
                return;
            }
        }

        self.last = Some(value);
        on_progress(value);
    }
}
