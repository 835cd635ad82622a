//! Generation client configuration

use crate::error::{GenerationError, Result};
use std::time::Duration;

/// Public Meshy text-to-3D API
pub const DEFAULT_BASE_URL: &str = "https://api.meshy.ai/openapi/v2";

/// Preview mode: untextured mesh, fastest turnaround
pub const DEFAULT_MODE: &str = "preview";

pub const DEFAULT_NEGATIVE_PROMPT: &str = "low quality, low resolution, low poly, ugly";

pub const DEFAULT_ART_STYLE: &str = "realistic";

/// Delay between two status polls (5 seconds)
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status polls before giving up (30 x 5s = 2.5 minutes)
const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Settings for [`GenerationPoller`](crate::GenerationPoller)
#[derive(Clone)]
pub struct GenerationConfig {
    /// Bearer token for the generation service
    pub api_key: String,
    pub base_url: String,
    pub mode: String,
    pub negative_prompt: String,
    pub art_style: String,
    pub should_remesh: bool,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("mode", &self.mode)
            .field("negative_prompt", &self.negative_prompt)
            .field("art_style", &self.art_style)
            .field("should_remesh", &self.should_remesh)
            .field("poll_interval", &self.poll_interval)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl GenerationConfig {
    /// Configuration with the default service parameters
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mode: DEFAULT_MODE.to_string(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            art_style: DEFAULT_ART_STYLE.to_string(),
            should_remesh: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Reads `MESHY_API_KEY` (required), `MESHY_BASE_URL`,
    /// `MESHY_POLL_INTERVAL_SECS` and `MESHY_MAX_ATTEMPTS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("MESHY_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Config("MESHY_API_KEY is not configured".to_string())
            })?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup("MESHY_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(secs) = lookup("MESHY_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = lookup("MESHY_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.max_attempts = attempts;
        }

        config.validate()?;
        Ok(config)
    }

    /// Trailing slashes are stripped
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Style hint sent with every task, e.g. `realistic`
    pub fn with_art_style(mut self, art_style: impl Into<String>) -> Self {
        self.art_style = art_style.into();
        self
    }

    /// Features the generator should avoid
    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    /// Wait between status checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Status checks before the task counts as timed out, at least 1
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Reject settings that can never work
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::Config(
                "Valid Meshy API key is required".to_string(),
            ));
        }
        if self.base_url.trim().is_empty() {
            return Err(GenerationError::Config("base URL is empty".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(GenerationError::Config(
                "max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn tasks_url(&self) -> String {
        format!("{}/text-to-3d", self.base_url)
    }

    pub(crate) fn task_url(&self, task_id: &str) -> String {
        format!("{}/text-to-3d/{}", self.base_url, task_id)
    }
}
