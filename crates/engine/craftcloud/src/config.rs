//! Quote engine configuration

use crate::error::{QuoteError, Result};
use crate::types::LengthUnit;
use std::time::Duration;

/// Public print-marketplace API
pub const DEFAULT_BASE_URL: &str = "https://api.craftcloud3d.com/v5";

/// Web cart page the created offer is opened in
pub const DEFAULT_CART_URL: &str = "https://craftcloud3d.com/cart";

/// Standard resin material, used when a request names no materials
pub const RESIN_MATERIAL_CONFIG_ID: &str = "8c77dbf9-21a8-5342-87c1-fd685ec5fdd8";

pub const DEFAULT_UPLOAD_FILE_NAME: &str = "model.obj";

const DEFAULT_POLL_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 5;
const DEFAULT_MAX_PIPELINE_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Settings for [`QuoteEngine`](crate::QuoteEngine)
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteConfig {
    pub base_url: String,
    pub cart_url: String,
    /// Materials priced when the request leaves them unspecified
    pub default_material_config_ids: Vec<String>,
    pub upload_file_name: String,
    pub upload_unit: LengthUnit,
    /// Upper bound on a single price poll request
    pub poll_attempt_timeout: Duration,
    /// Wait after a poll that returned an incomplete computation
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Full upload, price, poll runs before giving up
    pub max_pipeline_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cart_url: DEFAULT_CART_URL.to_string(),
            default_material_config_ids: vec![RESIN_MATERIAL_CONFIG_ID.to_string()],
            upload_file_name: DEFAULT_UPLOAD_FILE_NAME.to_string(),
            upload_unit: LengthUnit::Mm,
            poll_attempt_timeout: DEFAULT_POLL_ATTEMPT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_pipeline_attempts: DEFAULT_MAX_PIPELINE_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl QuoteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `CRAFTCLOUD_BASE_URL`, `CRAFTCLOUD_MATERIAL_CONFIG_IDS` (comma
    /// separated) and `CRAFTCLOUD_UPLOAD_UNIT` (`mm`, `cm` or `in`). All are
    /// optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new();

        if let Some(base_url) = lookup("CRAFTCLOUD_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(ids) = lookup("CRAFTCLOUD_MATERIAL_CONFIG_IDS") {
            let ids: Vec<String> = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
            config.default_material_config_ids = ids;
        }
        if let Some(unit) = lookup("CRAFTCLOUD_UPLOAD_UNIT") {
            let unit = unit
                .parse::<LengthUnit>()
                .map_err(|e| QuoteError::Config(format!("CRAFTCLOUD_UPLOAD_UNIT: {}", e)))?;
            config = config.with_upload_unit(unit);
        }

        config.validate()?;
        Ok(config)
    }

    /// Trailing slashes are stripped
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Page the offer id is appended to
    pub fn with_cart_url(mut self, cart_url: impl Into<String>) -> Self {
        self.cart_url = cart_url.into();
        self
    }

    /// Replace the materials used when a request names none
    pub fn with_default_materials(mut self, ids: Vec<String>) -> Self {
        self.default_material_config_ids = ids;
        self
    }

    /// Unit the uploaded mesh coordinates are declared in
    pub fn with_upload_unit(mut self, unit: LengthUnit) -> Self {
        self.upload_unit = unit;
        self
    }

    /// Must be non-zero
    pub fn with_poll_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.poll_attempt_timeout = timeout;
        self
    }

    /// Wait after an incomplete price computation
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Price polls per pipeline run, at least 1
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Full pipeline runs per quote, at least 1
    pub fn with_max_pipeline_attempts(mut self, attempts: u32) -> Self {
        self.max_pipeline_attempts = attempts;
        self
    }

    /// Pause between failed pipeline runs
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(QuoteError::Config("base URL is empty".to_string()));
        }
        if self.default_material_config_ids.is_empty() {
            return Err(QuoteError::Config(
                "at least one default material config id is required".to_string(),
            ));
        }
        if self.max_poll_attempts == 0 || self.max_pipeline_attempts == 0 {
            return Err(QuoteError::Config(
                "attempt budgets must be >= 1".to_string(),
            ));
        }
        if self.poll_attempt_timeout.is_zero() {
            return Err(QuoteError::Config(
                "poll attempt timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
