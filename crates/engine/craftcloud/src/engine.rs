//! Upload, price and poll with bounded retries

use crate::client::CraftcloudClient;
use crate::config::QuoteConfig;
use crate::error::{QuoteError, Result};
use crate::selection::{select_options, QuoteSelection};
use crate::types::{Currency, PriceComputation, PriceRequest, PriceRequestModel};
use printprompt_transport::HttpTransport;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What to quote: one mesh, printed `quantity` times at `scale`
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    /// Where the mesh can be downloaded from
    pub model_url: String,
    /// ISO country the order ships to
    pub country_code: String,
    /// Falls back to [`QuoteConfig::default_material_config_ids`] when `None`
    pub material_config_ids: Option<Vec<String>>,
    pub scale: f64,
    pub quantity: u32,
    pub currency: Currency,
}

impl QuoteRequest {
    pub fn new(model_url: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            model_url: model_url.into(),
            country_code: country_code.into(),
            material_config_ids: None,
            scale: 1.0,
            quantity: 1,
            currency: Currency::default(),
        }
    }

    /// Price these materials instead of the configured defaults
    pub fn with_materials(mut self, ids: Vec<String>) -> Self {
        self.material_config_ids = Some(ids);
        self
    }

    /// Multiplier applied to the mesh dimensions, must be positive
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Copies to print, at least 1
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Currency the prices are returned in
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_url.trim().is_empty() {
            return Err(QuoteError::InvalidRequest("model URL is required".into()));
        }
        if self.country_code.trim().is_empty() {
            return Err(QuoteError::InvalidRequest("country code is required".into()));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(QuoteError::InvalidRequest(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        if self.quantity == 0 {
            return Err(QuoteError::InvalidRequest("quantity must be at least 1".into()));
        }
        if matches!(&self.material_config_ids, Some(ids) if ids.is_empty()) {
            return Err(QuoteError::InvalidRequest(
                "material list must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Turns a mesh URL into the cheapest and fastest print offers
///
/// Each attempt runs the whole pipeline from scratch: fetch and upload the
/// mesh, open a price computation, then poll it until every vendor has
/// answered. Failed attempts are retried up to
/// [`QuoteConfig::max_pipeline_attempts`] times; invalid requests are not.
pub struct QuoteEngine {
    client: CraftcloudClient,
    config: QuoteConfig,
}

impl QuoteEngine {
    pub fn new(config: QuoteConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;
        let client = CraftcloudClient::new(&config.base_url, &config.cart_url, transport);
        Ok(Self { client, config })
    }

    pub fn client(&self) -> &CraftcloudClient {
        &self.client
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteSelection> {
        if let Err(e) = request.validate() {
            warn!(error = %e, "rejecting quote request");
            return Err(e);
        }

        let materials = request
            .material_config_ids
            .clone()
            .unwrap_or_else(|| self.config.default_material_config_ids.clone());
        let max_attempts = self.config.max_pipeline_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.run_pipeline(request, &materials).await {
                Ok(computation) => {
                    let selection = select_options(&computation);
                    info!(
                        attempt,
                        quotes = computation.quotes.len(),
                        shippings = computation.shippings.len(),
                        found = !selection.is_empty(),
                        "quote completed"
                    );
                    return Ok(selection);
                }
                Err(e) if !e.is_retryable() => {
                    error!(attempt, error = %e, "quote failed");
                    return Err(e);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "quote attempt failed");
                    last_error = Some(e.to_string());
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
            }
        }

        let err = QuoteError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        };
        error!(error = %err, "giving up on quote");
        Err(err)
    }

    async fn run_pipeline(
        &self,
        request: &QuoteRequest,
        materials: &[String],
    ) -> Result<PriceComputation> {
        let model_id = self.upload(&request.model_url).await?;

        let price_id = self
            .client
            .create_price_request(&PriceRequest {
                currency: request.currency,
                country_code: request.country_code.clone(),
                models: vec![PriceRequestModel {
                    model_id,
                    quantity: request.quantity,
                    scale: request.scale,
                }],
                material_config_ids: materials.to_vec(),
            })
            .await?;
        debug!(%price_id, "price computation created");

        self.poll_price(&price_id).await
    }

    /// Fetch the mesh and upload it, returning the marketplace model id
    pub async fn upload(&self, model_url: &str) -> Result<String> {
        let bytes = self
            .client
            .fetch_model_file(model_url)
            .await
            .map_err(|source| QuoteError::Upload {
                context: format!("could not fetch {}", model_url),
                source,
            })?;

        let models = self
            .client
            .upload_model(
                &self.config.upload_file_name,
                bytes,
                self.config.upload_unit,
                false,
            )
            .await
            .map_err(|source| QuoteError::Upload {
                context: "upload rejected".to_string(),
                source,
            })?;

        let model_id = models
            .into_iter()
            .map(|m| m.model_id)
            .find(|id| !id.trim().is_empty())
            .ok_or(QuoteError::NoModelReturned)?;
        debug!(%model_id, "model uploaded");
        Ok(model_id)
    }

    /// Poll a computation until every vendor has priced it
    ///
    /// Each request is bounded by the per-attempt timeout. A timed-out
    /// request counts against the budget and the next one starts at once; an
    /// incomplete answer waits the poll interval first.
    pub async fn poll_price(&self, price_id: &str) -> Result<PriceComputation> {
        let max_attempts = self.config.max_poll_attempts;

        for attempt in 1..=max_attempts {
            let computation = match tokio::time::timeout(
                self.config.poll_attempt_timeout,
                self.client.get_price(price_id),
            )
            .await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!(%price_id, attempt, "price poll timed out");
                    continue;
                }
            };

            if computation.all_complete {
                return Ok(computation);
            }

            debug!(
                %price_id,
                attempt,
                pending = ?computation.pending_vendors(),
                "price computation incomplete"
            );
            if attempt < max_attempts {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        Err(QuoteError::PollTimedOut {
            attempts: max_attempts,
        })
    }
}
