//! Thin REST client for the print-marketplace API

use crate::selection::QuoteOption;
use crate::types::{
    CartCreated, CartQuote, CartRequest, Currency, HealthStatus, LengthUnit, OfferCreated,
    OfferRequest, PriceComputation, PriceRequest, PriceRequestCreated, UploadedModel,
};
use printprompt_transport::{
    decode, HttpTransport, JsonRequest, MultipartForm, Result, TransportError,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// One method per marketplace endpoint, no retries
#[derive(Clone)]
pub struct CraftcloudClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    cart_url: String,
}

impl std::fmt::Debug for CraftcloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CraftcloudClient")
            .field("base_url", &self.base_url)
            .field("cart_url", &self.cart_url)
            .finish_non_exhaustive()
    }
}

fn encode<T: Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| TransportError::Request(format!("failed to encode request body: {}", e)))
}

impl CraftcloudClient {
    pub fn new(
        base_url: impl Into<String>,
        cart_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cart_url: cart_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Download a generated mesh
    pub async fn fetch_model_file(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self.transport.fetch_bytes(url).await?;
        debug!(url, size = bytes.len(), "fetched model file");
        Ok(bytes)
    }

    /// `POST /model` with the mesh as a multipart file
    pub async fn upload_model(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        unit: LengthUnit,
        refresh: bool,
    ) -> Result<Vec<UploadedModel>> {
        let url = self.url("model");
        let form = MultipartForm::new()
            .file("file", file_name, bytes)
            .text("unit", unit.as_str())
            .text("refresh", refresh.to_string());

        let value = self.transport.post_multipart(&url, form).await?;
        decode(&url, value)
    }

    /// `POST /price`, returns the identifier of the new computation
    pub async fn create_price_request(&self, request: &PriceRequest) -> Result<String> {
        let url = self.url("price");
        let value = self
            .transport
            .request_json(JsonRequest::post(&url, encode(request)?))
            .await?;
        let created: PriceRequestCreated = decode(&url, value)?;

        if created.price_id.trim().is_empty() {
            return Err(TransportError::decode(&url, "empty price identifier"));
        }
        Ok(created.price_id)
    }

    /// `GET /price/{priceId}`
    pub async fn get_price(&self, price_id: &str) -> Result<PriceComputation> {
        let url = self.url(&format!("price/{}", price_id));
        let value = self.transport.request_json(JsonRequest::get(&url)).await?;
        decode(&url, value)
    }

    /// `POST /cart`
    pub async fn create_cart(&self, request: &CartRequest) -> Result<CartCreated> {
        let url = self.url("cart");
        let value = self
            .transport
            .request_json(JsonRequest::post(&url, encode(request)?))
            .await?;
        decode(&url, value)
    }

    /// `POST /offer`
    pub async fn create_offer(&self, request: &OfferRequest) -> Result<OfferCreated> {
        let url = self.url("offer");
        let value = self
            .transport
            .request_json(JsonRequest::post(&url, encode(request)?))
            .await?;
        decode(&url, value)
    }

    /// Put the chosen option in a cart, make an offer of it and return the
    /// web URL where the order can be completed
    pub async fn create_cart_and_offer(
        &self,
        option: &QuoteOption,
        currency: Currency,
    ) -> Result<String> {
        let cart = self
            .create_cart(&CartRequest {
                quotes: vec![CartQuote {
                    id: option.quote.quote_id.clone(),
                }],
                shipping_ids: vec![option.shipping.shipping_id.clone()],
                currency,
            })
            .await?;

        let offer = self
            .create_offer(&OfferRequest {
                cart_id: cart.cart_id.clone(),
                expires: true,
            })
            .await?;
        info!(cart_id = %cart.cart_id, offer_id = %offer.offer_id, "created cart offer");

        Ok(format!("{}?cartId={}", self.cart_url, cart.cart_id))
    }

    /// `GET /health_check`
    pub async fn health_check(&self) -> Result<HealthStatus> {
        let url = self.url("health_check");
        let value = self.transport.request_json(JsonRequest::get(&url)).await?;
        decode(&url, value)
    }
}
