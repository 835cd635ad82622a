//! Wire types for the print-marketplace pricing API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Currencies accepted by the pricing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

/// Unit the uploaded mesh coordinates are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Mm,
    Cm,
    In,
}

impl LengthUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Mm => "mm",
            LengthUnit::Cm => "cm",
            LengthUnit::In => "in",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm" => Ok(LengthUnit::Mm),
            "cm" => Ok(LengthUnit::Cm),
            "in" | "inch" => Ok(LengthUnit::In),
            other => Err(format!("unsupported length unit: {}", other)),
        }
    }
}

/// One entry of the `POST /model` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedModel {
    pub model_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_unit: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Line item of a price request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequestModel {
    pub model_id: String,
    pub quantity: u32,
    pub scale: f64,
}

/// Body of `POST /price`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequest {
    pub currency: Currency,
    pub country_code: String,
    pub models: Vec<PriceRequestModel>,
    pub material_config_ids: Vec<String>,
}

/// Response of `POST /price`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRequestCreated {
    pub price_id: String,
}

/// A vendor's price to produce the requested item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_id: String,
    pub vendor_id: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub material_config_id: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_incl_vat: Option<f64>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub is_printable: bool,
    pub production_time_fast: f64,
    pub production_time_slow: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Quote {
    /// Tax-inclusive unit price
    pub fn gross_price(&self) -> f64 {
        self.price_incl_vat.unwrap_or(self.price)
    }
}

/// A vendor's shipping method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipping {
    pub shipping_id: String,
    pub vendor_id: String,
    #[serde(default)]
    pub name: String,
    /// Textual day range such as `"3-7"`
    pub delivery_time: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_incl_vat: Option<f64>,
    #[serde(default)]
    pub currency: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl Shipping {
    /// Tax-inclusive shipping price
    pub fn gross_price(&self) -> f64 {
        self.price_incl_vat.unwrap_or(self.price)
    }
}

/// Production price floor a vendor applies to an order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimumProductionPrice {
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_incl_vat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl MinimumProductionPrice {
    pub fn gross_price(&self) -> f64 {
        self.price_incl_vat.unwrap_or(self.price)
    }
}

/// Response of `GET /price/{priceId}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComputation {
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub all_complete: bool,
    /// Completion flag per vendor
    #[serde(default)]
    pub printing_service_complete: HashMap<String, bool>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default)]
    pub shippings: Vec<Shipping>,
    #[serde(default, deserialize_with = "per_vendor_minimums")]
    pub minimum_production_price: HashMap<String, MinimumProductionPrice>,
}

impl PriceComputation {
    /// Vendors that have not finished pricing yet, sorted
    pub fn pending_vendors(&self) -> Vec<&str> {
        let mut pending: Vec<&str> = self
            .printing_service_complete
            .iter()
            .filter(|(_, done)| !**done)
            .map(|(vendor, _)| vendor.as_str())
            .collect();
        pending.sort_unstable();
        pending
    }

    pub fn minimum_price_for(&self, vendor_id: &str) -> f64 {
        self.minimum_production_price
            .get(vendor_id)
            .map(MinimumProductionPrice::gross_price)
            .unwrap_or(0.0)
    }
}

/// The per-vendor map, skipping unreadable entries
///
/// A value that is not an object at all reads as "no minimums".
fn per_vendor_minimums<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, MinimumProductionPrice>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(HashMap::new());
    };

    let mut minimums = HashMap::with_capacity(entries.len());
    for (vendor_id, entry) in entries {
        match serde_json::from_value::<MinimumProductionPrice>(entry) {
            Ok(minimum) => {
                minimums.insert(vendor_id, minimum);
            }
            Err(e) => warn!(%vendor_id, error = %e, "ignoring unreadable minimum production price"),
        }
    }
    Ok(minimums)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartQuote {
    pub id: String,
}

/// Body of `POST /cart`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub quotes: Vec<CartQuote>,
    pub shipping_ids: Vec<String>,
    pub currency: Currency,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCreated {
    pub cart_id: String,
    #[serde(default)]
    pub est_delivery_time: Option<String>,
}

/// Body of `POST /offer`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub cart_id: String,
    pub expires: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferCreated {
    pub offer_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
