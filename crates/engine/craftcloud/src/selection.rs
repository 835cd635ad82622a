//! Pairing vendor quotes with shipping and picking the best options
//!
//! Every quote is paired with every shipping method of the same vendor. A
//! pair costs the quote price (raised to the vendor's minimum production
//! price) plus shipping, and takes the slow production time plus the upper
//! bound of the delivery range. Ties keep the pair seen first.

use crate::types::{PriceComputation, Quote, Shipping};
use tracing::{debug, warn};

/// One valid quote + shipping combination
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteOption {
    pub quote: Quote,
    pub shipping: Shipping,
    /// Production price (after the vendor minimum) plus shipping, tax included
    pub total_cost: f64,
    /// Slow production days plus the longest delivery estimate
    pub total_time: f64,
}

/// Cheapest and fastest options of a completed computation
///
/// Both are `None` when no quote has a matching shipping method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuoteSelection {
    pub cheapest: Option<QuoteOption>,
    pub fastest: Option<QuoteOption>,
}

impl QuoteSelection {
    pub fn is_empty(&self) -> bool {
        self.cheapest.is_none() && self.fastest.is_none()
    }
}

/// Upper bound in days of a delivery estimate like `"3-7"` or `"5"`
///
/// Takes the text after the last hyphen, en dash or em dash, trims it and
/// reads its leading digits, so `"3-7 days"` gives 7. Returns `None` when
/// there are no digits.
pub fn delivery_upper_bound(delivery_time: &str) -> Option<f64> {
    let upper = delivery_time.rsplit(is_range_dash).next()?.trim();
    let end = upper
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(upper.len());
    upper[..end].parse::<u32>().ok().map(f64::from)
}

fn is_range_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

/// All valid pairs, in quote order then shipping order
pub fn pair_options(computation: &PriceComputation) -> Vec<QuoteOption> {
    let mut options = Vec::new();

    for quote in &computation.quotes {
        let production_cost = quote
            .gross_price()
            .max(computation.minimum_price_for(&quote.vendor_id));

        for shipping in computation
            .shippings
            .iter()
            .filter(|s| s.vendor_id == quote.vendor_id)
        {
            let Some(delivery_days) = delivery_upper_bound(&shipping.delivery_time) else {
                warn!(
                    shipping_id = %shipping.shipping_id,
                    delivery_time = %shipping.delivery_time,
                    "skipping shipping with unreadable delivery time"
                );
                continue;
            };

            options.push(QuoteOption {
                quote: quote.clone(),
                shipping: shipping.clone(),
                total_cost: production_cost + shipping.gross_price(),
                total_time: quote.production_time_slow + delivery_days,
            });
        }
    }

    options
}

/// Pick the cheapest and the fastest pair
///
/// Only meaningful for a computation whose `all_complete` flag is set.
pub fn select_options(computation: &PriceComputation) -> QuoteSelection {
    let options = pair_options(computation);

    let mut cheapest: Option<&QuoteOption> = None;
    let mut fastest: Option<&QuoteOption> = None;

    for option in &options {
        if cheapest.map_or(true, |best| option.total_cost < best.total_cost) {
            cheapest = Some(option);
        }
        if fastest.map_or(true, |best| option.total_time < best.total_time) {
            fastest = Some(option);
        }
    }

    debug!(
        pairs = options.len(),
        cheapest = ?cheapest.map(|o| o.total_cost),
        fastest = ?fastest.map(|o| o.total_time),
        "selected quote options"
    );

    QuoteSelection {
        cheapest: cheapest.cloned(),
        fastest: fastest.cloned(),
    }
}
