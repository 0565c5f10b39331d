//! Wire types for the storefront's JSON responses.
//!
//! Fields the flow never reads are kept as opaque [`serde_json::Value`] so
//! shape changes there cannot break a checkout.

use autocart_core::de::string_or_number;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One purchasable variant from the product page's `productVariants` array.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProductVariant {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: serde_json::Value,
}

/// The line item returned by `/cart/add.js`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CartLine {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "autocart_core::de::opt_string_or_number")]
    pub variant_id: Option<String>,
    pub title: String,
    /// Unit price in minor currency units.
    pub price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Value,
    #[serde(default)]
    pub discounts: serde_json::Value,
}

fn default_quantity() -> u32 {
    1
}

impl CartLine {
    /// Unit price in major units, e.g. `11000` becomes `110.00`.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        Decimal::new(self.price, 2)
    }
}

/// Totals the checkout would show if this rate were chosen.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateCheckoutTotals {
    pub total_tax: Decimal,
    pub total_price: Decimal,
    pub subtotal_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShippingRate {
    pub id: String,
    pub price: Decimal,
    pub title: String,
    pub checkout: RateCheckoutTotals,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShippingRatesResponse {
    #[serde(default)]
    pub shipping_rates: Vec<ShippingRate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentSessionResponse {
    #[serde(default)]
    pub id: Option<String>,
}
