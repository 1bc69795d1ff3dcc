use serde::{Deserialize, Serialize};

use super::de::{as_price, string_or_number};
use crate::config::DISPLAY_CURRENCY;
use crate::error::Result;

// ---------------------------------------------------------------------------
// BundlePrice
// ---------------------------------------------------------------------------

/// Price points for a sealed product, in the feed's source currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundlePrice {
    pub market: Option<f64>,
    pub low: Option<f64>,
    pub mid: Option<f64>,
    pub high: Option<f64>,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// CatalogBundle
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct BundleRow {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(deserialize_with = "string_or_number")]
    group_id: String,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    market_price: Option<serde_json::Value>,
    #[serde(default)]
    low_price: Option<serde_json::Value>,
    #[serde(default)]
    mid_price: Option<serde_json::Value>,
    #[serde(default)]
    high_price: Option<serde_json::Value>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

/// A sealed product (booster box, tin, collection box, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogBundle {
    pub id: String,
    pub name: String,
    pub group_id: String,
    pub group_name: String,
    pub price: BundlePrice,
    pub image_url: Option<String>,
}

impl CatalogBundle {
    /// Decode a store row (snapshot table or REST response object).
    ///
    /// Rows without a `currency` column are assumed to be quoted in EUR.
    pub fn from_row(row: serde_json::Value) -> Result<Self> {
        let row: BundleRow = serde_json::from_value(row)?;
        Ok(Self {
            id: row.id,
            name: row.name,
            group_id: row.group_id,
            group_name: row.group_name.unwrap_or_default(),
            price: BundlePrice {
                market: as_price(row.market_price.as_ref()),
                low: as_price(row.low_price.as_ref()),
                mid: as_price(row.mid_price.as_ref()),
                high: as_price(row.high_price.as_ref()),
                currency: row.currency.unwrap_or_else(|| "EUR".to_string()),
            },
            image_url: row.image_url,
        })
    }

    /// Market price in [`DISPLAY_CURRENCY`], rounded to cents.
    ///
    /// `rate` converts from the row's currency; rows already quoted in the
    /// display currency are not converted.
    pub fn display_price(&self, rate: f64) -> Option<f64> {
        let rate = if self.price.currency.eq_ignore_ascii_case(DISPLAY_CURRENCY) {
            1.0
        } else {
            rate
        };
        self.price.market.map(|market| round_cents(market * rate))
    }
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
