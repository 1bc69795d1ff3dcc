use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de::{as_price, list_field, opt_string_or_number, string_or_number};
use crate::error::Result;

// ---------------------------------------------------------------------------
// TrendWindow / TrendSet: short-term price movement
// ---------------------------------------------------------------------------

/// Lookback windows for which the pricing feed reports a percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrendWindow {
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "7d")]
    Day7,
    #[serde(rename = "14d")]
    Day14,
    #[serde(rename = "30d")]
    Day30,
    #[serde(rename = "90d")]
    Day90,
    #[serde(rename = "180d")]
    Day180,
}

impl TrendWindow {
    pub const ALL: [TrendWindow; 6] = [
        TrendWindow::Day1,
        TrendWindow::Day7,
        TrendWindow::Day14,
        TrendWindow::Day30,
        TrendWindow::Day90,
        TrendWindow::Day180,
    ];

    pub fn days(self) -> u32 {
        match self {
            TrendWindow::Day1 => 1,
            TrendWindow::Day7 => 7,
            TrendWindow::Day14 => 14,
            TrendWindow::Day30 => 30,
            TrendWindow::Day90 => 90,
            TrendWindow::Day180 => 180,
        }
    }
}

impl fmt::Display for TrendWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.days())
    }
}

/// Percentage changes keyed by lookback window. Windows the feed did not
/// report are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendSet(BTreeMap<TrendWindow, f64>);

impl TrendSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, window: TrendWindow, pct: f64) {
        self.0.insert(window, pct);
    }

    pub fn get(&self, window: TrendWindow) -> Option<f64> {
        self.0.get(&window).copied()
    }

    pub fn seven_day(&self) -> Option<f64> {
        self.get(TrendWindow::Day7)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrendWindow, f64)> + '_ {
        self.0.iter().map(|(w, v)| (*w, *v))
    }
}

// ---------------------------------------------------------------------------
// PriceQuote
// ---------------------------------------------------------------------------

/// One price quote (ungraded or graded) for a single.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub market: Option<f64>,
    #[serde(default)]
    pub trends: TrendSet,
}

impl PriceQuote {
    /// Build a quote from `{prefix}_market` and `{prefix}_change_{N}d` columns.
    ///
    /// Returns `None` when the row carries none of those columns.
    fn from_columns(columns: &Map<String, Value>, prefix: &str) -> Option<Self> {
        let market = as_price(columns.get(&format!("{}_market", prefix)));
        let mut trends = TrendSet::new();
        for window in TrendWindow::ALL {
            let key = format!("{}_change_{}", prefix, window);
            if let Some(pct) = as_price(columns.get(&key)) {
                trends.insert(window, pct);
            }
        }
        if market.is_none() && trends.is_empty() {
            None
        } else {
            Some(Self { market, trends })
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogSingle
// ---------------------------------------------------------------------------

/// Store row shape: scalar attributes plus flat price columns.
#[derive(Deserialize)]
struct SingleRow {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    number: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    group_id: String,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    rarity: Option<String>,
    #[serde(default)]
    supertype: Option<String>,
    #[serde(default, deserialize_with = "list_field")]
    types: Vec<String>,
    #[serde(default, deserialize_with = "list_field")]
    subtypes: Vec<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default, deserialize_with = "list_field")]
    weaknesses: Vec<String>,
    #[serde(default, deserialize_with = "list_field")]
    resistances: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(flatten)]
    price_columns: Map<String, Value>,
}

/// A single collectible card as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSingle {
    pub id: String,
    pub name: String,
    pub number: Option<String>,
    pub group_id: String,
    pub group_name: String,
    pub rarity: Option<String>,
    /// Top-level category (e.g. `Pokémon`, `Trainer`, `Energy`).
    pub supertype: Option<String>,
    pub types: Vec<String>,
    pub subtypes: Vec<String>,
    pub artist: Option<String>,
    pub weaknesses: Vec<String>,
    pub resistances: Vec<String>,
    pub image_url: Option<String>,
    pub raw: Option<PriceQuote>,
    pub graded: Option<PriceQuote>,
}

impl CatalogSingle {
    /// Decode a store row (snapshot table or REST response object).
    pub fn from_row(row: Value) -> Result<Self> {
        let row: SingleRow = serde_json::from_value(row)?;
        let raw = PriceQuote::from_columns(&row.price_columns, "raw");
        let graded = PriceQuote::from_columns(&row.price_columns, "graded");
        Ok(Self {
            id: row.id,
            name: row.name,
            number: row.number,
            group_id: row.group_id,
            group_name: row.group_name.unwrap_or_default(),
            rarity: row.rarity,
            supertype: row.supertype,
            types: row.types,
            subtypes: row.subtypes,
            artist: row.artist,
            weaknesses: row.weaknesses,
            resistances: row.resistances,
            image_url: row.image_url,
            raw,
            graded,
        })
    }

    /// `"<name> #<number>"` when the card has a number, else just the name.
    pub fn display_name(&self) -> String {
        match self.number.as_deref() {
            Some(number) if !number.is_empty() => format!("{} #{}", self.name, number),
            _ => self.name.clone(),
        }
    }

    /// The quote that supplies the display price: raw when it has a market
    /// value, else graded when it has one.
    pub fn priced_quote(&self) -> Option<&PriceQuote> {
        self.raw
            .as_ref()
            .filter(|q| q.market.is_some())
            .or_else(|| self.graded.as_ref().filter(|q| q.market.is_some()))
    }

    pub fn display_price(&self) -> Option<f64> {
        self.priced_quote().and_then(|q| q.market)
    }
}
