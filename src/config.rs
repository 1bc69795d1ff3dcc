//! Constants and file-backed configuration for the catalog SDK.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const SNAPSHOT_BASE: &str = "https://data.cardvault.app/catalog/v1";

/// Default number of records requested per source and page.
pub const DEFAULT_PAGE_SIZE: usize = 30;

/// Largest page size a search accepts. Larger requests are clamped and
/// reported as a correction.
pub const MAX_PAGE_SIZE: usize = 250;

/// Multiplier applied to sealed-product prices, which are quoted in EUR by
/// the upstream pricing feed, to display them in USD.
pub const EUR_TO_USD: f64 = 1.08;

/// Currency every `display_price` is expressed in.
pub const DISPLAY_CURRENCY: &str = "USD";

/// Fixed category label carried by every sealed product.
pub const SEALED_LABEL: &str = "Sealed";

/// Singles whose group or display name contain one of these tokens
/// (case-insensitive) are never returned.
pub const DEFAULT_EXCLUDED_TOKENS: &[&str] = &["Code Card", "Jumbo"];

/// Snapshot tables known to the cache, with their file names on the CDN.
pub fn snapshot_files() -> [(&'static str, &'static str); 2] {
    [
        ("singles", "singles.ndjson.gz"),
        ("bundles", "bundles.ndjson.gz"),
    ]
}

pub fn snapshot_file(table: &str) -> Option<&'static str> {
    snapshot_files()
        .into_iter()
        .find(|(name, _)| *name == table)
        .map(|(_, file)| file)
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("cardvault-sdk")
    } else {
        PathBuf::from(".cardvault-sdk-cache")
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cardvault-sdk").join("config.json"))
}

// ---------------------------------------------------------------------------
// CatalogConfig
// ---------------------------------------------------------------------------

/// Connection settings for the hosted Supabase REST backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_singles_table")]
    pub singles_table: String,
    #[serde(default = "default_bundles_table")]
    pub bundles_table: String,
}

fn default_singles_table() -> String {
    "singles".to_string()
}

fn default_bundles_table() -> String {
    "bundles".to_string()
}

/// Tunables for the catalog pipeline and its backends.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides:
///
/// ```json
/// { "conversion_rate": 1.1, "excluded_tokens": ["Jumbo"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub page_size: usize,
    pub conversion_rate: f64,
    pub excluded_tokens: Vec<String>,
    pub snapshot_url: String,
    pub supabase: Option<SupabaseConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            conversion_rate: EUR_TO_USD,
            excluded_tokens: DEFAULT_EXCLUDED_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            snapshot_url: SNAPSHOT_BASE.to_string(),
            supabase: None,
        }
    }
}

impl CatalogConfig {
    /// Parse a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    /// Read the config at [`default_config_path`], falling back to defaults
    /// when no file exists there.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }
}
