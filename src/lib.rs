//! Cardvault SDK for Rust.
//!
//! Search a trading-card catalog of singles and sealed products. Results from
//! both record sets are merged into one paginated list of [`CatalogItem`]s
//! with a uniform display name, label and price.
//!
//! Two backends answer the same queries: local catalog snapshots loaded into
//! an in-process DuckDB (the default), or the hosted Supabase REST API.
//!
//! # Quick start
//!
//! ```no_run
//! use cardvault_sdk::CardvaultSdk;
//! use cardvault_sdk::queries::QueryContext;
//!
//! let sdk = CardvaultSdk::builder().build().unwrap();
//!
//! let page = sdk.search(&QueryContext::text("Charizard")).unwrap();
//! for item in &page.items {
//!     println!("{} {:?}", item.display_name, item.display_price);
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod queries;
pub mod rest;
pub mod sql_builder;
pub mod supersede;

#[cfg(feature = "async")]
pub use async_client::AsyncCardvaultSdk;
pub use cache::SnapshotCache;
pub use config::CatalogConfig;
pub use connection::Connection;
pub use error::{CatalogError, Result};
pub use models::{CatalogItem, CatalogResultPage};
pub use pipeline::CatalogPipeline;
pub use sql_builder::SqlBuilder;
pub use supersede::{SearchSlot, SearchTicket};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use config::SupabaseConfig;
use models::{CatalogBundle, CatalogGroup, CatalogSingle};
use queries::{BundlesQuery, FilterDimension, QueryContext, Scope, SinglesQuery};
use rest::SupabaseStore;

// ---------------------------------------------------------------------------
// CardvaultSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CardvaultSdk`] instance.
///
/// Settings are layered: an explicit [`config`](Self::config) (or the file
/// given to [`config_file`](Self::config_file), or the user's default config
/// file) provides the base, and the individual setters override it.
pub struct CardvaultSdkBuilder {
    config: Option<CatalogConfig>,
    config_file: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    conversion_rate: Option<f64>,
    excluded_tokens: Option<Vec<String>>,
    page_size: Option<usize>,
    supabase: Option<SupabaseConfig>,
}

impl Default for CardvaultSdkBuilder {
    fn default() -> Self {
        Self {
            config: None,
            config_file: None,
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(30),
            conversion_rate: None,
            excluded_tokens: None,
            page_size: None,
            supabase: None,
        }
    }
}

impl CardvaultSdkBuilder {
    /// Start from an already loaded configuration.
    pub fn config(mut self, config: CatalogConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the base configuration from a JSON file at build time.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set a custom snapshot cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used
    /// (e.g. `~/.cache/cardvault-sdk` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Never download snapshots; use cached or installed files only.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP timeout for snapshot downloads and REST fetches.
    ///
    /// Defaults to 30 seconds. A REST fetch that times out counts as a
    /// failure of that source only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the sealed-product currency multiplier.
    pub fn conversion_rate(mut self, rate: f64) -> Self {
        self.conversion_rate = Some(rate);
        self
    }

    /// Replace the excluded-category tokens.
    pub fn excluded_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Default page size for requests that do not set one.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Query the hosted Supabase tables instead of local snapshots.
    pub fn supabase(mut self, url: &str, api_key: &str) -> Self {
        self.supabase = Some(SupabaseConfig {
            url: url.to_string(),
            api_key: api_key.to_string(),
            singles_table: "singles".to_string(),
            bundles_table: "bundles".to_string(),
        });
        self
    }

    fn resolve_config(&mut self) -> Result<CatalogConfig> {
        let mut config = match (self.config.take(), self.config_file.take()) {
            (Some(config), _) => config,
            (None, Some(path)) => CatalogConfig::load(path)?,
            (None, None) => CatalogConfig::load_default()?,
        };
        if let Some(rate) = self.conversion_rate {
            config.conversion_rate = rate;
        }
        if let Some(tokens) = self.excluded_tokens.take() {
            config.excluded_tokens = tokens;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(supabase) = self.supabase.take() {
            config.supabase = Some(supabase);
        }
        Ok(config)
    }

    /// Build the SDK.
    ///
    /// For the snapshot backend this opens the DuckDB database but does
    /// **not** download anything eagerly; snapshots are fetched on first query.
    pub fn build(mut self) -> Result<CardvaultSdk> {
        let config = self.resolve_config()?;

        if let Some(supabase) = &config.supabase {
            let store = Arc::new(SupabaseStore::new(supabase, self.timeout)?);
            let pipeline = CatalogPipeline::from_config(
                Box::new(store.singles()),
                Box::new(store.bundles()),
                &config,
            );
            return Ok(CardvaultSdk {
                pipeline,
                conn: None,
                config,
            });
        }

        let cache = SnapshotCache::new(
            self.cache_dir,
            &config.snapshot_url,
            self.offline,
            self.timeout,
        )?;
        let conn = Arc::new(Connection::new(cache)?);
        Ok(CardvaultSdk::with_connection(conn, config))
    }
}

// ---------------------------------------------------------------------------
// CardvaultSdk
// ---------------------------------------------------------------------------

/// The main entry point for the Cardvault SDK.
///
/// Owns the [`CatalogPipeline`] and, for the snapshot backend, the shared
/// DuckDB [`Connection`]. `CardvaultSdk` is `Send + Sync`; wrap it in an
/// `Arc` to search from several threads.
pub struct CardvaultSdk {
    pipeline: CatalogPipeline,
    conn: Option<Arc<Connection>>,
    config: CatalogConfig,
}

impl CardvaultSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> CardvaultSdkBuilder {
        CardvaultSdkBuilder::default()
    }

    /// Build an SDK over an existing snapshot connection.
    pub fn with_connection(conn: Arc<Connection>, config: CatalogConfig) -> Self {
        let pipeline = CatalogPipeline::from_config(
            Box::new(SinglesQuery::new(Arc::clone(&conn))),
            Box::new(BundlesQuery::new(Arc::clone(&conn))),
            &config,
        );
        Self {
            pipeline,
            conn: Some(conn),
            config,
        }
    }

    /// Build an SDK around a custom pipeline (custom sources, no snapshot
    /// connection).
    pub fn with_pipeline(pipeline: CatalogPipeline, config: CatalogConfig) -> Self {
        Self {
            pipeline,
            conn: None,
            config,
        }
    }

    // -- Search ------------------------------------------------------------

    /// Run one catalog search.
    ///
    /// Returns [`CatalogError::AllSourcesFailed`] only when every requested
    /// source failed; a single failing source yields a `partial` page.
    pub fn search(&self, ctx: &QueryContext) -> Result<CatalogResultPage> {
        self.pipeline.search(ctx)
    }

    pub fn pipeline(&self) -> &CatalogPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    // -- Snapshot-backed queries -------------------------------------------

    fn snapshot(&self, operation: &str) -> Result<&Arc<Connection>> {
        self.conn.as_ref().ok_or_else(|| {
            CatalogError::Unsupported(format!("{} requires the snapshot backend", operation))
        })
    }

    /// Access the singles query interface.
    pub fn singles(&self) -> Result<SinglesQuery> {
        Ok(SinglesQuery::new(Arc::clone(self.snapshot("singles()")?)))
    }

    /// Access the sealed product query interface.
    pub fn bundles(&self) -> Result<BundlesQuery> {
        Ok(BundlesQuery::new(Arc::clone(self.snapshot("bundles()")?)))
    }

    /// Distinct values available for a filter dimension.
    pub fn filter_values(&self, dimension: FilterDimension, scope: &Scope) -> Result<Vec<String>> {
        self.singles()?.filter_values(dimension, scope)
    }

    /// Browsable groups with their single counts.
    pub fn groups(&self) -> Result<Vec<CatalogGroup>> {
        self.singles()?.groups()
    }

    pub fn get_single(&self, id: &str) -> Result<Option<CatalogSingle>> {
        self.singles()?.get(id)
    }

    pub fn get_bundle(&self, id: &str) -> Result<Option<CatalogBundle>> {
        self.bundles()?.get(id)
    }

    /// Execute a raw SQL query against the snapshot database.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(&self, query: &str, params: &[String]) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.snapshot("sql()")?.execute(query, params)
    }

    /// Names of the snapshot tables loaded so far.
    pub fn tables(&self) -> Vec<String> {
        self.conn.as_ref().map(|c| c.tables()).unwrap_or_default()
    }

    /// Check for a newer snapshot and reset loaded tables if stale.
    ///
    /// Returns `true` if the data was stale (subsequent queries reload it).
    pub fn refresh(&self) -> Result<bool> {
        let conn = self.snapshot("refresh()")?;
        let stale = connection::lock(&conn.cache)?.is_stale()?;
        if stale {
            connection::lock(&conn.cache)?.clear()?;
            conn.reset_tables()?;
            info!("catalog snapshot was stale; cache cleared and tables reset");
        }
        Ok(stale)
    }

    /// Return the snapshot connection, if this SDK uses one.
    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.conn.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CardvaultSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.conn {
            Some(conn) => {
                let cache_dir = conn
                    .cache
                    .lock()
                    .map(|c| c.cache_dir.display().to_string())
                    .unwrap_or_default();
                write!(
                    f,
                    "CardvaultSdk(snapshot, cache_dir={}, tables=[{}])",
                    cache_dir,
                    self.tables().join(", ")
                )
            }
            None => match &self.config.supabase {
                Some(supabase) => write!(f, "CardvaultSdk(supabase, url={})", supabase.url),
                None => f.write_str("CardvaultSdk(custom)"),
            },
        }
    }
}
