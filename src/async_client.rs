//! Async wrapper around [`CardvaultSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! [`search_latest`](AsyncCardvaultSdk::search_latest) adds supersession:
//! when a newer search is issued before an older one resolves, the older
//! result is discarded instead of being returned.
//!
//! # Example
//!
//! ```no_run
//! use cardvault_sdk::AsyncCardvaultSdk;
//! use cardvault_sdk::queries::QueryContext;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncCardvaultSdk::builder().build().await.unwrap();
//!
//!     let page = sdk.search(QueryContext::text("Pikachu")).await.unwrap();
//!     println!("{} of {}", page.len(), page.total);
//!
//!     // Only the newest of several keystroke searches is delivered.
//!     let stale = sdk.search_latest(QueryContext::text("Pika"));
//!     let fresh = sdk.search_latest(QueryContext::text("Pikachu"));
//!     assert!(stale.await.unwrap().is_none());
//!     assert!(fresh.await.unwrap().is_some());
//! }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::models::CatalogResultPage;
use crate::queries::QueryContext;
use crate::supersede::SearchSlot;
use crate::{CardvaultSdk, CardvaultSdkBuilder};

fn join_error(e: tokio::task::JoinError) -> CatalogError {
    CatalogError::Internal(format!("Task join error: {e}"))
}

// ---------------------------------------------------------------------------
// AsyncCardvaultSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncCardvaultSdk`] instance.
#[derive(Default)]
pub struct AsyncCardvaultSdkBuilder {
    inner: CardvaultSdkBuilder,
}

impl AsyncCardvaultSdkBuilder {
    pub fn config(mut self, config: CatalogConfig) -> Self {
        self.inner = self.inner.config(config);
        self
    }

    /// Load configuration from a JSON file.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.config_file(path);
        self
    }

    /// Set a custom snapshot cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.cache_dir(path);
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.inner = self.inner.offline(offline);
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Override the sealed-product currency multiplier.
    pub fn conversion_rate(mut self, rate: f64) -> Self {
        self.inner = self.inner.conversion_rate(rate);
        self
    }

    /// Replace the excluded-category tokens.
    pub fn excluded_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner = self.inner.excluded_tokens(tokens);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.inner = self.inner.page_size(page_size);
        self
    }

    /// Query the hosted Supabase tables instead of local snapshots.
    pub fn supabase(mut self, url: &str, api_key: &str) -> Self {
        self.inner = self.inner.supabase(url, api_key);
        self
    }

    /// Build the async SDK.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncCardvaultSdk> {
        let inner = self.inner;
        let sdk = tokio::task::spawn_blocking(move || inner.build())
            .await
            .map_err(join_error)??;
        Ok(AsyncCardvaultSdk::new(sdk))
    }
}

// ---------------------------------------------------------------------------
// AsyncCardvaultSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`CardvaultSdk`].
///
/// Cloning is cheap; clones share the SDK and the [`SearchSlot`], so a
/// search issued through any clone supersedes older ones from the others.
#[derive(Clone)]
pub struct AsyncCardvaultSdk {
    inner: Arc<CardvaultSdk>,
    slot: SearchSlot,
}

impl AsyncCardvaultSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncCardvaultSdkBuilder {
        AsyncCardvaultSdkBuilder::default()
    }

    /// Wrap an already built SDK.
    pub fn new(sdk: CardvaultSdk) -> Self {
        Self {
            inner: Arc::new(sdk),
            slot: SearchSlot::new(),
        }
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// ```no_run
    /// # use cardvault_sdk::AsyncCardvaultSdk;
    /// # async fn example() -> cardvault_sdk::Result<()> {
    /// # let sdk = AsyncCardvaultSdk::builder().build().await?;
    /// let groups = sdk.run(|s| s.groups()).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&CardvaultSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&sdk))
            .await
            .map_err(join_error)?
    }

    /// Run one search. Never superseded.
    pub async fn search(&self, ctx: QueryContext) -> Result<CatalogResultPage> {
        self.run(move |s| s.search(&ctx)).await
    }

    /// Run a search that is superseded by any later `search_latest` call.
    ///
    /// The ticket is taken when this method is called, not when the future is
    /// first polled, so call order decides which search is newest. Resolves
    /// to `Ok(None)` if a newer search was issued before this one finished;
    /// a superseded search's error is discarded the same way.
    pub fn search_latest(
        &self,
        ctx: QueryContext,
    ) -> impl Future<Output = Result<Option<CatalogResultPage>>> + Send + 'static {
        let ticket = self.slot.issue();
        let slot = self.slot.clone();
        let sdk = Arc::clone(&self.inner);

        async move {
            let result = tokio::task::spawn_blocking(move || sdk.search(&ctx))
                .await
                .map_err(join_error)?;
            if !slot.is_current(ticket) {
                debug!(generation = ticket.generation(), "discarding superseded search");
                return Ok(None);
            }
            result.map(Some)
        }
    }

    /// Supersede any in-flight [`search_latest`](Self::search_latest) call.
    pub fn cancel_pending(&self) {
        self.slot.cancel();
    }

    pub fn slot(&self) -> &SearchSlot {
        &self.slot
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |s| s.sql(&query, &params)).await
    }

    /// Check for a newer snapshot and reset tables if stale.
    pub async fn refresh(&self) -> Result<bool> {
        self.run(|s| s.refresh()).await
    }

    /// Access the wrapped sync SDK.
    pub fn sdk(&self) -> &CardvaultSdk {
        &self.inner
    }
}
