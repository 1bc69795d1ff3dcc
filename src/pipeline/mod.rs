//! The catalog search pipeline.
//!
//! One [`search`](CatalogPipeline::search) call plans the per-source fetches,
//! runs the singles and bundles fetches concurrently, normalizes both record
//! kinds into [`CatalogItem`]s and merges them into a single page:
//!
//! 1. blank text with `require_text` short-circuits to an empty page;
//! 2. each requested source is fetched with its own page budget;
//! 3. excluded singles are dropped, the rest normalized;
//! 4. singles then bundles are concatenated, first occurrence of an id wins;
//! 5. `total` sums the server-reported totals of the sources that answered.
//!
//! A failing source is recorded on the page (`partial`, `errors`) and the
//! other source's results are still returned. Only when every requested
//! source fails does `search` return [`CatalogError::AllSourcesFailed`].

pub mod exclusion;
pub mod normalize;
pub mod plan;

use std::collections::HashSet;
use std::thread;

use tracing::{debug, warn};

use crate::config::{CatalogConfig, DEFAULT_PAGE_SIZE, EUR_TO_USD};
use crate::error::{CatalogError, Result};
use crate::models::{CatalogItem, CatalogResultPage, SourceFailure, SourceKind};
use crate::queries::context::QueryContext;
use crate::queries::source::{BundlesSource, CatalogSource, FetchRequest, SinglesSource, SourcePage};

pub use exclusion::ExclusionList;
pub use normalize::{normalize_bundle, normalize_single};
pub use plan::{plan, SearchPlan};

/// Merges singles and sealed products into paginated search results.
pub struct CatalogPipeline {
    singles: Box<SinglesSource>,
    bundles: Box<BundlesSource>,
    conversion_rate: f64,
    exclusions: ExclusionList,
    default_page_size: usize,
}

impl CatalogPipeline {
    /// Create a pipeline over two sources with default settings.
    pub fn new(singles: Box<SinglesSource>, bundles: Box<BundlesSource>) -> Self {
        Self {
            singles,
            bundles,
            conversion_rate: EUR_TO_USD,
            exclusions: ExclusionList::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create a pipeline using the rate, exclusions and page size of `config`.
    pub fn from_config(
        singles: Box<SinglesSource>,
        bundles: Box<BundlesSource>,
        config: &CatalogConfig,
    ) -> Self {
        Self::new(singles, bundles)
            .with_conversion_rate(config.conversion_rate)
            .with_exclusions(ExclusionList::new(&config.excluded_tokens))
            .with_default_page_size(config.page_size)
    }

    /// Override the sealed-product currency multiplier.
    pub fn with_conversion_rate(mut self, rate: f64) -> Self {
        self.conversion_rate = rate;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Page size used when a request asks for zero.
    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    pub fn conversion_rate(&self) -> f64 {
        self.conversion_rate
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// Run one search and assemble its result page.
    pub fn search(&self, ctx: &QueryContext) -> Result<CatalogResultPage> {
        let plan = plan::plan(ctx, self.default_page_size);

        if ctx.require_text && ctx.search_text().is_none() {
            let mut page = CatalogResultPage::empty(plan.page);
            page.corrections = plan.corrections;
            return Ok(page);
        }

        let (singles, bundles) = self.dispatch(&plan);

        let mut items: Vec<CatalogItem> = Vec::new();
        let mut total: u64 = 0;
        let mut errors: Vec<SourceFailure> = Vec::new();

        match singles {
            Some(Ok(page)) => {
                total += page.total;
                let before = page.records.len();
                items.extend(
                    page.records
                        .into_iter()
                        .filter(|single| !self.exclusions.excludes(single))
                        .map(normalize_single),
                );
                let excluded = before - items.len();
                if excluded > 0 {
                    debug!(excluded, "dropped excluded singles");
                }
            }
            Some(Err(e)) => errors.push(failure(SourceKind::Singles, &e)),
            None => {}
        }

        match bundles {
            Some(Ok(page)) => {
                total += page.total;
                let rate = self.conversion_rate;
                items.extend(
                    page.records
                        .into_iter()
                        .map(|bundle| normalize_bundle(bundle, rate)),
                );
            }
            Some(Err(e)) => errors.push(failure(SourceKind::Bundles, &e)),
            None => {}
        }

        if plan.source_count() > 0 && errors.len() == plan.source_count() {
            return Err(CatalogError::AllSourcesFailed { failures: errors });
        }

        let mut seen = HashSet::with_capacity(items.len());
        items.retain(|item| seen.insert(item.id.clone()));

        let has_more = (plan.page as u64).saturating_mul(plan.combined as u64) < total;

        Ok(CatalogResultPage {
            items,
            total,
            page: plan.page,
            has_more,
            partial: !errors.is_empty(),
            errors,
            corrections: plan.corrections,
        })
    }

    /// Issue the planned fetches. With both sources requested, the singles
    /// fetch runs on a scoped thread while bundles run on the caller's.
    #[allow(clippy::type_complexity)]
    fn dispatch(
        &self,
        plan: &SearchPlan,
    ) -> (
        Option<Result<SourcePage<crate::models::CatalogSingle>>>,
        Option<Result<SourcePage<crate::models::CatalogBundle>>>,
    ) {
        match (&plan.singles, &plan.bundles) {
            (Some(singles_req), Some(bundles_req)) => thread::scope(|scope| {
                let handle = scope.spawn(|| fetch(self.singles.as_ref(), singles_req));
                let bundles = fetch(self.bundles.as_ref(), bundles_req);
                let singles = handle.join().unwrap_or_else(|_| {
                    Err(CatalogError::Internal("singles fetch panicked".into()))
                });
                (Some(singles), Some(bundles))
            }),
            (Some(singles_req), None) => (Some(fetch(self.singles.as_ref(), singles_req)), None),
            (None, Some(bundles_req)) => (None, Some(fetch(self.bundles.as_ref(), bundles_req))),
            (None, None) => (None, None),
        }
    }
}

fn fetch<T>(
    source: &dyn CatalogSource<Record = T>,
    request: &FetchRequest,
) -> Result<SourcePage<T>> {
    debug!(
        source = %source.kind(),
        page = request.page,
        page_size = request.page_size,
        sort = %request.sort_key,
        "fetching catalog page"
    );
    source.fetch(request)
}

fn failure(source: SourceKind, error: &CatalogError) -> SourceFailure {
    warn!(%source, %error, "catalog source unavailable");
    SourceFailure {
        source,
        message: error.to_string(),
    }
}
