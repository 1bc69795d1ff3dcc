//! The record-fetch seam between the pipeline and a backing store.

use crate::error::Result;
use crate::models::{CatalogBundle, CatalogSingle, SourceKind};

use super::context::{Filters, Scope, SortKey, SortOrder};

/// One paginated, filtered, sorted fetch against a single record set.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub scope: Scope,
    pub text: Option<String>,
    pub filters: Filters,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl FetchRequest {
    /// Rows to skip, saturating at the largest offset a BIGINT can hold.
    pub fn offset(&self) -> usize {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as usize)
    }
}

/// Records returned for one request plus the store's count of all matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePage<T> {
    pub records: Vec<T>,
    pub total: u64,
}

impl<T> SourcePage<T> {
    pub fn new(records: Vec<T>, total: u64) -> Self {
        Self { records, total }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total: 0,
        }
    }
}

/// A store that can answer [`FetchRequest`]s for one kind of record.
///
/// Implementations must be shareable across threads: the pipeline issues
/// the singles and bundles fetches concurrently.
pub trait CatalogSource: Send + Sync {
    type Record;

    fn kind(&self) -> SourceKind;

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<Self::Record>>;
}

pub type SinglesSource = dyn CatalogSource<Record = CatalogSingle>;
pub type BundlesSource = dyn CatalogSource<Record = CatalogBundle>;
