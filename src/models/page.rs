use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::CatalogItem;

/// The two record sets the catalog is queried from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Singles,
    Bundles,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Singles => f.write_str("singles"),
            SourceKind::Bundles => f.write_str("bundles"),
        }
    }
}

/// A source whose fetch failed while the page was assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub message: String,
}

/// A query parameter that was replaced before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub field: String,
    pub requested: String,
    pub applied: String,
}

impl Correction {
    pub fn new(field: &str, requested: impl ToString, applied: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            requested: requested.to_string(),
            applied: applied.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogResultPage
// ---------------------------------------------------------------------------

/// One page of merged search results.
///
/// An empty `items` list with `partial == false` means nothing matched; a
/// lookup where every source failed is reported as
/// [`CatalogError::AllSourcesFailed`](crate::CatalogError::AllSourcesFailed)
/// instead of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResultPage {
    /// Singles first, then bundles, each in fetch order.
    pub items: Vec<CatalogItem>,
    /// Sum of the server-reported totals of the sources that answered.
    pub total: u64,
    pub page: usize,
    pub has_more: bool,
    pub partial: bool,
    pub errors: Vec<SourceFailure>,
    pub corrections: Vec<Correction>,
}

impl CatalogResultPage {
    pub fn empty(page: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page,
            has_more: false,
            partial: false,
            errors: Vec::new(),
            corrections: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
