use serde::{Deserialize, Serialize};

use super::bundle::CatalogBundle;
use super::page::SourceKind;
use super::single::{CatalogSingle, TrendSet};

// ---------------------------------------------------------------------------
// ItemOrigin: the record a catalog item was normalized from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ItemOrigin {
    Single(CatalogSingle),
    Bundle(CatalogBundle),
}

impl ItemOrigin {
    pub fn source(&self) -> SourceKind {
        match self {
            ItemOrigin::Single(_) => SourceKind::Singles,
            ItemOrigin::Bundle(_) => SourceKind::Bundles,
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogItem: unified read shape for singles and sealed products
// ---------------------------------------------------------------------------

/// One entry of a result page.
///
/// The common fields are filled for both kinds; anything specific to a
/// single or a bundle is reached through [`origin`](Self::origin).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub display_name: String,
    pub group_id: String,
    pub group_name: String,
    /// Rarity for singles, `"Sealed"` for bundles.
    pub label: Option<String>,
    pub image_url: Option<String>,
    /// Price in display currency, `None` when unavailable.
    pub display_price: Option<f64>,
    /// Trends of the quote that supplied the display price.
    pub trends: TrendSet,
    pub origin: ItemOrigin,
}

impl CatalogItem {
    pub fn source(&self) -> SourceKind {
        self.origin.source()
    }

    pub fn as_single(&self) -> Option<&CatalogSingle> {
        match &self.origin {
            ItemOrigin::Single(single) => Some(single),
            ItemOrigin::Bundle(_) => None,
        }
    }

    pub fn as_bundle(&self) -> Option<&CatalogBundle> {
        match &self.origin {
            ItemOrigin::Bundle(bundle) => Some(bundle),
            ItemOrigin::Single(_) => None,
        }
    }
}
