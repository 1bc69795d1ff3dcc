//! Conversion of store records into the unified [`CatalogItem`] shape.

use crate::config::SEALED_LABEL;
use crate::models::{CatalogBundle, CatalogItem, CatalogSingle, ItemOrigin, TrendSet};

/// Normalize a single. The display price follows raw market, then graded
/// market; trends come from whichever quote supplied it.
pub fn normalize_single(single: CatalogSingle) -> CatalogItem {
    let (display_price, trends) = match single.priced_quote() {
        Some(quote) => (quote.market, quote.trends.clone()),
        None => (None, TrendSet::new()),
    };
    CatalogItem {
        id: single.id.clone(),
        display_name: single.display_name(),
        group_id: single.group_id.clone(),
        group_name: single.group_name.clone(),
        label: single.rarity.clone(),
        image_url: single.image_url.clone(),
        display_price,
        trends,
        origin: ItemOrigin::Single(single),
    }
}

/// Normalize a sealed product, converting its market price with `rate`.
pub fn normalize_bundle(bundle: CatalogBundle, rate: f64) -> CatalogItem {
    CatalogItem {
        id: bundle.id.clone(),
        display_name: bundle.name.clone(),
        group_id: bundle.group_id.clone(),
        group_name: bundle.group_name.clone(),
        label: Some(SEALED_LABEL.to_string()),
        image_url: bundle.image_url.clone(),
        display_price: bundle.display_price(rate),
        trends: TrendSet::new(),
        origin: ItemOrigin::Bundle(bundle),
    }
}
