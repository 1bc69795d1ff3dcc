//! Turning a [`QueryContext`] into per-source fetch requests.

use crate::config::MAX_PAGE_SIZE;
use crate::models::Correction;
use crate::queries::context::{Filters, QueryContext, SortKey, SourceMode};
use crate::queries::source::FetchRequest;

/// The fetches one search will issue, after parameter normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    pub page: usize,
    /// Records requested from each source.
    pub per_source: usize,
    /// `per_source` times the number of sources the mode asks for.
    pub combined: usize,
    pub singles: Option<FetchRequest>,
    pub bundles: Option<FetchRequest>,
    pub corrections: Vec<Correction>,
}

impl SearchPlan {
    /// How many sources will be queried.
    pub fn source_count(&self) -> usize {
        usize::from(self.singles.is_some()) + usize::from(self.bundles.is_some())
    }
}

/// Normalize `ctx` into a plan.
///
/// Out-of-range or inapplicable parameters are replaced, never rejected.
/// Replacements that point at a caller mistake are listed in
/// `corrections`; the bundles sort fallback in `Both` mode is expected and
/// stays silent.
pub fn plan(ctx: &QueryContext, default_page_size: usize) -> SearchPlan {
    let mut corrections = Vec::new();

    let page = if ctx.page == 0 {
        corrections.push(Correction::new("page", 0, 1));
        1
    } else {
        ctx.page
    };

    let default_page_size = default_page_size.clamp(1, MAX_PAGE_SIZE);
    let page_size = match ctx.page_size {
        0 => {
            corrections.push(Correction::new("page_size", 0, default_page_size));
            default_page_size
        }
        n if n > MAX_PAGE_SIZE => {
            corrections.push(Correction::new("page_size", n, MAX_PAGE_SIZE));
            MAX_PAGE_SIZE
        }
        n => n,
    };

    let per_source = match ctx.mode {
        SourceMode::Both => (page_size / 2).max(1),
        SourceMode::Singles | SourceMode::Sealed => page_size,
    };

    let text = ctx.search_text().map(str::to_string);

    let singles = ctx.mode.wants_singles().then(|| {
        let sort_key = if ctx.sort_key.applies_to_singles() {
            ctx.sort_key
        } else {
            corrections.push(Correction::new("singles.sort_key", ctx.sort_key, SortKey::Number));
            SortKey::Number
        };
        FetchRequest {
            scope: ctx.scope.clone(),
            text: text.clone(),
            filters: ctx.filters.clone(),
            sort_key,
            sort_order: ctx.sort_order,
            page,
            page_size: per_source,
        }
    });

    let bundles = ctx.mode.wants_bundles().then(|| {
        let sort_key = if ctx.sort_key.applies_to_bundles() {
            ctx.sort_key
        } else {
            if ctx.mode != SourceMode::Both {
                corrections.push(Correction::new("bundles.sort_key", ctx.sort_key, SortKey::Name));
            }
            SortKey::Name
        };
        FetchRequest {
            scope: ctx.scope.clone(),
            text: text.clone(),
            filters: Filters::new(),
            sort_key,
            sort_order: ctx.sort_order,
            page,
            page_size: per_source,
        }
    });

    SearchPlan {
        page,
        per_source,
        combined: per_source * ctx.mode.source_count(),
        singles,
        bundles,
        corrections,
    }
}
