//! Search request vocabulary: scope, source mode, filters and sort order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{CatalogError, Result};

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Either the whole catalog or one group (expansion / set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    Global,
    Group(String),
}

impl Scope {
    pub fn group(id: impl Into<String>) -> Self {
        Scope::Group(id.into())
    }

    pub fn group_id(&self) -> Option<&str> {
        match self {
            Scope::Global => None,
            Scope::Group(id) => Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Group(id) => write!(f, "group:{}", id),
        }
    }
}

impl FromStr for Scope {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("global") {
            return Ok(Scope::Global);
        }
        match s.strip_prefix("group:") {
            Some(id) if !id.trim().is_empty() => Ok(Scope::Group(id.trim().to_string())),
            _ => Err(CatalogError::InvalidArgument(format!(
                "Unknown scope '{}' (expected 'global' or 'group:<id>')",
                s
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceMode
// ---------------------------------------------------------------------------

/// Which record sets a search reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Singles,
    Sealed,
    Both,
}

impl SourceMode {
    pub fn wants_singles(self) -> bool {
        matches!(self, SourceMode::Singles | SourceMode::Both)
    }

    pub fn wants_bundles(self) -> bool {
        matches!(self, SourceMode::Sealed | SourceMode::Both)
    }

    pub fn source_count(self) -> usize {
        match self {
            SourceMode::Both => 2,
            SourceMode::Singles | SourceMode::Sealed => 1,
        }
    }
}

impl FromStr for SourceMode {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singles" => Ok(SourceMode::Singles),
            "sealed" => Ok(SourceMode::Sealed),
            "both" => Ok(SourceMode::Both),
            other => Err(CatalogError::InvalidArgument(format!(
                "Unknown source mode '{}'",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterDimension / Filters
// ---------------------------------------------------------------------------

/// Attributes singles can be filtered on. Bundles ignore every dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Category,
    Type,
    SubKind,
    Rarity,
    Artist,
    Weakness,
    Resistance,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 7] = [
        FilterDimension::Category,
        FilterDimension::Type,
        FilterDimension::SubKind,
        FilterDimension::Rarity,
        FilterDimension::Artist,
        FilterDimension::Weakness,
        FilterDimension::Resistance,
    ];

    /// Store column backing this dimension.
    pub fn column(self) -> &'static str {
        match self {
            FilterDimension::Category => "supertype",
            FilterDimension::Type => "types",
            FilterDimension::SubKind => "subtypes",
            FilterDimension::Rarity => "rarity",
            FilterDimension::Artist => "artist",
            FilterDimension::Weakness => "weaknesses",
            FilterDimension::Resistance => "resistances",
        }
    }

    /// Whether the column holds several values per card.
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            FilterDimension::Type
                | FilterDimension::SubKind
                | FilterDimension::Weakness
                | FilterDimension::Resistance
        )
    }
}

impl fmt::Display for FilterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterDimension::Category => "category",
            FilterDimension::Type => "type",
            FilterDimension::SubKind => "sub_kind",
            FilterDimension::Rarity => "rarity",
            FilterDimension::Artist => "artist",
            FilterDimension::Weakness => "weakness",
            FilterDimension::Resistance => "resistance",
        };
        f.write_str(name)
    }
}

impl FromStr for FilterDimension {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "category" | "supertype" => Ok(FilterDimension::Category),
            "type" | "types" => Ok(FilterDimension::Type),
            "sub_kind" | "subkind" | "subtype" | "subtypes" => Ok(FilterDimension::SubKind),
            "rarity" => Ok(FilterDimension::Rarity),
            "artist" => Ok(FilterDimension::Artist),
            "weakness" | "weaknesses" => Ok(FilterDimension::Weakness),
            "resistance" | "resistances" => Ok(FilterDimension::Resistance),
            other => Err(CatalogError::InvalidArgument(format!(
                "Unknown filter dimension '{}'",
                other
            ))),
        }
    }
}

/// Accepted values per dimension. A dimension with no values is unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<FilterDimension, BTreeSet<String>>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `value` for `dimension` (builder style).
    pub fn with(mut self, dimension: FilterDimension, value: impl Into<String>) -> Self {
        self.insert(dimension, value);
        self
    }

    pub fn insert(&mut self, dimension: FilterDimension, value: impl Into<String>) {
        self.0.entry(dimension).or_default().insert(value.into());
    }

    pub fn clear(&mut self, dimension: FilterDimension) {
        self.0.remove(&dimension);
    }

    pub fn values(&self, dimension: FilterDimension) -> Option<&BTreeSet<String>> {
        self.0.get(&dimension).filter(|set| !set.is_empty())
    }

    /// Dimensions that actually restrict results, in a stable order.
    pub fn active(&self) -> impl Iterator<Item = (FilterDimension, &BTreeSet<String>)> {
        self.0
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(dim, set)| (*dim, set))
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }
}

// ---------------------------------------------------------------------------
// SortKey / SortOrder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Number,
    Name,
    RawMarket,
    GradedMarket,
    PricingMarket,
}

impl SortKey {
    pub fn applies_to_singles(self) -> bool {
        !matches!(self, SortKey::PricingMarket)
    }

    pub fn applies_to_bundles(self) -> bool {
        matches!(self, SortKey::Name | SortKey::PricingMarket)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Number => "number",
            SortKey::Name => "name",
            SortKey::RawMarket => "raw_market",
            SortKey::GradedMarket => "graded_market",
            SortKey::PricingMarket => "pricing_market",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(SortKey::Number),
            "name" => Ok(SortKey::Name),
            "raw_market" => Ok(SortKey::RawMarket),
            "graded_market" => Ok(SortKey::GradedMarket),
            "pricing_market" => Ok(SortKey::PricingMarket),
            other => Err(CatalogError::InvalidArgument(format!(
                "Unknown sort key '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(CatalogError::InvalidArgument(format!(
                "Unknown sort order '{}'",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// QueryContext
// ---------------------------------------------------------------------------

/// Everything one catalog search depends on.
///
/// Built with struct-update syntax or the chaining helpers:
///
/// ```rust
/// use cardvault_sdk::queries::{FilterDimension, QueryContext, SourceMode};
///
/// let ctx = QueryContext::text("Charizard")
///     .mode(SourceMode::Both)
///     .filter(FilterDimension::Rarity, "Rare");
/// assert_eq!(ctx.page, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub text: Option<String>,
    pub scope: Scope,
    pub mode: SourceMode,
    pub filters: Filters,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: usize,
    /// Requested records per source; halved per source in `Both` mode.
    pub page_size: usize,
    /// Return an empty page without querying when `text` is blank.
    pub require_text: bool,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            text: None,
            scope: Scope::Global,
            mode: SourceMode::Singles,
            filters: Filters::new(),
            sort_key: SortKey::Number,
            sort_order: SortOrder::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            require_text: false,
        }
    }
}

impl QueryContext {
    /// A global free-text search across singles and sealed products.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            mode: SourceMode::Both,
            require_text: true,
            ..Self::default()
        }
    }

    /// Browse one group in the given mode.
    pub fn browse(group_id: impl Into<String>, mode: SourceMode) -> Self {
        Self {
            scope: Scope::group(group_id),
            mode,
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: SourceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn filter(mut self, dimension: FilterDimension, value: impl Into<String>) -> Self {
        self.filters.insert(dimension, value);
        self
    }

    pub fn sort(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_key = key;
        self.sort_order = order;
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The trimmed search text, or `None` when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
