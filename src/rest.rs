//! Hosted catalog backend over Supabase's PostgREST interface.
//!
//! Requests are plain `GET /rest/v1/<table>` calls whose filters travel in
//! the query string (`group_id=eq.sv3`, `rarity=in.("Rare")`, ...). The
//! total match count is requested with `Prefer: count=exact` and read back
//! from the `Content-Range` header.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SupabaseConfig;
use crate::error::{CatalogError, Result};
use crate::models::{CatalogBundle, CatalogSingle, SourceKind};
use crate::queries::context::{SortKey, SortOrder};
use crate::queries::source::{CatalogSource, FetchRequest, SourcePage};

// ---------------------------------------------------------------------------
// PostgrestQuery
// ---------------------------------------------------------------------------

/// Query-string builder for PostgREST table reads.
///
/// Values inside `in.(...)`, `ov.{...}` and `or=(...)` groups are always
/// double-quoted so commas, dots and parentheses in card names survive.
#[derive(Debug, Clone, Default)]
pub struct PostgrestQuery {
    filters: Vec<(String, String)>,
    order: Vec<String>,
    offset: Option<usize>,
    limit: Option<usize>,
}

impl PostgrestQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{column}=eq.{value}`
    pub fn eq(&mut self, column: &str, value: &str) -> &mut Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Case-insensitive substring match: `{column}=ilike.*{text}*`, with
    /// `text` escaped by [`ilike_pattern`].
    pub fn contains(&mut self, column: &str, text: &str) -> &mut Self {
        self.filters
            .push((column.to_string(), format!("ilike.*{}*", ilike_pattern(text))));
        self
    }

    /// `{column}=in.("a","b")`
    pub fn any_of<I, S>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = quote_all(values);
        self.filters
            .push((column.to_string(), format!("in.({})", list)));
        self
    }

    /// Array overlap: `{column}=ov.{"a","b"}`
    pub fn overlaps<I, S>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = quote_all(values);
        self.filters
            .push((column.to_string(), format!("ov.{{{}}}", list)));
        self
    }

    /// `or=(cond,cond)` where each condition is `column.op.value`.
    pub fn or(&mut self, conditions: &[(&str, &str, &str)]) -> &mut Self {
        if conditions.is_empty() {
            return self;
        }
        let parts: Vec<String> = conditions
            .iter()
            .map(|(column, op, value)| format!("{}.{}.{}", column, op, quote(value)))
            .collect();
        self.filters
            .push(("or".to_string(), format!("({})", parts.join(","))));
        self
    }

    pub fn order(&mut self, column: &str, order: SortOrder, nulls_last: bool) -> &mut Self {
        let mut clause = format!("{}.{}", column, order);
        if nulls_last {
            clause.push_str(".nullslast");
        }
        self.order.push(clause);
        self
    }

    pub fn offset(&mut self, n: usize) -> &mut Self {
        self.offset = Some(n);
        self
    }

    pub fn limit(&mut self, n: usize) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Render the query-string pairs, `select=*` first.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(n) = self.offset {
            pairs.push(("offset".to_string(), n.to_string()));
        }
        if let Some(n) = self.limit {
            pairs.push(("limit".to_string(), n.to_string()));
        }
        pairs
    }
}

/// Escape `text` for use between the `*` wildcards of an `ilike` filter.
///
/// `%`, `_` and `\` are backslash-escaped. PostgREST turns every `*` into
/// `%` and offers no escape for it, so a literal `*` is sent as the
/// single-character wildcard `_`.
pub fn ilike_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '%' | '_' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '*' => escaped.push('_'),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quote_all<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| quote(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Total match count from a `Content-Range` header such as `0-29/42` or
/// `*/0`. Returns `None` when the server did not count (`0-29/*`).
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// The exact match count a response reported.
///
/// A missing or uncounted `Content-Range` is a protocol error: the page
/// length is not a usable total.
pub fn reported_total(content_range: Option<&str>) -> Result<u64> {
    let header = content_range
        .ok_or_else(|| CatalogError::Protocol("missing Content-Range header".to_string()))?;
    parse_content_range(header).ok_or_else(|| {
        CatalogError::Protocol(format!("Content-Range without an exact count: {}", header))
    })
}

/// PostgREST query for a singles fetch.
pub fn singles_query(request: &FetchRequest) -> PostgrestQuery {
    let mut q = PostgrestQuery::new();

    if let Some(group) = request.scope.group_id() {
        q.eq("group_id", group);
    }
    if let Some(text) = request.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("*{}*", ilike_pattern(text));
        q.or(&[("name", "ilike", pattern.as_str()), ("number", "eq", text)]);
    }
    for (dimension, values) in request.filters.active() {
        if dimension.is_multi_valued() {
            q.overlaps(dimension.column(), values);
        } else {
            q.any_of(dimension.column(), values);
        }
    }

    match request.sort_key {
        SortKey::Name => {
            q.order("name", request.sort_order, false);
        }
        SortKey::RawMarket => {
            q.order("raw_market", request.sort_order, true);
        }
        SortKey::GradedMarket => {
            q.order("graded_market", request.sort_order, true);
        }
        SortKey::Number | SortKey::PricingMarket => {
            q.order("number", request.sort_order, true);
        }
    }
    q.order("id", SortOrder::Asc, false);

    q.offset(request.offset()).limit(request.page_size);
    q
}

/// PostgREST query for a bundles fetch. Filters are not applied.
pub fn bundles_query(request: &FetchRequest) -> PostgrestQuery {
    let mut q = PostgrestQuery::new();

    if let Some(group) = request.scope.group_id() {
        q.eq("group_id", group);
    }
    if let Some(text) = request.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        q.contains("name", text);
    }

    match request.sort_key {
        SortKey::PricingMarket => q.order("market_price", request.sort_order, true),
        _ => q.order("name", request.sort_order, false),
    };
    q.order("id", SortOrder::Asc, false);

    q.offset(request.offset()).limit(request.page_size);
    q
}

// ---------------------------------------------------------------------------
// SupabaseStore
// ---------------------------------------------------------------------------

/// Blocking PostgREST client for the hosted singles and bundles tables.
pub struct SupabaseStore {
    client: Client,
    rest_url: String,
    singles_table: String,
    bundles_table: String,
}

impl SupabaseStore {
    /// Build a client from connection settings.
    ///
    /// `timeout` bounds every request; an expired request fails that source.
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| CatalogError::InvalidArgument(format!("Invalid API key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| CatalogError::InvalidArgument(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("prefer", HeaderValue::from_static("count=exact"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            singles_table: config.singles_table.clone(),
            bundles_table: config.bundles_table.clone(),
        })
    }

    /// Read one page of rows and the exact match count.
    pub fn select(&self, table: &str, query: &PostgrestQuery) -> Result<(Vec<Value>, u64)> {
        let url = format!("{}/{}", self.rest_url, table);
        let pairs = query.pairs();
        debug!(%url, ?pairs, "postgrest select");

        let resp = self.client.get(&url).query(&pairs).send()?.error_for_status()?;
        let header = resp.headers().get(CONTENT_RANGE).and_then(|v| v.to_str().ok());
        let total = reported_total(header)
            .inspect_err(|e| warn!(%url, error = %e, "response carried no match count"))?;
        let rows: Vec<Value> = resp.json()?;
        Ok((rows, total))
    }

    /// The singles table as a [`CatalogSource`].
    pub fn singles(self: &Arc<Self>) -> RestSingles {
        RestSingles(Arc::clone(self))
    }

    /// The bundles table as a [`CatalogSource`].
    pub fn bundles(self: &Arc<Self>) -> RestBundles {
        RestBundles(Arc::clone(self))
    }
}

pub struct RestSingles(Arc<SupabaseStore>);

impl CatalogSource for RestSingles {
    type Record = CatalogSingle;

    fn kind(&self) -> SourceKind {
        SourceKind::Singles
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<CatalogSingle>> {
        let (rows, total) = self.0.select(&self.0.singles_table, &singles_query(request))?;
        let records = rows
            .into_iter()
            .map(CatalogSingle::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(SourcePage::new(records, total))
    }
}

pub struct RestBundles(Arc<SupabaseStore>);

impl CatalogSource for RestBundles {
    type Record = CatalogBundle;

    fn kind(&self) -> SourceKind {
        SourceKind::Bundles
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<CatalogBundle>> {
        let (rows, total) = self.0.select(&self.0.bundles_table, &bundles_query(request))?;
        let records = rows
            .into_iter()
            .map(CatalogBundle::from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(SourcePage::new(records, total))
    }
}
