//! Sealed product queries against the DuckDB `bundles` snapshot table.
//!
//! Bundles only honor scope and free text; filter dimensions are for singles.

use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Result;
use crate::models::{CatalogBundle, SourceKind};
use crate::sql_builder::SqlBuilder;

use super::context::SortKey;
use super::source::{CatalogSource, FetchRequest, SourcePage};

// ---------------------------------------------------------------------------
// BundlesQuery
// ---------------------------------------------------------------------------

/// Query interface for sealed products backed by the `bundles` table.
#[derive(Clone)]
pub struct BundlesQuery {
    conn: Arc<Connection>,
}

impl BundlesQuery {
    /// Create a new `BundlesQuery` sharing the given connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Retrieve one sealed product by identifier.
    pub fn get(&self, id: &str) -> Result<Option<CatalogBundle>> {
        self.conn.ensure_tables(&["bundles"])?;

        let mut qb = SqlBuilder::new("bundles");
        qb.where_eq("CAST(id AS VARCHAR)", id).limit(1);

        let (sql, params) = qb.build();
        self.conn
            .execute_values(&sql, &params)?
            .into_iter()
            .next()
            .map(CatalogBundle::from_row)
            .transpose()
    }

    /// Translate a fetch request into the page query (with LIMIT/OFFSET).
    ///
    /// Sort keys other than `name` and `pricing_market` sort by name.
    pub fn build_query(request: &FetchRequest) -> SqlBuilder {
        let mut qb = SqlBuilder::new("bundles");

        if let Some(group) = request.scope.group_id() {
            qb.where_eq("CAST(group_id AS VARCHAR)", group);
        }

        if let Some(text) = request.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            qb.where_contains("name", text);
        }

        let order = request.sort_order.sql();
        let primary = match request.sort_key {
            SortKey::PricingMarket => format!("market_price {} NULLS LAST", order),
            _ => format!("name {}", order),
        };
        qb.order_by(&[primary.as_str(), "CAST(id AS VARCHAR) ASC"]);

        qb.limit(request.page_size).offset(request.offset());
        qb
    }
}

impl CatalogSource for BundlesQuery {
    type Record = CatalogBundle;

    fn kind(&self) -> SourceKind {
        SourceKind::Bundles
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<CatalogBundle>> {
        self.conn.ensure_tables(&["bundles"])?;

        let qb = Self::build_query(request);
        let (count_sql, count_params) = qb.build_count();
        let total = self
            .conn
            .execute_scalar(&count_sql, &count_params)?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        let (sql, params) = qb.build();
        let records = self
            .conn
            .execute_values(&sql, &params)?
            .into_iter()
            .map(CatalogBundle::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(SourcePage::new(records, total))
    }
}
