//! Single-card queries against the DuckDB `singles` snapshot table.

use std::sync::Arc;

use serde_json::Value;

use crate::connection::Connection;
use crate::error::Result;
use crate::models::{CatalogGroup, CatalogSingle, SourceKind};
use crate::sql_builder::{escape_like, SqlBuilder};

use super::context::{FilterDimension, Scope, SortKey};
use super::source::{CatalogSource, FetchRequest, SourcePage};

/// Natural ordering on the leading digit run of the card number.
const NUMBER_SORT: &str =
    r"TRY_CAST(regexp_extract(CAST(number AS VARCHAR), '(\d+)', 1) AS BIGINT)";

// ---------------------------------------------------------------------------
// SinglesQuery
// ---------------------------------------------------------------------------

/// Query interface for single cards backed by the `singles` table.
#[derive(Clone)]
pub struct SinglesQuery {
    conn: Arc<Connection>,
}

impl SinglesQuery {
    /// Create a new `SinglesQuery` sharing the given connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Retrieve one single by identifier.
    pub fn get(&self, id: &str) -> Result<Option<CatalogSingle>> {
        self.conn.ensure_tables(&["singles"])?;

        let mut qb = SqlBuilder::new("singles");
        qb.where_eq("CAST(id AS VARCHAR)", id).limit(1);

        let (sql, params) = qb.build();
        self.conn
            .execute_values(&sql, &params)?
            .into_iter()
            .next()
            .map(CatalogSingle::from_row)
            .transpose()
    }

    /// Sorted distinct values present for a filter dimension, optionally
    /// restricted to one group. Multi-valued columns are unnested.
    pub fn filter_values(&self, dimension: FilterDimension, scope: &Scope) -> Result<Vec<String>> {
        self.conn.ensure_tables(&["singles"])?;

        let column = dimension.column();
        let mut qb = SqlBuilder::new("singles");
        if let Some(group) = scope.group_id() {
            qb.where_eq("CAST(group_id AS VARCHAR)", group);
        }

        let (sql, params) = if dimension.is_multi_valued() {
            let unnested = format!(
                "unnest(string_split(COALESCE({}, ''), ', ')) AS value",
                column
            );
            qb.select(&[unnested.as_str()]);
            let (inner, params) = qb.build();
            (
                format!(
                    "SELECT DISTINCT value FROM ({}) WHERE value <> '' ORDER BY value",
                    inner
                ),
                params,
            )
        } else {
            let cast = format!("CAST({} AS VARCHAR) AS value", column);
            let not_null = format!("{} IS NOT NULL", column);
            qb.select(&[cast.as_str()])
                .distinct()
                .where_clause(&not_null, &[])
                .order_by(&["value"]);
            qb.build()
        };

        let rows = self.conn.execute(&sql, &params)?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| match row.remove("value") {
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect())
    }

    /// Groups (expansions) with the number of singles in each, by name.
    pub fn groups(&self) -> Result<Vec<CatalogGroup>> {
        self.conn.ensure_tables(&["singles"])?;

        let (sql, params) = SqlBuilder::new("singles")
            .select(&[
                "CAST(group_id AS VARCHAR) AS group_id",
                "COALESCE(group_name, '') AS group_name",
                "COUNT(*) AS single_count",
            ])
            .group_by(&["group_id", "group_name"])
            .order_by(&["group_name ASC", "group_id ASC"])
            .build();

        let rows = self.conn.execute_values(&sql, &params)?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Into::into))
            .collect()
    }

    /// Translate a fetch request into the page query (with LIMIT/OFFSET).
    pub fn build_query(request: &FetchRequest) -> SqlBuilder {
        let mut qb = SqlBuilder::new("singles");

        if let Some(group) = request.scope.group_id() {
            qb.where_eq("CAST(group_id AS VARCHAR)", group);
        }

        if let Some(text) = request.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(text));
            qb.where_or(&[
                ("LOWER(name) LIKE LOWER(?) ESCAPE '\\'", pattern.as_str()),
                ("CAST(number AS VARCHAR) = ?", text),
            ]);
        }

        for (dimension, values) in request.filters.active() {
            if dimension.is_multi_valued() {
                qb.where_any_in(dimension.column(), values);
            } else {
                qb.where_in(&format!("CAST({} AS VARCHAR)", dimension.column()), values);
            }
        }

        let order = request.sort_order.sql();
        let clauses: Vec<String> = match request.sort_key {
            SortKey::Name => vec![
                format!("name {}", order),
                format!("{} ASC NULLS LAST", NUMBER_SORT),
            ],
            SortKey::RawMarket => vec![format!("raw_market {} NULLS LAST", order)],
            SortKey::GradedMarket => vec![format!("graded_market {} NULLS LAST", order)],
            SortKey::Number | SortKey::PricingMarket => vec![
                format!("{} {} NULLS LAST", NUMBER_SORT, order),
                format!("CAST(number AS VARCHAR) {}", order),
            ],
        };
        let mut clauses: Vec<&str> = clauses.iter().map(String::as_str).collect();
        clauses.push("CAST(id AS VARCHAR) ASC");
        qb.order_by(&clauses);

        qb.limit(request.page_size).offset(request.offset());
        qb
    }
}

impl CatalogSource for SinglesQuery {
    type Record = CatalogSingle;

    fn kind(&self) -> SourceKind {
        SourceKind::Singles
    }

    fn fetch(&self, request: &FetchRequest) -> Result<SourcePage<CatalogSingle>> {
        self.conn.ensure_tables(&["singles"])?;

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
            .map(CatalogSingle::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(SourcePage::new(records, total))
    }
}
