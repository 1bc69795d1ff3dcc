//! DuckDB connection wrapper with snapshot table registration and query execution.
//!
//! Snapshot tables are created lazily from the NDJSON files managed by
//! [`SnapshotCache`]. List-typed JSON columns are flattened to `", "`-joined
//! strings on load, so every filter and every row decoder sees one encoding.

use crate::cache::SnapshotCache;
use crate::error::{CatalogError, Result};
use duckdb::{types::ValueRef, Connection as DuckDbConnection};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Wraps a DuckDB connection and registers snapshot files as tables.
///
/// All state sits behind mutexes so a `Connection` can be shared (via `Arc`)
/// by the singles and bundles sources while they fetch concurrently. DuckDB
/// statements themselves are serialized on the single connection.
pub struct Connection {
    conn: Mutex<DuckDbConnection>,
    /// The cache used to download/locate snapshot files.
    pub cache: Mutex<SnapshotCache>,
    registered_tables: Mutex<HashSet<String>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| CatalogError::Internal("connection lock poisoned".into()))
}

impl Connection {
    /// Create a connection backed by the given cache.
    ///
    /// Opens an in-memory DuckDB database.
    pub fn new(cache: SnapshotCache) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
            cache: Mutex::new(cache),
            registered_tables: Mutex::new(HashSet::new()),
        })
    }

    /// Ensure one or more snapshot tables are loaded, downloading if needed.
    pub fn ensure_tables(&self, tables: &[&str]) -> Result<()> {
        for name in tables {
            if !self.has_table(name) {
                let path = lock(&self.cache)?.ensure_snapshot(name)?;
                self.register_table_from_ndjson(name, &path.to_string_lossy())?;
            }
        }
        Ok(())
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    pub fn execute(&self, sql: &str, params: &[String]) -> Result<Vec<HashMap<String, Value>>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(sql)?;

        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;

        // Column metadata is only available once the statement has executed.
        let stmt_ref = rows
            .as_ref()
            .ok_or_else(|| CatalogError::Internal("statement missing after query".into()))?;
        let column_names: Vec<String> = stmt_ref
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = HashMap::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                map.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(map);
        }

        Ok(out)
    }

    /// Execute SQL and return each row as a JSON object.
    pub fn execute_values(&self, sql: &str, params: &[String]) -> Result<Vec<Value>> {
        Ok(self
            .execute(sql, params)?
            .into_iter()
            .map(|row| Value::Object(row.into_iter().collect()))
            .collect())
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(&self, sql: &str, params: &[String]) -> Result<Option<Value>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(sql)?;
        let param_values: Vec<&dyn duckdb::ToSql> =
            params.iter().map(|p| p as &dyn duckdb::ToSql).collect();

        let mut rows = stmt.query(param_values.as_slice())?;
        match rows.next()? {
            Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
            None => Ok(None),
        }
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    ///
    /// The file is streamed by DuckDB. List columns are rewritten to
    /// `", "`-joined VARCHARs.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path_fwd = ndjson_path.replace('\\', "/").replace('\'', "''");
        let source = format!(
            "read_json_auto('{}', format='newline_delimited')",
            path_fwd
        );

        let conn = lock(&self.conn)?;
        let replace_clause = list_flatten_clause(&conn, &source)?;
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; \
             CREATE TABLE {table} AS SELECT *{replace} FROM {source}",
            table = table_name,
            replace = replace_clause,
            source = source
        ))?;
        drop(conn);

        lock(&self.registered_tables)?.insert(table_name.to_string());
        debug!(table = table_name, path = ndjson_path, "registered snapshot table");
        Ok(())
    }

    /// Check whether a table has been registered.
    pub fn has_table(&self, name: &str) -> bool {
        self.registered_tables
            .lock()
            .map(|tables| tables.contains(name))
            .unwrap_or(false)
    }

    /// Return a list of all registered table names.
    pub fn tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registered_tables
            .lock()
            .map(|tables| tables.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Forget registered tables so they are reloaded on next access.
    pub fn reset_tables(&self) -> Result<()> {
        lock(&self.registered_tables)?.clear();
        Ok(())
    }
}

/// Build a `REPLACE (...)` clause turning every list column of `source`
/// into a `", "`-joined string.
///
/// Only reads the schema (DESCRIBE), no data scan.
fn list_flatten_clause(conn: &DuckDbConnection, source: &str) -> Result<String> {
    let mut stmt = conn.prepare(&format!(
        "SELECT column_name, column_type FROM (DESCRIBE SELECT * FROM {})",
        source
    ))?;
    let mut rows = stmt.query([])?;

    let mut exprs = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let dtype: String = row.get(1)?;
        if dtype.ends_with("[]") {
            exprs.push(format!(
                "array_to_string(\"{}\", ', ') AS \"{}\"",
                name, name
            ));
        }
    }

    if exprs.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" REPLACE ({})", exprs.join(", ")))
    }
}

/// Convert a DuckDB `ValueRef` to a `serde_json::Value`.
fn convert_value_ref(val: ValueRef<'_>) -> Value {
    match val {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => Value::Number(n.into()),
        ValueRef::SmallInt(n) => Value::Number(n.into()),
        ValueRef::Int(n) => Value::Number(n.into()),
        ValueRef::BigInt(n) => Value::Number(n.into()),
        ValueRef::UTinyInt(n) => Value::Number(n.into()),
        ValueRef::USmallInt(n) => Value::Number(n.into()),
        ValueRef::UInt(n) => Value::Number(n.into()),
        ValueRef::UBigInt(n) => Value::Number(n.into()),
        ValueRef::HugeInt(n) => match i64::try_from(n) {
            Ok(i) => Value::Number(i.into()),
            Err(_) => Value::String(n.to_string()),
        },
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        // Dates, timestamps, nested types: not part of the catalog snapshots.
        _ => Value::Null,
    }
}
