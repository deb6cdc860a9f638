//! Reference SQLite store adapter
//!
//! Renders a [`ModelQuery`] to parameterized SQL and decodes rows into
//! dynamic [`Record`]s by declared column type. Feature-gated; the resolver
//! core works against any [`Store`] implementation.

use async_graphql::{Number, Value};
use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use crate::error::StoreError;
use crate::pagination::{LimitOffset, Page};
use crate::query::ModelQuery;
use crate::record::Record;
use crate::store::Store;

/// Declared SQLite type of one column, driving row decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    /// Stored as INTEGER 0/1, decoded to a boolean.
    Boolean,
}

/// One declared column.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
}

impl ColumnSpec {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Text,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Integer,
        }
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Real,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ColumnType::Boolean,
        }
    }
}

#[derive(Debug, Clone)]
struct TableSpec {
    name: String,
    columns: Vec<ColumnSpec>,
}

impl TableSpec {
    fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A [`Store`] over a SQLite pool, with per-table column declarations.
pub struct SqliteStore {
    pool: SqlitePool,
    tables: IndexMap<String, TableSpec>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tables: IndexMap::new(),
        }
    }

    /// Declare a table's columns. Queries against undeclared tables fail.
    pub fn table(mut self, name: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        let name = name.into();
        self.tables.insert(
            name.clone(),
            TableSpec {
                name,
                columns,
            },
        );
        self
    }

    fn spec(&self, table: &str) -> Result<&TableSpec, StoreError> {
        self.tables
            .get(table)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("no column spec for table {table}")))
    }

    /// Render the query to SQL. A window, when given, governs paging over any
    /// limit/offset on the query target; a window limit of 0 means no LIMIT
    /// clause (SQLite spells unbounded-with-offset as `LIMIT -1`).
    fn build_sql(&self, query: &ModelQuery, window: Option<LimitOffset>) -> Result<String, StoreError> {
        let spec = self.spec(query.table())?;
        let mut sql = format!("SELECT {} FROM {}", spec.select_list(), spec.name);

        append_where(&mut sql, query);

        if let Some((column, direction)) = query.order() {
            sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_sql()));
        }

        let (limit, offset) = match window {
            Some(w) => (
                (w.limit > 0).then_some(w.limit),
                (w.offset > 0).then_some(w.offset),
            ),
            None => (query.limit_value(), query.offset_value()),
        };
        match (limit, offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        Ok(sql)
    }

    fn build_count_sql(&self, query: &ModelQuery) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", query.table());
        append_where(&mut sql, query);
        sql
    }

    async fn count(&self, query: &ModelQuery) -> Result<i64, StoreError> {
        let sql = self.build_count_sql(query);
        tracing::debug!(sql = %sql, "executing count query");

        let mut scalar = sqlx::query_scalar::<_, i64>(&sql);
        for predicate in query.predicates() {
            scalar = match &predicate.value {
                Value::String(s) => scalar.bind(s.as_str()),
                Value::Number(n) if n.is_f64() => scalar.bind(n.as_f64().unwrap_or(0.0)),
                Value::Number(n) => scalar.bind(n.as_i64().unwrap_or(0)),
                Value::Boolean(b) => scalar.bind(if *b { 1i64 } else { 0i64 }),
                Value::Null => scalar.bind(None::<String>),
                other => scalar.bind(other.to_string()),
            };
        }

        scalar
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))
    }

    async fn fetch_rows(
        &self,
        query: &ModelQuery,
        window: Option<LimitOffset>,
    ) -> Result<Vec<Record>, StoreError> {
        let sql = self.build_sql(query, window)?;
        tracing::debug!(sql = %sql, "executing query");

        let mut prepared = sqlx::query(&sql);
        for predicate in query.predicates() {
            prepared = bind_value(prepared, &predicate.value);
        }

        let rows = prepared
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        let spec = self.spec(query.table())?;
        rows.iter().map(|row| decode_row(spec, row)).collect()
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn fetch_one(&self, query: &ModelQuery) -> Result<Option<Record>, StoreError> {
        let sql = self.build_sql(query, None)?;
        tracing::debug!(sql = %sql, "executing query (one)");

        let mut prepared = sqlx::query(&sql);
        for predicate in query.predicates() {
            prepared = bind_value(prepared, &predicate.value);
        }

        let row = prepared
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.into()))?;

        match row {
            Some(row) => Ok(Some(decode_row(self.spec(query.table())?, &row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all(&self, query: &ModelQuery) -> Result<Vec<Record>, StoreError> {
        self.fetch_rows(query, None).await
    }

    async fn fetch_page(
        &self,
        query: &ModelQuery,
        window: LimitOffset,
    ) -> Result<Page, StoreError> {
        let total = self.count(query).await?;
        let records = self.fetch_rows(query, Some(window)).await?;
        Ok(Page {
            records,
            total,
            limit: window.limit,
            offset: window.offset,
        })
    }
}

fn append_where(sql: &mut String, query: &ModelQuery) {
    if !query.predicates().is_empty() {
        sql.push_str(" WHERE ");
        let conditions: Vec<String> = query
            .predicates()
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} = ?{}", p.column, i + 1))
            .collect();
        sql.push_str(&conditions.join(" AND "));
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::String(s) => query.bind(s.as_str()),
        Value::Number(n) if n.is_f64() => query.bind(n.as_f64().unwrap_or(0.0)),
        Value::Number(n) => query.bind(n.as_i64().unwrap_or(0)),
        Value::Boolean(b) => query.bind(if *b { 1i64 } else { 0i64 }),
        Value::Null => query.bind(None::<String>),
        other => query.bind(other.to_string()),
    }
}

fn decode_row(spec: &TableSpec, row: &SqliteRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for column in &spec.columns {
        let name = column.name.as_str();
        let value = match column.ty {
            ColumnType::Text => row
                .try_get::<Option<String>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnType::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map(|v| v.map(Value::from).unwrap_or(Value::Null)),
            ColumnType::Real => row.try_get::<Option<f64>, _>(name).map(|v| {
                v.and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }),
            ColumnType::Boolean => row
                .try_get::<Option<i64>, _>(name)
                .map(|v| v.map(|n| Value::from(n != 0)).unwrap_or(Value::Null)),
        }
        .map_err(|e| StoreError::Backend(e.into()))?;
        record.set(name, value);
    }
    Ok(record)
}
