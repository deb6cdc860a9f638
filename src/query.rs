//! The query target
//!
//! A [`ModelQuery`] is the mutable, disposable object a resolver builds up
//! before handing it to a store: target table, origin, equality predicates,
//! and optional order and window. It renders nothing itself; a store decides
//! how to execute it.

use async_graphql::Value;

/// Sort direction for an ORDER BY clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Where a query came from: a root field, or an association accessor invoked
/// on a parent record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOrigin {
    Root,
    Association { field: String },
}

/// One equality predicate, column already qualified with the table name.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub value: Value,
}

/// An in-progress query against one table. Mutated in place while a resolver
/// filters it and applies the field's extra closure; discarded after fetch.
#[derive(Debug, Clone)]
pub struct ModelQuery {
    table: String,
    origin: QueryOrigin,
    predicates: Vec<Predicate>,
    order: Option<(String, Direction)>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl ModelQuery {
    /// A fresh query against a whole table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            origin: QueryOrigin::Root,
            predicates: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    /// A query produced by an association accessor for the named field.
    pub fn association(table: impl Into<String>, field: impl Into<String>) -> Self {
        let mut query = Self::new(table);
        query.origin = QueryOrigin::Association {
            field: field.into(),
        };
        query
    }

    /// Add an equality predicate, scoping the column to this query's table.
    pub fn where_eq(&mut self, column: &str, value: Value) -> &mut Self {
        self.predicates.push(Predicate {
            column: format!("{}.{}", self.table, column),
            value,
        });
        self
    }

    pub fn order_by(&mut self, column: &str, direction: Direction) -> &mut Self {
        self.order = Some((column.to_string(), direction));
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn origin(&self) -> &QueryOrigin {
        &self.origin
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn order(&self) -> Option<(&str, Direction)> {
        self.order.as_ref().map(|(c, d)| (c.as_str(), *d))
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// Canonical key a batching layer can coalesce equivalent fetches by:
    /// table, origin, and the ordered predicate list.
    pub fn fingerprint(&self) -> String {
        let origin = match &self.origin {
            QueryOrigin::Root => "root".to_string(),
            QueryOrigin::Association { field } => format!("assoc:{}", field),
        };
        let mut parts = vec![self.table.clone(), origin];
        for predicate in &self.predicates {
            parts.push(format!("{}={}", predicate.column, predicate.value));
        }
        parts.join("|")
    }
}
