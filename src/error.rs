//! Error types shared across the crate.
//!
//! Resolution never catches or rewrites a failure: store and cursor errors
//! travel through transparently and surface to the GraphQL engine unchanged.

use thiserror::Error;

use crate::pagination::CursorError;

/// Failure surfaced by a backing store while executing a query target.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A single-record fetch matched nothing and the store treats that as an
    /// error. Stores with nullable-fetch semantics return `Ok(None)` instead.
    #[error("no row found in {table}")]
    NotFound { table: String },

    /// Any other backend failure, carried through untouched.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failure while resolving a single field.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// A registered association was resolved without a parent record. The
    /// schema wired an association resolver onto a root field.
    #[error("field '{field}' is a registered association but no parent record was supplied")]
    MissingSource { field: String },
}
