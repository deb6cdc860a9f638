//! Store abstraction
//!
//! The resolver core executes queries only through this trait; any ORM or
//! database layer implementing it can sit behind the factory. A reference
//! SQLite adapter ships behind the `sqlite` feature.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::pagination::{LimitOffset, Page};
use crate::query::ModelQuery;
use crate::record::Record;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Executes query targets against a backing database.
#[async_trait]
pub trait Store: Send + Sync {
    /// Fetch a single record. `Ok(None)` for stores with nullable-fetch
    /// semantics; a store wanting require-semantics returns
    /// [`StoreError::NotFound`] instead.
    async fn fetch_one(&self, query: &ModelQuery) -> Result<Option<Record>, StoreError>;

    /// Fetch every matching record.
    async fn fetch_all(&self, query: &ModelQuery) -> Result<Vec<Record>, StoreError>;

    /// Fetch one page of records plus the total row count matching the query.
    ///
    /// The window governs paging even when the query target carries its own
    /// limit/offset. A window limit of `0` means no limit.
    async fn fetch_page(&self, query: &ModelQuery, window: LimitOffset)
    -> Result<Page, StoreError>;
}
