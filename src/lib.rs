//! graphql-shelf
//!
//! Resolver generation bridging GraphQL fields to an active-record style
//! store. Given a model descriptor, [`resolver`] builds a field resolver
//! that translates field arguments into equality predicates, dispatches
//! between association and root fetches, applies Relay-style forward
//! pagination, and exposes fetched attributes as plain data.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use graphql_shelf::{FieldShape, ModelDescriptor, resolver};
//!
//! let author = Arc::new(
//!     ModelDescriptor::builder("authors")
//!         .has_many("posts", "posts", "author_id")
//!         .build(),
//! );
//!
//! let posts_connection = resolver(Arc::clone(&author))
//!     .shape(FieldShape::Connection)
//!     .build();
//! ```
//!
//! The store behind a resolution is anything implementing [`Store`]; a
//! reference SQLite adapter ships behind the `sqlite` feature.

mod error;
mod expose;
mod loaders;
mod model;
mod pagination;
mod query;
mod record;
mod resolver;
pub mod store;

pub use error::*;
pub use expose::*;
pub use loaders::*;
pub use model::*;
pub use pagination::*;
pub use query::*;
pub use record::*;
pub use resolver::*;
pub use store::Store;

#[cfg(feature = "sqlite")]
pub use store::sqlite::{ColumnSpec, ColumnType, SqliteStore};
